//! Function sub-builder.
//!
//! Scoped to the transaction's call-data node. The arguments following the
//! 4-byte selector form an independent head/tail record; its offsets are
//! resolved once per selector and lifted into the enclosing buffer.

use std::collections::HashMap;

use alloy_dyn_abi::{DynSolType, Specifier};
use alloy_json_abi::Function;
use tracing::{debug, trace};

use chainquery_abi::compute_offsets_with;
use chainquery_core::{FieldLocation, QueryError, ResolverConfig, Selection, SELECTOR_SIZE};

/// Resolved argument offsets, keyed by function selector.
pub(crate) type CallDataOffsets = HashMap<[u8; SELECTOR_SIZE], Vec<FieldLocation>>;

/// Selects byte ranges of the transaction's call data.
pub struct FunctionQueryBuilder<'a> {
    data_node: &'a FieldLocation,
    encoded: &'a [u8],
    function: &'a Function,
    resolver: ResolverConfig,
    offsets: &'a mut CallDataOffsets,
    selections: Vec<Selection>,
}

impl<'a> FunctionQueryBuilder<'a> {
    pub(crate) fn new(
        data_node: &'a FieldLocation,
        encoded: &'a [u8],
        function: &'a Function,
        resolver: ResolverConfig,
        offsets: &'a mut CallDataOffsets,
    ) -> Self {
        Self {
            data_node,
            encoded,
            function,
            resolver,
            offsets,
            selections: Vec::new(),
        }
    }

    /// ABI description of the matched function.
    pub fn function(&self) -> &Function {
        self.function
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Select the 4-byte function selector.
    pub fn add_signature(&mut self) -> Result<&mut Self, QueryError> {
        let len = self.data_node.size.unwrap_or(0);
        if len < SELECTOR_SIZE {
            return Err(QueryError::CallDataTooShort { len });
        }
        self.selections
            .push(Selection::new(self.data_node.offset, SELECTOR_SIZE));
        Ok(self)
    }

    /// Select the range of the input parameter called `name`.
    pub fn add_argument(&mut self, name: &str) -> Result<&mut Self, QueryError> {
        let function = self.function;
        let position = function
            .inputs
            .iter()
            .position(|input| input.name == name)
            .ok_or_else(|| QueryError::UnknownArgument {
                argument: name.to_string(),
                context: format!("function {}", function.signature()),
            })?;

        let selection = {
            let offsets = self.argument_offsets()?;
            let node = offsets.get(position).ok_or(QueryError::FieldCountMismatch {
                expected: function.inputs.len(),
                got: offsets.len(),
            })?;
            node.selection()?
        };
        let selection = selection.shifted(self.data_node.offset + SELECTOR_SIZE);

        trace!(argument = name, %selection, "selected function argument");
        self.selections.push(selection);
        Ok(self)
    }

    pub(crate) fn into_selections(self) -> Vec<Selection> {
        self.selections
    }

    fn argument_offsets(&mut self) -> Result<&[FieldLocation], QueryError> {
        let selector = self.function.selector().0;

        if !self.offsets.contains_key(&selector) {
            let calldata = self
                .data_node
                .slice(self.encoded)
                .ok_or(QueryError::MissingNode { part: "call data" })?;
            let arguments = calldata
                .get(SELECTOR_SIZE..)
                .ok_or(QueryError::CallDataTooShort { len: calldata.len() })?;

            let types = self.input_types()?;
            let resolved = compute_offsets_with(&types, arguments, &self.resolver)?;
            debug!(
                function = %self.function.signature(),
                arguments = resolved.len(),
                "resolved call data offsets"
            );
            self.offsets.insert(selector, resolved);
        }

        self.offsets
            .get(&selector)
            .map(Vec::as_slice)
            .ok_or(QueryError::MissingNode { part: "call data offsets" })
    }

    fn input_types(&self) -> Result<Vec<DynSolType>, QueryError> {
        self.function
            .inputs
            .iter()
            .map(|input| {
                input.resolve().map_err(|e| QueryError::InvalidDescriptor {
                    descriptor: input.ty.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

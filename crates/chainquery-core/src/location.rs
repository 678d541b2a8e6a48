//! Field-location tree and selection entries.
//!
//! A `FieldLocation` tree mirrors a type schema laid over one encoded buffer.
//! Every offset in the tree is absolute within the root buffer, so any node
//! with a size can be sliced without walking its parents.

use alloy_dyn_abi::DynSolType;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Where one schema field lives inside an encoded buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLocation {
    /// Type descriptor of this field
    pub sol_type: DynSolType,
    /// Absolute offset of the value (static) or tail payload (dynamic)
    pub offset: usize,
    /// Byte length of the value, absent for composites
    pub size: Option<usize>,
    /// Whether the field is reached through a head/tail pointer
    pub is_dynamic: bool,
    /// Raw bytes captured during resolution. Informational only.
    pub value: Option<Vec<u8>>,
    /// Children in schema declaration order
    pub children: Vec<FieldLocation>,
}

impl FieldLocation {
    /// Canonical textual descriptor, e.g. `(address,bytes32[])[]`.
    pub fn type_name(&self) -> String {
        self.sol_type.sol_type_name().into_owned()
    }

    pub fn child(&self, index: usize) -> Option<&FieldLocation> {
        self.children.get(index)
    }

    /// The `{offset, size}` pair for this node.
    ///
    /// # Errors
    /// Returns `QueryError::MissingSize` for composites, whose span is only
    /// the union of their children.
    pub fn selection(&self) -> Result<Selection, QueryError> {
        match self.size {
            Some(size) => Ok(Selection::new(self.offset, size)),
            None => Err(QueryError::MissingSize {
                ty: self.type_name(),
                offset: self.offset,
            }),
        }
    }

    /// Slice this node's bytes out of the buffer it was resolved against.
    pub fn slice<'a>(&self, buffer: &'a [u8]) -> Option<&'a [u8]> {
        self.size
            .and_then(|size| Selection::new(self.offset, size).slice(buffer))
    }

    /// All sized leaves below (and including) this node, depth first.
    pub fn leaves(&self) -> Vec<&FieldLocation> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldLocation>) {
        if self.children.is_empty() {
            if self.size.is_some() {
                out.push(self);
            }
            return;
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
    }
}

/// A self-contained byte range inside the original encoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub offset: usize,
    pub size: usize,
}

impl Selection {
    pub fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// Exclusive end of the range, saturating at `usize::MAX`.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.size)
    }

    /// Move the range by `base` bytes. Used to lift offsets resolved against
    /// an embedded payload into the enclosing buffer.
    pub fn shifted(self, base: usize) -> Self {
        Self {
            offset: base + self.offset,
            size: self.size,
        }
    }

    /// `None` when the range overflows or runs past the buffer.
    pub fn slice<'a>(&self, buffer: &'a [u8]) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(self.size)?;
        buffer.get(self.offset..end)
    }
}

impl From<Selection> for (usize, usize) {
    fn from(s: Selection) -> Self {
        (s.offset, s.size)
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..{}]", self.offset, self.end())
    }
}

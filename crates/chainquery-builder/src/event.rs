//! Event sub-builder.
//!
//! Scoped to one log node of the resolved record. A log node is the
//! composite `(address, bytes32[] topics, bytes data)`; indexed arguments
//! live in the topics, the others in the data payload, which is itself a
//! head/tail encoded record addressed relative to its own start.

use alloy_dyn_abi::{DecodedEvent, DynSolType, Specifier};
use alloy_json_abi::Event;
use tracing::trace;

use chainquery_abi::compute_offsets_with;
use chainquery_core::{FieldLocation, QueryError, ResolverConfig, Selection};

const ADDRESS: usize = 0;
const TOPICS: usize = 1;
const DATA: usize = 2;

/// Selects byte ranges of one matched log.
pub struct EventQueryBuilder<'a> {
    log_node: &'a FieldLocation,
    encoded: &'a [u8],
    event: &'a Event,
    decoded: &'a DecodedEvent,
    log_index: usize,
    data_resolver: ResolverConfig,
    data_offsets: Option<Vec<FieldLocation>>,
    selections: Vec<Selection>,
}

impl<'a> EventQueryBuilder<'a> {
    pub(crate) fn new(
        log_node: &'a FieldLocation,
        encoded: &'a [u8],
        event: &'a Event,
        decoded: &'a DecodedEvent,
        log_index: usize,
        data_resolver: ResolverConfig,
    ) -> Self {
        Self {
            log_node,
            encoded,
            event,
            decoded,
            log_index,
            data_resolver,
            data_offsets: None,
            selections: Vec::new(),
        }
    }

    /// ABI description of the matched event.
    pub fn event(&self) -> &Event {
        self.event
    }

    /// Decoded indexed and body values of the matched log.
    pub fn decoded(&self) -> &DecodedEvent {
        self.decoded
    }

    /// Position of the matched log in the receipt.
    pub fn log_index(&self) -> usize {
        self.log_index
    }

    /// Ranges selected so far by this builder.
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Select the emitting contract address.
    pub fn add_address(&mut self) -> Result<&mut Self, QueryError> {
        let selection = self.part(ADDRESS, "log address")?.selection()?;
        self.selections.push(selection);
        Ok(self)
    }

    /// Select topic zero, the event signature hash.
    pub fn add_signature(&mut self) -> Result<&mut Self, QueryError> {
        if self.event.anonymous {
            return Err(QueryError::Unsupported {
                what: format!("signature topic of anonymous event {}", self.event.name),
                reason: "anonymous events do not emit their signature hash".into(),
            });
        }
        let selection = self.topic(0)?.selection()?;
        self.selections.push(selection);
        Ok(self)
    }

    /// Select the range of the argument called `name`.
    ///
    /// Indexed arguments select their topic word. Non-indexed arguments
    /// select their range in the data payload, which must have a concrete
    /// size (scalars, `bytes`, `string`).
    pub fn add_argument(&mut self, name: &str) -> Result<&mut Self, QueryError> {
        let event = self.event;
        // topic zero carries the signature unless the event is anonymous
        let mut topic_position = usize::from(!event.anonymous);
        let mut data_position = 0;

        for input in &event.inputs {
            if input.name == name {
                let selection = if input.indexed {
                    self.topic(topic_position)?.selection()?
                } else {
                    self.data_argument(data_position)?
                };
                trace!(argument = name, %selection, "selected event argument");
                self.selections.push(selection);
                return Ok(self);
            }
            if input.indexed {
                topic_position += 1;
            } else {
                data_position += 1;
            }
        }

        Err(QueryError::UnknownArgument {
            argument: name.to_string(),
            context: format!("event {}", event.signature()),
        })
    }

    pub(crate) fn into_selections(self) -> Vec<Selection> {
        self.selections
    }

    fn part(&self, index: usize, part: &'static str) -> Result<&'a FieldLocation, QueryError> {
        self.log_node
            .child(index)
            .ok_or(QueryError::MissingNode { part })
    }

    fn topic(&self, position: usize) -> Result<&'a FieldLocation, QueryError> {
        self.part(TOPICS, "log topics")?
            .child(position)
            .ok_or(QueryError::MissingNode { part: "log topic" })
    }

    fn data_argument(&mut self, position: usize) -> Result<Selection, QueryError> {
        let data_node = self.part(DATA, "log data")?;

        if self.data_offsets.is_none() {
            let payload = data_node
                .slice(self.encoded)
                .ok_or(QueryError::MissingNode { part: "log data" })?;
            let types = self.body_types()?;
            self.data_offsets = Some(compute_offsets_with(&types, payload, &self.data_resolver)?);
        }

        let offsets = self.data_offsets.as_deref().unwrap_or_default();
        let node = offsets.get(position).ok_or(QueryError::FieldCountMismatch {
            expected: position + 1,
            got: offsets.len(),
        })?;
        Ok(node.selection()?.shifted(data_node.offset))
    }

    fn body_types(&self) -> Result<Vec<DynSolType>, QueryError> {
        self.event
            .inputs
            .iter()
            .filter(|input| !input.indexed)
            .map(|input| {
                input.resolve().map_err(|e| QueryError::InvalidDescriptor {
                    descriptor: input.ty.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

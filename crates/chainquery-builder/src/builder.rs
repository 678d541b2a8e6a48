//! The query builder.
//!
//! A `QueryBuilder` owns one encoded transaction record, its resolved field
//! tree, and the name → node index produced by zipping the tree with the
//! record's field mapping. Callers select byte ranges by field name, by event
//! argument, or by function argument; `build()` returns the ranges in the
//! order they were added.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_dyn_abi::{DecodedEvent, EventExt};
use alloy_json_abi::{Event, Function, JsonAbi};
use alloy_primitives::{Address, Bytes, Log};
use tracing::{debug, warn};

use chainquery_abi::{compute_offsets_with, FieldMapping};
use chainquery_core::{
    EncodingVersion, FieldLocation, QueryConfig, QueryError, QueryableField, ReceiptContext,
    Selection, TxContext, SELECTOR_SIZE, WORD_SIZE,
};

use crate::event::EventQueryBuilder;
use crate::function::{CallDataOffsets, FunctionQueryBuilder};
use crate::matcher::AbiQuery;
use crate::provider::{AbiCache, AbiProvider};

/// One log accepted by an event query.
struct EventMatch {
    log_index: usize,
    event: Event,
    decoded: DecodedEvent,
}

/// Accumulates byte-range selections over one encoded transaction record.
pub struct QueryBuilder {
    tx: TxContext,
    receipt: ReceiptContext,
    encoded: Bytes,
    config: QueryConfig,
    tree: Vec<FieldLocation>,
    fields: HashMap<QueryableField, usize>,
    abi_provider: Option<Arc<dyn AbiProvider>>,
    abi_cache: AbiCache,
    calldata_offsets: CallDataOffsets,
    selections: Vec<Selection>,
}

impl std::fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("tx", &self.tx)
            .field("logs", &self.receipt.logs.len())
            .field("encoded_len", &self.encoded.len())
            .field("has_abi_provider", &self.abi_provider.is_some())
            .field("selections", &self.selections)
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    /// Resolve `encoded` against the field mapping of `tx.tx_type`.
    ///
    /// # Errors
    /// Fails when the record cannot be resolved or does not match the mapping.
    pub fn new(
        tx: TxContext,
        receipt: ReceiptContext,
        encoded: impl Into<Bytes>,
    ) -> Result<Self, QueryError> {
        Self::with_config(tx, receipt, encoded, QueryConfig::default())
    }

    pub fn with_config(
        tx: TxContext,
        receipt: ReceiptContext,
        encoded: impl Into<Bytes>,
        config: QueryConfig,
    ) -> Result<Self, QueryError> {
        let encoded = encoded.into();
        let mapping = FieldMapping::for_transaction(EncodingVersion::V1, tx.tx_type)?;
        let tree = compute_offsets_with(&mapping.types(), &encoded, &config.resolver)?;
        let fields = mapping.zip(&tree)?;

        let encoded_logs = fields
            .get(&QueryableField::RxLogs)
            .and_then(|&i| tree.get(i))
            .map_or(0, |node| node.children.len());
        if encoded_logs != receipt.logs.len() {
            warn!(
                encoded_logs,
                receipt_logs = receipt.logs.len(),
                "receipt logs do not match the encoded logs field"
            );
        }

        debug!(
            tx_type = %tx.tx_type,
            fields = tree.len(),
            bytes = encoded.len(),
            "query builder ready"
        );

        Ok(Self {
            tx,
            receipt,
            encoded,
            config,
            tree,
            fields,
            abi_provider: None,
            abi_cache: AbiCache::default(),
            calldata_offsets: CallDataOffsets::new(),
            selections: Vec::new(),
        })
    }

    pub fn with_abi_provider(mut self, provider: Arc<dyn AbiProvider>) -> Self {
        self.abi_provider = Some(provider);
        self
    }

    pub fn set_abi_provider(&mut self, provider: Arc<dyn AbiProvider>) {
        self.abi_provider = Some(provider);
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    /// Resolved node of a top-level field, if the record's variant has it.
    pub fn field(&self, field: QueryableField) -> Option<&FieldLocation> {
        self.fields.get(&field).and_then(|&i| self.tree.get(i))
    }

    pub fn tree(&self) -> &[FieldLocation] {
        &self.tree
    }

    pub fn encoded(&self) -> &Bytes {
        &self.encoded
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Consume the builder, returning every selection in insertion order.
    pub fn build(self) -> Vec<Selection> {
        self.selections
    }

    // ─── Direct selections ───────────────────────────────────────────────────

    /// Select a top-level field with a concrete size.
    pub fn add_static_field(&mut self, field: QueryableField) -> Result<&mut Self, QueryError> {
        let node = self.field(field).ok_or_else(|| QueryError::FieldNotPresent {
            field: field.to_string(),
            tx_type: self.tx.tx_type.as_u8(),
        })?;

        if node.is_dynamic && node.size.is_none() {
            return Err(QueryError::FieldIsDynamic {
                field: field.to_string(),
                ty: node.type_name(),
            });
        }
        let selection = node.selection()?;

        self.selections.push(selection);
        Ok(self)
    }

    /// Append a caller-supplied range without validation.
    pub fn add_manual(&mut self, offset: usize, size: usize) -> &mut Self {
        self.selections.push(Selection::new(offset, size));
        self
    }

    /// Select the 4-byte selector of the call data. Needs no ABI.
    pub fn add_function_signature(&mut self) -> Result<&mut Self, QueryError> {
        let node = self.data_node()?;
        let len = node.size.unwrap_or(0);
        if len == 0 {
            return Err(QueryError::NoCallData);
        }
        if len < SELECTOR_SIZE {
            return Err(QueryError::CallDataTooShort { len });
        }
        let selection = Selection::new(node.offset, SELECTOR_SIZE);
        self.selections.push(selection);
        Ok(self)
    }

    // ─── Events ──────────────────────────────────────────────────────────────

    /// Configure selections for the single log matching `query` and `filter`.
    ///
    /// `query` is a topic0 hash, a full event signature, or an event name.
    /// `filter` receives the raw log, its decoded form and its receipt index.
    /// No match is a no-op; more than one match fails with `AmbiguousEvent`.
    pub async fn resolve_event<F, C>(
        &mut self,
        query: &str,
        filter: F,
        configurator: C,
    ) -> Result<&mut Self, QueryError>
    where
        F: Fn(&Log, &DecodedEvent, usize) -> bool,
        C: FnOnce(&mut EventQueryBuilder<'_>) -> Result<(), QueryError>,
    {
        let mut matches = self.find_events(query, filter).await?;
        let matched = match matches.len() {
            0 => {
                debug!(query, "no log matched event query");
                return Ok(self);
            }
            1 => matches.remove(0),
            count => {
                return Err(QueryError::AmbiguousEvent {
                    query: query.to_string(),
                    count,
                })
            }
        };

        let selected = self.apply_event(&matched, configurator)?;
        self.selections.extend(selected);
        Ok(self)
    }

    /// Like [`resolve_event`](Self::resolve_event), applying `configurator`
    /// to every matching log in receipt order.
    ///
    /// Selections are added only if every match is configured successfully.
    pub async fn resolve_all_events<F, C>(
        &mut self,
        query: &str,
        filter: F,
        mut configurator: C,
    ) -> Result<&mut Self, QueryError>
    where
        F: Fn(&Log, &DecodedEvent, usize) -> bool,
        C: FnMut(&mut EventQueryBuilder<'_>) -> Result<(), QueryError>,
    {
        let matches = self.find_events(query, filter).await?;
        debug!(query, matches = matches.len(), "resolving all matching events");
        let mut selected = Vec::new();
        for matched in &matches {
            selected.extend(self.apply_event(matched, &mut configurator)?);
        }
        self.selections.extend(selected);
        Ok(self)
    }

    /// Select the signature topic of the single log matching `query`.
    pub async fn add_event_signature<F>(
        &mut self,
        query: &str,
        filter: F,
    ) -> Result<&mut Self, QueryError>
    where
        F: Fn(&Log, &DecodedEvent, usize) -> bool,
    {
        self.resolve_event(query, filter, |event| {
            event.add_signature()?;
            Ok(())
        })
        .await
    }

    /// Select one argument of the single log matching `query`.
    pub async fn add_event_argument<F>(
        &mut self,
        query: &str,
        filter: F,
        argument: &str,
    ) -> Result<&mut Self, QueryError>
    where
        F: Fn(&Log, &DecodedEvent, usize) -> bool,
    {
        self.resolve_event(query, filter, |event| {
            event.add_argument(argument)?;
            Ok(())
        })
        .await
    }

    fn apply_event<C>(
        &self,
        matched: &EventMatch,
        configurator: C,
    ) -> Result<Vec<Selection>, QueryError>
    where
        C: FnOnce(&mut EventQueryBuilder<'_>) -> Result<(), QueryError>,
    {
        let logs_node = self
            .field(QueryableField::RxLogs)
            .ok_or(QueryError::MissingNode { part: "logs field" })?;
        let log_node = logs_node
            .child(matched.log_index)
            .ok_or(QueryError::MissingLog {
                index: matched.log_index,
            })?;

        let mut builder = EventQueryBuilder::new(
            log_node,
            &self.encoded,
            &matched.event,
            &matched.decoded,
            matched.log_index,
            self.config.event_data_resolver(),
        );
        configurator(&mut builder)?;
        Ok(builder.into_selections())
    }

    async fn find_events<F>(&mut self, query: &str, filter: F) -> Result<Vec<EventMatch>, QueryError>
    where
        F: Fn(&Log, &DecodedEvent, usize) -> bool,
    {
        let query_key = AbiQuery::parse(query, WORD_SIZE)?;

        // logs without topics cannot be matched to a declared event
        let candidates: Vec<_> = self
            .receipt
            .logs
            .iter()
            .enumerate()
            .filter_map(|(index, log)| {
                let topic0 = *log.topics().first()?;
                let keep = !query_key.is_selector() || query_key.matches(topic0.as_slice(), "", "");
                keep.then_some((index, log.address))
            })
            .collect();

        let mut matches = Vec::new();
        for (index, address) in candidates {
            let abi = self.abi_for(address).await?;
            let log = self
                .receipt
                .logs
                .get(index)
                .ok_or(QueryError::MissingLog { index })?;

            let Some((event, decoded)) = match_log(&abi, log, index, &query_key)? else {
                continue;
            };
            if filter(log, &decoded, index) {
                matches.push(EventMatch {
                    log_index: index,
                    event,
                    decoded,
                });
            }
        }
        Ok(matches)
    }

    // ─── Functions ───────────────────────────────────────────────────────────

    /// Configure selections over the call data of the function matching
    /// `query` (a selector, full signature, or unique function name).
    pub async fn resolve_function<C>(
        &mut self,
        query: &str,
        configurator: C,
    ) -> Result<&mut Self, QueryError>
    where
        C: FnOnce(&mut FunctionQueryBuilder<'_>) -> Result<(), QueryError>,
    {
        if self.tx.input.is_empty() {
            return Err(QueryError::NoCallData);
        }
        let to = self.tx.to.ok_or(QueryError::NoDestination)?;
        let actual = self.tx.selector().ok_or(QueryError::CallDataTooShort {
            len: self.tx.input.len(),
        })?;

        let abi = self.abi_for(to).await?;
        let function = match_function(&abi, query, to)?;

        if function.selector().0 != actual {
            return Err(QueryError::SelectorMismatch {
                function: function.signature(),
                expected: hex::encode(function.selector()),
                actual: hex::encode(actual),
            });
        }

        let data_node = self
            .fields
            .get(&QueryableField::TxData)
            .and_then(|&i| self.tree.get(i))
            .ok_or(QueryError::MissingNode { part: "call data field" })?;

        let mut builder = FunctionQueryBuilder::new(
            data_node,
            &self.encoded,
            function,
            self.config.resolver,
            &mut self.calldata_offsets,
        );
        configurator(&mut builder)?;
        let selected = builder.into_selections();

        debug!(
            function = %function.signature(),
            selections = selected.len(),
            "resolved function query"
        );
        self.selections.extend(selected);
        Ok(self)
    }

    /// Select one argument of the function matching `query`.
    pub async fn add_function_argument(
        &mut self,
        query: &str,
        argument: &str,
    ) -> Result<&mut Self, QueryError> {
        self.resolve_function(query, |function| {
            function.add_argument(argument)?;
            Ok(())
        })
        .await
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn data_node(&self) -> Result<&FieldLocation, QueryError> {
        self.field(QueryableField::TxData)
            .ok_or(QueryError::MissingNode { part: "call data field" })
    }

    async fn abi_for(&mut self, address: Address) -> Result<Arc<JsonAbi>, QueryError> {
        let provider = self.abi_provider.clone().ok_or(QueryError::ProviderNotSet)?;
        let abi = self.abi_cache.get_or_fetch(provider.as_ref(), address).await?;
        debug!(%address, cached = self.abi_cache.len(), "contract ABI available");
        Ok(abi)
    }
}

/// Find the event of `abi` that `log` is an occurrence of, if it is the one
/// `query` names, and decode the log against it.
fn match_log(
    abi: &JsonAbi,
    log: &Log,
    index: usize,
    query: &AbiQuery,
) -> Result<Option<(Event, DecodedEvent)>, QueryError> {
    let not_decodable = |reason: String| QueryError::LogNotDecodable {
        index,
        address: log.address.to_string(),
        reason,
    };
    let topic0 = log.topics().first().copied().unwrap_or_default();

    let declared = abi
        .events()
        .find(|event| !event.anonymous && event.selector() == topic0);

    if let Some(event) = declared {
        if !query.matches(event.selector().as_slice(), &event.signature(), &event.name) {
            return Ok(None);
        }
        let decoded = event
            .decode_log(&log.data, true)
            .map_err(|e| not_decodable(e.to_string()))?;
        return Ok(Some((event.clone(), decoded)));
    }

    if query.is_selector() {
        return Err(not_decodable(format!("event {topic0} is not declared in the contract ABI")));
    }

    // anonymous events carry no signature topic and can only be tried
    Ok(abi
        .events()
        .filter(|event| event.anonymous)
        .filter(|event| query.matches(&[], &event.signature(), &event.name))
        .find_map(|event| {
            event
                .decode_log(&log.data, true)
                .ok()
                .map(|decoded| (event.clone(), decoded))
        }))
}

fn match_function<'a>(
    abi: &'a JsonAbi,
    query: &str,
    address: Address,
) -> Result<&'a Function, QueryError> {
    let key = AbiQuery::parse(query, SELECTOR_SIZE)?;
    let candidates: Vec<&Function> = abi
        .functions()
        .filter(|f| key.matches(f.selector().as_slice(), &f.signature(), &f.name))
        .collect();

    match candidates.as_slice() {
        [function] => Ok(function),
        [] => Err(QueryError::FunctionNotFound {
            query: query.to_string(),
            address: address.to_string(),
        }),
        many => Err(QueryError::AmbiguousFunction {
            query: query.to_string(),
            count: many.len(),
        }),
    }
}

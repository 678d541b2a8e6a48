//! Error types for the ChainQuery resolution and selection pipeline.

use thiserror::Error;

/// Failure classes shared by every ChainQuery error.
///
/// None of them is recoverable mid-resolution: callers may only retry a whole
/// resolution or build call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Field count or type descriptor disagreement between a mapping and a tree.
    SchemaMismatch,
    /// A read, jump or pointer outside the buffer, or an exhausted read budget.
    Bounds,
    /// A field without a concrete size, or a type the resolver cannot address.
    Unsupported,
    /// More than one candidate matched a single-match query.
    Ambiguous,
    /// Interface-description retrieval or parsing failed.
    Lookup,
}

/// Errors raised by the cursor and the offset resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("data out-of-bounds: read of {length} bytes at offset {offset} exceeds buffer of {buffer_len} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    #[error("jump out of bounds: offset {offset} outside view of {view_len} bytes")]
    JumpOutOfBounds { offset: usize, view_len: usize },

    #[error("pointer {pointer} at offset {at} points outside buffer of {buffer_len} bytes")]
    PointerOutOfBounds {
        pointer: usize,
        at: usize,
        buffer_len: usize,
    },

    #[error("ABI data exceeds inflation ratio of {max_inflation}: read {bytes_read} bytes of a {buffer_len} byte buffer")]
    InflationExceeded {
        bytes_read: usize,
        buffer_len: usize,
        max_inflation: usize,
    },

    #[error("word at offset {offset} does not fit a pointer, length or count")]
    ValueOverflow { offset: usize },

    #[error("unsupported type in schema: {ty}")]
    UnsupportedType { ty: String },
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::UnsupportedType { .. } => ErrorKind::Unsupported,
            _ => ErrorKind::Bounds,
        }
    }
}

/// Errors from an interface-description source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no ABI available for contract {address}")]
    NotFound { address: String },

    #[error("ABI fetch failed for {address}: {reason}")]
    Fetch { address: String, reason: String },
}

/// Errors raised while building a selection over a resolved tree.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("offset resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("interface lookup failed: {0}")]
    Provider(#[from] ProviderError),

    // ─── Schema / buffer mismatch ────────────────────────────────────────────
    #[error("invalid type descriptor '{descriptor}': {reason}")]
    InvalidDescriptor { descriptor: String, reason: String },

    #[error("unsupported transaction type {tx_type}")]
    UnsupportedTxType { tx_type: u8 },

    #[error("field count mismatch: mapping declares {expected} fields, resolved tree has {got}")]
    FieldCountMismatch { expected: usize, got: usize },

    #[error("type mismatch for field {field}: mapping declares {expected}, resolved {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    #[error("log {index} is missing from the resolved logs field")]
    MissingLog { index: usize },

    #[error("resolved node is missing its {part}")]
    MissingNode { part: &'static str },

    // ─── Unsupported field ───────────────────────────────────────────────────
    #[error("field {field} is not present in transaction type {tx_type}")]
    FieldNotPresent { field: String, tx_type: u8 },

    #[error("field {field} of type {ty} is dynamic and cannot be selected as a static field")]
    FieldIsDynamic { field: String, ty: String },

    #[error("field of type {ty} at offset {offset} has no concrete size")]
    MissingSize { ty: String, offset: usize },

    #[error("unknown argument '{argument}' in {context}")]
    UnknownArgument { argument: String, context: String },

    #[error("{what} is not supported: {reason}")]
    Unsupported { what: String, reason: String },

    #[error("transaction has no call data")]
    NoCallData,

    #[error("transaction has no destination contract")]
    NoDestination,

    #[error("call data of {len} bytes is too short for a function selector")]
    CallDataTooShort { len: usize },

    #[error("no function matching '{query}' in the interface of {address}")]
    FunctionNotFound { query: String, address: String },

    #[error("function '{function}' selector 0x{expected} does not match call data selector 0x{actual}")]
    SelectorMismatch {
        function: String,
        expected: String,
        actual: String,
    },

    // ─── Ambiguous match ─────────────────────────────────────────────────────
    #[error("ambiguous event match for '{query}': {count} events found")]
    AmbiguousEvent { query: String, count: usize },

    #[error("ambiguous function match for '{query}': {count} overloads found")]
    AmbiguousFunction { query: String, count: usize },

    // ─── Lookup failure ──────────────────────────────────────────────────────
    #[error("ABI provider is not set")]
    ProviderNotSet,

    #[error("invalid ABI JSON for {address}: {reason}")]
    InvalidAbi { address: String, reason: String },

    #[error("invalid signature hex '{query}'")]
    InvalidSignatureHex { query: String },

    #[error("log {index} emitted by {address} cannot be decoded: {reason}")]
    LogNotDecodable {
        index: usize,
        address: String,
        reason: String,
    },
}

impl QueryError {
    /// Classify this error into the shared failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Resolve(e) => e.kind(),
            QueryError::InvalidDescriptor { .. }
            | QueryError::UnsupportedTxType { .. }
            | QueryError::FieldCountMismatch { .. }
            | QueryError::TypeMismatch { .. }
            | QueryError::MissingLog { .. }
            | QueryError::MissingNode { .. } => ErrorKind::SchemaMismatch,
            QueryError::FieldNotPresent { .. }
            | QueryError::FieldIsDynamic { .. }
            | QueryError::MissingSize { .. }
            | QueryError::UnknownArgument { .. }
            | QueryError::Unsupported { .. }
            | QueryError::NoCallData
            | QueryError::NoDestination
            | QueryError::CallDataTooShort { .. }
            | QueryError::FunctionNotFound { .. }
            | QueryError::SelectorMismatch { .. } => ErrorKind::Unsupported,
            QueryError::AmbiguousEvent { .. } | QueryError::AmbiguousFunction { .. } => {
                ErrorKind::Ambiguous
            }
            QueryError::Provider(_)
            | QueryError::ProviderNotSet
            | QueryError::InvalidAbi { .. }
            | QueryError::InvalidSignatureHex { .. }
            | QueryError::LogNotDecodable { .. } => ErrorKind::Lookup,
        }
    }
}

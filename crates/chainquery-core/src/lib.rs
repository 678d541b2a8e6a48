//! # chainquery-core
//!
//! Shared primitives for ChainQuery: the field-location tree produced by the
//! offset resolver, the selection entries produced by the query builder, the
//! queryable field catalog, and the error taxonomy every crate reports with.

pub mod config;
pub mod context;
pub mod error;
pub mod fields;
pub mod location;

pub use config::{QueryConfig, ResolverConfig};
pub use context::{ReceiptContext, TxContext};
pub use error::{ErrorKind, ProviderError, QueryError, ResolveError};
pub use fields::{EncodingVersion, QueryableField, TxType};
pub use location::{FieldLocation, Selection};

/// Size in bytes of one ABI word.
pub const WORD_SIZE: usize = 32;

/// Size in bytes of a function selector.
pub const SELECTOR_SIZE: usize = 4;

//! # chainquery-builder
//!
//! Select `{offset, size}` byte ranges from an ABI-encoded transaction record
//! by field name, event argument, or function argument.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chainquery_builder::{QueryBuilder, StaticAbiProvider};
//! use chainquery_core::{QueryableField, ReceiptContext, TxContext};
//!
//! # async fn demo(
//! #     tx: TxContext,
//! #     receipt: ReceiptContext,
//! #     encoded: Vec<u8>,
//! #     provider: StaticAbiProvider,
//! # ) -> Result<(), chainquery_core::QueryError> {
//! let mut builder = QueryBuilder::new(tx, receipt, encoded)?
//!     .with_abi_provider(Arc::new(provider));
//!
//! builder.add_static_field(QueryableField::TxFrom)?;
//! builder
//!     .resolve_all_events("Transfer", |_, _, _| true, |event| {
//!         event.add_address()?.add_argument("from")?.add_argument("value")?;
//!         Ok(())
//!     })
//!     .await?;
//!
//! let selections = builder.build();
//! # let _ = selections;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod event;
pub mod function;
mod matcher;
pub mod provider;

pub use builder::QueryBuilder;
pub use event::EventQueryBuilder;
pub use function::FunctionQueryBuilder;
pub use provider::{AbiProvider, StaticAbiProvider};

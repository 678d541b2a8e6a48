//! # chainquery-observability
//!
//! Structured logging for ChainQuery.
//!
//! The resolver and builder crates emit `tracing` events:
//! - `chainquery_abi`: one `debug` event per resolution run (field count,
//!   buffer length, bytes read) and `trace` events per followed pointer
//! - `chainquery_builder`: `debug` events for ABI fetches, event matches and
//!   function resolution, `warn` when receipt logs disagree with the record
//!
//! [`init_tracing`] installs a subscriber with per-crate levels, emitting
//! human-readable text or JSON lines.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};

//! # chainquery-abi
//!
//! Field-offset resolution for ABI head/tail encoded buffers.
//!
//! Given a type schema and an encoded buffer, [`compute_offsets`] returns a
//! [`FieldLocation`](chainquery_core::FieldLocation) tree recording where
//! every field's bytes live, so a consumer can select byte ranges without
//! decoding the whole record.
//!
//! ```no_run
//! use alloy_core::dyn_abi::DynSolType;
//! use chainquery_abi::compute_offsets;
//!
//! # fn demo(encoded: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let schema = [DynSolType::parse("uint64")?, DynSolType::parse("bytes")?];
//! let fields = compute_offsets(&schema, encoded)?;
//! let payload = fields[1].slice(encoded);
//! # let _ = payload;
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod dynamic;
pub mod mapping;
pub mod resolver;

pub use cursor::{Cursor, ReadBudget};
pub use dynamic::is_dynamic;
pub use mapping::{parse_type, parse_types, FieldMapping};
pub use resolver::{compute_offsets, compute_offsets_with};

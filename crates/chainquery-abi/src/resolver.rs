//! Head/tail offset resolver.
//!
//! Walks an ABI-encoded buffer against a type schema and records, for every
//! field, where its bytes live. Nothing is decoded into values; the raw words
//! and payloads are only captured for inspection.
//!
//! Layout rules:
//!   - static scalars occupy one word in the head
//!   - dynamic fields leave a pointer in the head, relative to the start of
//!     the enclosing view, and live in the tail
//!   - `bytes`/`string` tails are `[length][payload, right-padded]`
//!   - `T[]` tails are `[count][elements]`; with dynamic `T` the elements are
//!     pointers relative to the word after the count

use alloy_core::dyn_abi::DynSolType;
use tracing::{debug, trace};

use chainquery_core::{FieldLocation, ResolveError, ResolverConfig, WORD_SIZE};

use crate::cursor::{Cursor, ReadBudget};
use crate::dynamic::is_dynamic;

/// Resolve the location of every field of `types` in `data` with default limits.
///
/// # Errors
/// Any out-of-bounds read or pointer, an exhausted read budget, or a type the
/// resolver cannot address.
pub fn compute_offsets(
    types: &[DynSolType],
    data: &[u8],
) -> Result<Vec<FieldLocation>, ResolveError> {
    compute_offsets_with(types, data, &ResolverConfig::default())
}

/// Like [`compute_offsets`], with explicit resolver limits.
pub fn compute_offsets_with(
    types: &[DynSolType],
    data: &[u8],
    config: &ResolverConfig,
) -> Result<Vec<FieldLocation>, ResolveError> {
    let budget = ReadBudget::new(data.len(), config.max_inflation);
    let mut cursor = Cursor::new(data, &budget, config.allow_loose);

    let fields = resolve_fields(&mut cursor, types)?;

    debug!(
        fields = fields.len(),
        buffer_len = data.len(),
        bytes_read = budget.bytes_read(),
        "resolved ABI field offsets"
    );
    Ok(fields)
}

fn resolve_fields(
    cursor: &mut Cursor<'_>,
    types: &[DynSolType],
) -> Result<Vec<FieldLocation>, ResolveError> {
    types.iter().map(|ty| resolve_head(cursor, ty)).collect()
}

/// Resolve one head slot: either the inline value or the tail it points to.
fn resolve_head(cursor: &mut Cursor<'_>, ty: &DynSolType) -> Result<FieldLocation, ResolveError> {
    if is_dynamic(ty) {
        let mut tail = cursor.read_pointer()?;
        trace!(ty = %ty.sol_type_name(), tail = tail.base(), "following head pointer");
        resolve_tail(&mut tail, ty)
    } else {
        resolve_inline(cursor, ty)
    }
}

/// Resolve a dynamic value whose tail starts at `tail.base()`.
fn resolve_tail(tail: &mut Cursor<'_>, ty: &DynSolType) -> Result<FieldLocation, ResolveError> {
    let start = tail.base();

    match ty {
        DynSolType::Bytes | DynSolType::String => {
            let length = tail.read_index()?;
            let offset = tail.position();
            let payload = tail.read_bytes_loose(length)?;
            Ok(FieldLocation {
                sol_type: ty.clone(),
                offset,
                size: Some(length),
                is_dynamic: true,
                value: Some(payload.to_vec()),
                children: Vec::new(),
            })
        }

        DynSolType::Array(elem) => {
            let count_at = tail.position();
            let count = tail.read_index()?;
            // every element takes at least one byte of head
            if count > tail.remaining() {
                return Err(ResolveError::OutOfBounds {
                    offset: count_at,
                    length: count,
                    buffer_len: tail.buffer_len(),
                });
            }

            let mut children = Vec::new();
            if is_dynamic(elem) {
                let mut heads = tail.sub_reader(0)?;
                for _ in 0..count {
                    let mut element = heads.read_pointer()?;
                    children.push(resolve_tail(&mut element, elem)?);
                }
            } else {
                for _ in 0..count {
                    children.push(resolve_inline(tail, elem)?);
                }
            }
            trace!(ty = %ty.sol_type_name(), offset = start, count, "resolved array");
            Ok(composite(ty, start, true, children))
        }

        DynSolType::FixedArray(elem, len) => {
            let mut children = Vec::new();
            for _ in 0..*len {
                children.push(resolve_head(tail, elem)?);
            }
            Ok(composite(ty, start, true, children))
        }

        DynSolType::Tuple(components) => {
            let children = resolve_fields(tail, components)?;
            Ok(composite(ty, start, true, children))
        }

        _ => Err(unsupported(ty)),
    }
}

/// Resolve a static value laid out in place at the cursor.
fn resolve_inline(cursor: &mut Cursor<'_>, ty: &DynSolType) -> Result<FieldLocation, ResolveError> {
    match ty {
        DynSolType::Bool
        | DynSolType::Int(_)
        | DynSolType::Uint(_)
        | DynSolType::FixedBytes(_)
        | DynSolType::Address => {
            let offset = cursor.position();
            let word = cursor.read_word()?;
            Ok(FieldLocation {
                sol_type: ty.clone(),
                offset,
                size: Some(WORD_SIZE),
                is_dynamic: false,
                value: Some(word.to_vec()),
                children: Vec::new(),
            })
        }

        DynSolType::FixedArray(elem, len) => {
            let offset = cursor.position();
            let mut children = Vec::new();
            for _ in 0..*len {
                children.push(resolve_inline(cursor, elem)?);
            }
            Ok(composite(ty, offset, false, children))
        }

        DynSolType::Tuple(components) => {
            let offset = cursor.position();
            let children = components
                .iter()
                .map(|c| resolve_inline(cursor, c))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(composite(ty, offset, false, children))
        }

        _ => Err(unsupported(ty)),
    }
}

fn composite(
    ty: &DynSolType,
    offset: usize,
    is_dynamic: bool,
    children: Vec<FieldLocation>,
) -> FieldLocation {
    FieldLocation {
        sol_type: ty.clone(),
        offset,
        size: None,
        is_dynamic,
        value: None,
        children,
    }
}

fn unsupported(ty: &DynSolType) -> ResolveError {
    ResolveError::UnsupportedType {
        ty: ty.sol_type_name().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(v: u64) -> Vec<u8> {
        let mut w = vec![0u8; 32];
        w[24..].copy_from_slice(&v.to_be_bytes());
        w
    }

    fn ty(s: &str) -> DynSolType {
        DynSolType::parse(s).unwrap()
    }

    #[test]
    fn static_words_sit_in_the_head() {
        let data = [word(1), word(2)].concat();
        let fields = compute_offsets(&[ty("uint256"), ty("address")], &data).unwrap();
        assert_eq!(fields[0].offset, 0);
        assert_eq!(fields[1].offset, 32);
        assert_eq!(fields[1].size, Some(32));
        assert!(!fields[1].is_dynamic);
    }

    #[test]
    fn bytes_payload_follows_length_word() {
        // [ptr=32][len=3][abc......]
        let mut payload = b"abc".to_vec();
        payload.resize(32, 0);
        let data = [word(32), word(3), payload].concat();
        let fields = compute_offsets(&[ty("bytes")], &data).unwrap();
        assert_eq!(fields[0].offset, 64);
        assert_eq!(fields[0].size, Some(3));
        assert_eq!(fields[0].value.as_deref(), Some(&b"abc"[..]));
    }

    #[test]
    fn empty_string_has_zero_size() {
        let data = [word(32), word(0)].concat();
        let fields = compute_offsets(&[ty("string")], &data).unwrap();
        assert_eq!(fields[0].offset, 64);
        assert_eq!(fields[0].size, Some(0));
    }

    #[test]
    fn unpadded_payload_needs_loose_mode() {
        let data = [word(32), word(3), b"abc".to_vec()].concat();
        let types = [ty("bytes")];

        let strict = compute_offsets(&types, &data).unwrap_err();
        assert!(matches!(strict, ResolveError::OutOfBounds { .. }));

        let loose = compute_offsets_with(&types, &data, &ResolverConfig::default().loose()).unwrap();
        assert_eq!(loose[0].size, Some(3));
    }

    #[test]
    fn array_count_larger_than_buffer_fails_fast() {
        let data = [word(32), word(u32::MAX as u64)].concat();
        let err = compute_offsets(&[ty("uint256[]")], &data).unwrap_err();
        assert!(matches!(err, ResolveError::OutOfBounds { offset: 32, .. }));
    }

    #[test]
    fn function_type_is_rejected() {
        let data = word(0);
        let err = compute_offsets(&[ty("function")], &data).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedType { .. }));
    }
}

//! Static/dynamic classification of ABI types.

use alloy_core::dyn_abi::DynSolType;

/// Whether values of `ty` are encoded out-of-line behind a head pointer.
///
/// `bytes`, `string` and `T[]` are always dynamic. `T[k]` is dynamic when
/// `T` is, and a tuple is dynamic when any component is. Everything else
/// occupies exactly one inline word.
pub fn is_dynamic(ty: &DynSolType) -> bool {
    match ty {
        DynSolType::Bytes | DynSolType::String | DynSolType::Array(_) => true,
        DynSolType::FixedArray(inner, _) => is_dynamic(inner),
        DynSolType::Tuple(components) => components.iter().any(is_dynamic),
        _ => false,
    }
}

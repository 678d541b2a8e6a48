//! Field-name mapping for encoded transaction records.
//!
//! An encoded record is the transaction fields of one envelope variant
//! followed by the receipt fields, ABI-encoded as one parameter list. The
//! tables below fix the order and type of every field; a resolved tree is
//! addressed by zipping it with the table in positional order.

use std::collections::HashMap;

use alloy_core::dyn_abi::DynSolType;

use chainquery_core::{EncodingVersion, FieldLocation, QueryError, QueryableField, TxType};

type FieldTable = &'static [(QueryableField, &'static str)];

// ─── V1 tables ───────────────────────────────────────────────────────────────

const V1_LEGACY: FieldTable = &[
    (QueryableField::Type, "uint8"),
    (QueryableField::TxNonce, "uint64"),
    (QueryableField::TxGasPrice, "uint128"),
    (QueryableField::TxGasLimit, "uint64"),
    (QueryableField::TxFrom, "address"),
    (QueryableField::TxTo, "address"),
    (QueryableField::TxValue, "uint256"),
    (QueryableField::TxData, "bytes"),
    (QueryableField::TxV, "uint256"),
    (QueryableField::TxR, "bytes32"),
    (QueryableField::TxS, "bytes32"),
];

const V1_ACCESS_LIST: FieldTable = &[
    (QueryableField::Type, "uint8"),
    (QueryableField::TxChainId, "uint64"),
    (QueryableField::TxNonce, "uint64"),
    (QueryableField::TxGasPrice, "uint128"),
    (QueryableField::TxGasLimit, "uint64"),
    (QueryableField::TxFrom, "address"),
    (QueryableField::TxTo, "address"),
    (QueryableField::TxValue, "uint256"),
    (QueryableField::TxData, "bytes"),
    (QueryableField::TxAccessList, "(address,bytes32[])[]"),
    (QueryableField::TxYParity, "uint8"),
    (QueryableField::TxR, "bytes32"),
    (QueryableField::TxS, "bytes32"),
];

const V1_DYNAMIC_FEE: FieldTable = &[
    (QueryableField::Type, "uint8"),
    (QueryableField::TxChainId, "uint64"),
    (QueryableField::TxNonce, "uint64"),
    (QueryableField::TxMaxPriorityFeePerGas, "uint128"),
    (QueryableField::TxMaxFeePerGas, "uint128"),
    (QueryableField::TxGasLimit, "uint64"),
    (QueryableField::TxFrom, "address"),
    (QueryableField::TxTo, "address"),
    (QueryableField::TxValue, "uint256"),
    (QueryableField::TxData, "bytes"),
    (QueryableField::TxAccessList, "(address,bytes32[])[]"),
    (QueryableField::TxYParity, "uint8"),
    (QueryableField::TxR, "bytes32"),
    (QueryableField::TxS, "bytes32"),
];

const V1_BLOB: FieldTable = &[
    (QueryableField::Type, "uint8"),
    (QueryableField::TxChainId, "uint64"),
    (QueryableField::TxNonce, "uint64"),
    (QueryableField::TxMaxPriorityFeePerGas, "uint128"),
    (QueryableField::TxMaxFeePerGas, "uint128"),
    (QueryableField::TxGasLimit, "uint64"),
    (QueryableField::TxFrom, "address"),
    (QueryableField::TxTo, "address"),
    (QueryableField::TxValue, "uint256"),
    (QueryableField::TxData, "bytes"),
    (QueryableField::TxAccessList, "(address,bytes32[])[]"),
    (QueryableField::TxMaxFeePerBlobGas, "uint128"),
    (QueryableField::TxBlobVersionedHashes, "bytes32[]"),
    (QueryableField::TxYParity, "uint8"),
    (QueryableField::TxR, "bytes32"),
    (QueryableField::TxS, "bytes32"),
];

const V1_SET_CODE: FieldTable = &[
    (QueryableField::Type, "uint8"),
    (QueryableField::TxChainId, "uint64"),
    (QueryableField::TxNonce, "uint64"),
    (QueryableField::TxMaxPriorityFeePerGas, "uint128"),
    (QueryableField::TxMaxFeePerGas, "uint128"),
    (QueryableField::TxGasLimit, "uint64"),
    (QueryableField::TxFrom, "address"),
    (QueryableField::TxTo, "address"),
    (QueryableField::TxValue, "uint256"),
    (QueryableField::TxData, "bytes"),
    (QueryableField::TxAccessList, "(address,bytes32[])[]"),
    // chain id, address, nonce, y parity, r, s
    (
        QueryableField::TxSignedAuthorizations,
        "(uint256,address,uint64,uint8,uint256,uint256)[]",
    ),
    (QueryableField::TxYParity, "uint8"),
    (QueryableField::TxR, "bytes32"),
    (QueryableField::TxS, "bytes32"),
];

const V1_RECEIPT: FieldTable = &[
    (QueryableField::RxStatus, "uint8"),
    (QueryableField::RxGasUsed, "uint64"),
    (QueryableField::RxLogs, "(address,bytes32[],bytes)[]"),
    (QueryableField::RxLogBlooms, "bytes"),
];

/// Parse one type descriptor, e.g. `uint256` or `(address,bytes32[])[]`.
pub fn parse_type(descriptor: &str) -> Result<DynSolType, QueryError> {
    DynSolType::parse(descriptor).map_err(|e| QueryError::InvalidDescriptor {
        descriptor: descriptor.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a list of type descriptors into a resolver schema.
pub fn parse_types<S: AsRef<str>>(descriptors: &[S]) -> Result<Vec<DynSolType>, QueryError> {
    descriptors.iter().map(|d| parse_type(d.as_ref())).collect()
}

/// The ordered `(field, type)` list of one record layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    entries: Vec<(QueryableField, DynSolType)>,
}

impl FieldMapping {
    /// Transaction fields of `tx_type` followed by the receipt fields.
    pub fn for_transaction(version: EncodingVersion, tx_type: TxType) -> Result<Self, QueryError> {
        let (tx_table, rx_table) = match version {
            EncodingVersion::V1 => (v1_transaction_table(tx_type), V1_RECEIPT),
        };

        let entries = tx_table
            .iter()
            .chain(rx_table)
            .map(|(field, descriptor)| Ok((*field, parse_type(descriptor)?)))
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(QueryableField, DynSolType)] {
        &self.entries
    }

    /// Schema to resolve the record against, in mapping order.
    pub fn types(&self) -> Vec<DynSolType> {
        self.entries.iter().map(|(_, ty)| ty.clone()).collect()
    }

    pub fn contains(&self, field: QueryableField) -> bool {
        self.entries.iter().any(|(f, _)| *f == field)
    }

    /// Pair every resolved top-level node with its field name.
    ///
    /// # Errors
    /// Fails if the tree has a different number of nodes than the mapping or
    /// if any node's type descriptor differs from the mapped one.
    pub fn zip(
        &self,
        tree: &[FieldLocation],
    ) -> Result<HashMap<QueryableField, usize>, QueryError> {
        if tree.len() != self.entries.len() {
            return Err(QueryError::FieldCountMismatch {
                expected: self.entries.len(),
                got: tree.len(),
            });
        }

        let mut index = HashMap::with_capacity(tree.len());
        for (position, ((field, ty), node)) in self.entries.iter().zip(tree).enumerate() {
            let expected = ty.sol_type_name();
            let got = node.type_name();
            if expected != got.as_str() {
                return Err(QueryError::TypeMismatch {
                    field: field.to_string(),
                    expected: expected.into_owned(),
                    got,
                });
            }
            index.insert(*field, position);
        }
        Ok(index)
    }
}

fn v1_transaction_table(tx_type: TxType) -> FieldTable {
    match tx_type {
        TxType::Legacy => V1_LEGACY,
        TxType::AccessList => V1_ACCESS_LIST,
        TxType::DynamicFee => V1_DYNAMIC_FEE,
        TxType::Blob => V1_BLOB,
        TxType::SetCode => V1_SET_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [TxType; 5] = [
        TxType::Legacy,
        TxType::AccessList,
        TxType::DynamicFee,
        TxType::Blob,
        TxType::SetCode,
    ];

    #[test]
    fn every_table_parses() {
        for tx_type in ALL_TYPES {
            let mapping = FieldMapping::for_transaction(EncodingVersion::V1, tx_type).unwrap();
            assert!(mapping.contains(QueryableField::RxLogs), "{tx_type}");
        }
    }

    #[test]
    fn field_counts_per_variant() {
        let count = |t| FieldMapping::for_transaction(EncodingVersion::V1, t).unwrap().len();
        assert_eq!(count(TxType::Legacy), 11 + 4);
        assert_eq!(count(TxType::AccessList), 13 + 4);
        assert_eq!(count(TxType::DynamicFee), 14 + 4);
        assert_eq!(count(TxType::Blob), 16 + 4);
        assert_eq!(count(TxType::SetCode), 15 + 4);
    }

    #[test]
    fn receipt_fields_close_every_record() {
        let mapping = FieldMapping::for_transaction(EncodingVersion::V1, TxType::Legacy).unwrap();
        let tail: Vec<_> = mapping.entries()[11..].iter().map(|(f, _)| *f).collect();
        assert_eq!(
            tail,
            [
                QueryableField::RxStatus,
                QueryableField::RxGasUsed,
                QueryableField::RxLogs,
                QueryableField::RxLogBlooms,
            ]
        );
        assert!(!mapping.contains(QueryableField::TxChainId));
    }

    #[test]
    fn zip_rejects_count_mismatch() {
        let mapping = FieldMapping::for_transaction(EncodingVersion::V1, TxType::Legacy).unwrap();
        let err = mapping.zip(&[]).unwrap_err();
        assert!(matches!(
            err,
            QueryError::FieldCountMismatch {
                expected: 15,
                got: 0
            }
        ));
    }

    #[test]
    fn bad_descriptor_is_a_schema_error() {
        let err = parse_type("uint257").unwrap_err();
        assert!(matches!(err, QueryError::InvalidDescriptor { .. }));
        assert_eq!(parse_types(&["uint8", "bytes"]).unwrap().len(), 2);
    }
}

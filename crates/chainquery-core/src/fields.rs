//! Queryable field catalog and transaction variants.
//!
//! The catalog is closed and versioned: each `EncodingVersion` fixes which
//! fields a transaction variant encodes and in what order. The per-variant
//! tables themselves live next to the resolver in `chainquery-abi`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// Every logical field name that can appear in an encoded transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryableField {
    // --- Transaction ---
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "chainId")]
    TxChainId,
    #[serde(rename = "nonce")]
    TxNonce,
    #[serde(rename = "gasPrice")]
    TxGasPrice,
    #[serde(rename = "gasLimit")]
    TxGasLimit,
    #[serde(rename = "from")]
    TxFrom,
    #[serde(rename = "to")]
    TxTo,
    #[serde(rename = "value")]
    TxValue,
    #[serde(rename = "data")]
    TxData,
    #[serde(rename = "v")]
    TxV,
    #[serde(rename = "r")]
    TxR,
    #[serde(rename = "s")]
    TxS,
    #[serde(rename = "yParity")]
    TxYParity,
    #[serde(rename = "accessList")]
    TxAccessList,
    #[serde(rename = "maxPriorityFeePerGas")]
    TxMaxPriorityFeePerGas,
    #[serde(rename = "maxFeePerGas")]
    TxMaxFeePerGas,
    #[serde(rename = "maxFeePerBlobGas")]
    TxMaxFeePerBlobGas,
    #[serde(rename = "blobVersionedHashes")]
    TxBlobVersionedHashes,
    #[serde(rename = "signedAuthorizations")]
    TxSignedAuthorizations,

    // --- Receipt ---
    #[serde(rename = "rxStatus")]
    RxStatus,
    #[serde(rename = "rxGasUsed")]
    RxGasUsed,
    #[serde(rename = "rxLogs")]
    RxLogs,
    #[serde(rename = "rxLogBlooms")]
    RxLogBlooms,
}

impl QueryableField {
    pub const ALL: [QueryableField; 23] = [
        QueryableField::Type,
        QueryableField::TxChainId,
        QueryableField::TxNonce,
        QueryableField::TxGasPrice,
        QueryableField::TxGasLimit,
        QueryableField::TxFrom,
        QueryableField::TxTo,
        QueryableField::TxValue,
        QueryableField::TxData,
        QueryableField::TxV,
        QueryableField::TxR,
        QueryableField::TxS,
        QueryableField::TxYParity,
        QueryableField::TxAccessList,
        QueryableField::TxMaxPriorityFeePerGas,
        QueryableField::TxMaxFeePerGas,
        QueryableField::TxMaxFeePerBlobGas,
        QueryableField::TxBlobVersionedHashes,
        QueryableField::TxSignedAuthorizations,
        QueryableField::RxStatus,
        QueryableField::RxGasUsed,
        QueryableField::RxLogs,
        QueryableField::RxLogBlooms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryableField::Type => "type",
            QueryableField::TxChainId => "chainId",
            QueryableField::TxNonce => "nonce",
            QueryableField::TxGasPrice => "gasPrice",
            QueryableField::TxGasLimit => "gasLimit",
            QueryableField::TxFrom => "from",
            QueryableField::TxTo => "to",
            QueryableField::TxValue => "value",
            QueryableField::TxData => "data",
            QueryableField::TxV => "v",
            QueryableField::TxR => "r",
            QueryableField::TxS => "s",
            QueryableField::TxYParity => "yParity",
            QueryableField::TxAccessList => "accessList",
            QueryableField::TxMaxPriorityFeePerGas => "maxPriorityFeePerGas",
            QueryableField::TxMaxFeePerGas => "maxFeePerGas",
            QueryableField::TxMaxFeePerBlobGas => "maxFeePerBlobGas",
            QueryableField::TxBlobVersionedHashes => "blobVersionedHashes",
            QueryableField::TxSignedAuthorizations => "signedAuthorizations",
            QueryableField::RxStatus => "rxStatus",
            QueryableField::RxGasUsed => "rxGasUsed",
            QueryableField::RxLogs => "rxLogs",
            QueryableField::RxLogBlooms => "rxLogBlooms",
        }
    }

    /// Returns `true` for fields taken from the receipt section.
    pub fn is_receipt_field(&self) -> bool {
        matches!(
            self,
            QueryableField::RxStatus
                | QueryableField::RxGasUsed
                | QueryableField::RxLogs
                | QueryableField::RxLogBlooms
        )
    }
}

impl fmt::Display for QueryableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryableField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryableField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| QueryError::UnknownArgument {
                argument: s.to_string(),
                context: "queryable field catalog".into(),
            })
    }
}

/// Supported transaction envelope variants, by their EIP-2718 type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TxType {
    /// Type 0: no access list, single gas price.
    Legacy,
    /// Type 1 (EIP-2930): adds chain id and access list.
    AccessList,
    /// Type 2 (EIP-1559): priority fee and fee cap.
    DynamicFee,
    /// Type 3 (EIP-4844): blob gas fields.
    Blob,
    /// Type 4 (EIP-7702): signed authorization list.
    SetCode,
}

impl TxType {
    pub fn as_u8(&self) -> u8 {
        match self {
            TxType::Legacy => 0,
            TxType::AccessList => 1,
            TxType::DynamicFee => 2,
            TxType::Blob => 3,
            TxType::SetCode => 4,
        }
    }
}

impl TryFrom<u8> for TxType {
    type Error = QueryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TxType::Legacy),
            1 => Ok(TxType::AccessList),
            2 => Ok(TxType::DynamicFee),
            3 => Ok(TxType::Blob),
            4 => Ok(TxType::SetCode),
            other => Err(QueryError::UnsupportedTxType { tx_type: other }),
        }
    }
}

impl From<TxType> for u8 {
    fn from(t: TxType) -> Self {
        t.as_u8()
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Version of the record layout produced by the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingVersion {
    #[default]
    V1,
}

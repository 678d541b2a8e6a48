//! Structured transaction and receipt context.
//!
//! The query builder needs a small slice of the transaction that produced the
//! encoded record: its variant, destination, call data, and the receipt logs
//! in the same order as the encoded logs array.

use alloy_primitives::{Address, Bytes, Log};
use serde::{Deserialize, Serialize};

use crate::fields::TxType;

/// Transaction facts consumed by event and function resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxContext {
    /// Envelope variant (selects the field-name mapping)
    #[serde(rename = "type")]
    pub tx_type: TxType,
    /// Destination contract; `None` for contract creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Raw call data including the 4-byte selector
    #[serde(default)]
    pub input: Bytes,
}

impl TxContext {
    pub fn new(tx_type: TxType, to: Option<Address>, input: impl Into<Bytes>) -> Self {
        Self {
            tx_type,
            to,
            input: input.into(),
        }
    }

    /// The 4-byte selector prefix of the call data, if present.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// Receipt facts consumed by event resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptContext {
    /// Logs in emission order, matching the encoded logs array
    pub logs: Vec<Log>,
}

impl ReceiptContext {
    pub fn new(logs: Vec<Log>) -> Self {
        Self { logs }
    }
}

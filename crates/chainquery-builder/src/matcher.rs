//! Event and function lookup keys.
//!
//! A query string names an ABI item one of three ways:
//!   - `0x`-prefixed hex: the event topic0 (32 bytes) or function selector (4 bytes)
//!   - a full signature such as `Transfer(address,address,uint256)`
//!   - a bare name such as `Transfer`

use chainquery_core::QueryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AbiQuery {
    Selector(Vec<u8>),
    Signature(String),
    Name(String),
}

impl AbiQuery {
    /// Parse `query`; hex keys must be exactly `selector_len` bytes.
    pub(crate) fn parse(query: &str, selector_len: usize) -> Result<Self, QueryError> {
        let query = query.trim();
        let invalid = || QueryError::InvalidSignatureHex {
            query: query.to_string(),
        };

        if let Some(digits) = query.strip_prefix("0x") {
            let bytes = hex::decode(digits).map_err(|_| invalid())?;
            if bytes.len() != selector_len {
                return Err(invalid());
            }
            return Ok(AbiQuery::Selector(bytes));
        }

        if query.contains('(') {
            let signature = query.chars().filter(|c| !c.is_whitespace()).collect();
            return Ok(AbiQuery::Signature(signature));
        }

        Ok(AbiQuery::Name(query.to_string()))
    }

    pub(crate) fn matches(&self, selector: &[u8], signature: &str, name: &str) -> bool {
        match self {
            AbiQuery::Selector(expected) => expected.as_slice() == selector,
            AbiQuery::Signature(expected) => expected == signature,
            AbiQuery::Name(expected) => expected == name,
        }
    }

    pub(crate) fn is_selector(&self) -> bool {
        matches!(self, AbiQuery::Selector(_))
    }
}

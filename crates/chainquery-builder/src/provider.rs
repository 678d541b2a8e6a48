//! Contract interface (ABI) lookup.
//!
//! `AbiProvider` is the pluggable async source of contract ABIs. The query
//! builder memoizes parsed ABIs per contract address in an `AbiCache`, so a
//! builder session performs at most one fetch per contract.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::{debug, trace};

use chainquery_core::{ProviderError, QueryError};

/// Source of contract ABI JSON documents.
#[async_trait]
pub trait AbiProvider: Send + Sync {
    /// Return the JSON ABI of the contract deployed at `address`.
    async fn get_abi(&self, address: Address) -> Result<String, ProviderError>;
}

/// Fixed address → ABI table, with an optional ABI for unknown addresses.
///
/// Suitable for tests and for deployments where the contracts of interest
/// are known ahead of time.
#[derive(Debug, Clone, Default)]
pub struct StaticAbiProvider {
    abis: HashMap<Address, String>,
    fallback: Option<String>,
}

impl StaticAbiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abi(mut self, address: Address, json: impl Into<String>) -> Self {
        self.insert(address, json);
        self
    }

    /// ABI returned for any address without its own entry.
    pub fn with_fallback(mut self, json: impl Into<String>) -> Self {
        self.fallback = Some(json.into());
        self
    }

    pub fn insert(&mut self, address: Address, json: impl Into<String>) {
        self.abis.insert(address, json.into());
    }

    pub fn len(&self) -> usize {
        self.abis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abis.is_empty()
    }
}

#[async_trait]
impl AbiProvider for StaticAbiProvider {
    async fn get_abi(&self, address: Address) -> Result<String, ProviderError> {
        self.abis
            .get(&address)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                address: address.to_string(),
            })
    }
}

/// Parsed ABIs keyed by contract address.
#[derive(Debug, Default)]
pub(crate) struct AbiCache {
    entries: HashMap<Address, Arc<JsonAbi>>,
}

impl AbiCache {
    pub(crate) async fn get_or_fetch(
        &mut self,
        provider: &dyn AbiProvider,
        address: Address,
    ) -> Result<Arc<JsonAbi>, QueryError> {
        if let Some(abi) = self.entries.get(&address) {
            trace!(%address, "ABI cache hit");
            return Ok(Arc::clone(abi));
        }

        let json = provider.get_abi(address).await?;
        let abi: JsonAbi = serde_json::from_str(&json).map_err(|e| QueryError::InvalidAbi {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        debug!(
            %address,
            events = abi.events().count(),
            functions = abi.functions().count(),
            "fetched contract ABI"
        );

        let abi = Arc::new(abi);
        self.entries.insert(address, Arc::clone(&abi));
        Ok(abi)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

//! Resolver and query-builder configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to one offset-resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum cumulative bytes read, as a multiple of the buffer length.
    /// `0` disables the guard.
    #[serde(default = "default_max_inflation")]
    pub max_inflation: usize,
    /// Accept a final `bytes`/`string` payload that is not padded to a word.
    #[serde(default)]
    pub allow_loose: bool,
}

fn default_max_inflation() -> usize {
    1_024
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_inflation: default_max_inflation(),
            allow_loose: false,
        }
    }
}

impl ResolverConfig {
    /// Strict limits with loose payload reads enabled.
    pub fn loose(self) -> Self {
        Self {
            allow_loose: true,
            ..self
        }
    }
}

/// Top-level query-builder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Limits for the record and call-data resolution
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Resolve event data payloads in loose mode. Old compilers emitted
    /// unpadded data for `external` events.
    #[serde(default = "bool_true")]
    pub loose_event_data: bool,
}

fn bool_true() -> bool {
    true
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            loose_event_data: true,
        }
    }
}

impl QueryConfig {
    /// Resolver limits used for event data payloads.
    pub fn event_data_resolver(&self) -> ResolverConfig {
        if self.loose_event_data {
            self.resolver.loose()
        } else {
            self.resolver
        }
    }
}

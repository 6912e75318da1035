// src/config/app.rs

use crate::storage::registry::split_keys;
use serde::{Deserialize, Serialize};

/// One upstream search provider and its raw credential list.
#[derive(Debug, Deserialize, Clone, PartialEq, Default, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub name: String,
    /// Comma-separated keys, exactly as handed to the registry.
    #[serde(default)]
    pub api_keys: String,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, api_keys: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_keys: api_keys.into(),
        }
    }

    pub fn key_count(&self) -> usize {
        split_keys(&self.api_keys).count()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorConfig {
    /// Fixed RNG seed for reproducible selection.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Provider assumed for multi-key input when none of the keys is registered.
    #[serde(default)]
    pub default_provider: Option<String>,
    #[serde(default)]
    pub selector: SelectorConfig,
}

impl AppConfig {
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn total_keys(&self) -> usize {
        self.providers.iter().map(ProviderConfig::key_count).sum()
    }
}

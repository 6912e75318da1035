// src/storage/registry.rs

use dashmap::DashMap;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Splits a raw comma-separated credential string into trimmed, non-empty keys.
pub fn split_keys(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|k| !k.is_empty())
}

/// Shortened form of a key that is safe to put in logs.
///
/// Keys up to 16 bytes keep two characters on each side, longer keys keep four.
pub fn preview_key(key: &str) -> String {
    if key.len() <= 8 {
        return key.to_string();
    }
    let visible = if key.len() <= 16 { 2 } else { 4 };
    match (key.get(..visible), key.get(key.len() - visible..)) {
        (Some(head), Some(tail)) => format!("{head}...{tail}"),
        _ => "****".to_string(),
    }
}

/// Maps each credential to the provider that owns it.
///
/// Grows for the lifetime of the process. Writes are published per key, so
/// readers never see a partially registered entry.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    key_to_provider: DashMap<String, String>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every key of `raw_keys` under `provider`, overwriting the
    /// provider of keys that were already known. Returns how many keys were
    /// inserted or updated.
    pub fn register(&self, provider: &str, raw_keys: &str) -> usize {
        let mut count = 0;
        for key in split_keys(raw_keys) {
            if let Some(previous) = self.key_to_provider.insert(key.to_string(), provider.to_string()) {
                if previous != provider {
                    warn!(
                        api_key.preview = %preview_key(key),
                        from = %previous,
                        to = %provider,
                        "API key re-registered under a different provider"
                    );
                }
            }
            count += 1;
        }

        if count == 0 {
            debug!(provider = %provider, "No usable keys in provider key list");
        } else {
            info!(provider = %provider, keys = count, "Registered provider keys");
        }
        count
    }

    pub fn provider_of(&self, key: &str) -> Option<String> {
        self.key_to_provider.get(key).map(|entry| entry.value().clone())
    }

    /// All keys currently mapped to `provider`, sorted so that seeded
    /// selection is reproducible.
    pub fn all_keys_of(&self, provider: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .key_to_provider
            .iter()
            .filter(|entry| entry.value() == provider)
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn providers(&self) -> BTreeSet<String> {
        self.key_to_provider
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Every `(key, provider)` pair, sorted by provider then key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .key_to_provider
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    pub fn len(&self) -> usize {
        self.key_to_provider.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_provider.is_empty()
    }
}

// src/core/key_rotation.rs

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::metrics::{self, SelectionPath};
use crate::storage::{preview_key, split_keys, FailureLedger, KeyRegistry, KeyStatus};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// The shapes of credential input a caller can hand to [`KeySelector::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// A single key or a comma-separated list of keys.
    Delimited(String),
    /// Explicit keys. Entries are never split; empty entries are dropped.
    List(Vec<String>),
}

impl KeyInput {
    /// The candidate keys this input names, in input order.
    pub fn candidates(&self) -> Vec<String> {
        match self {
            Self::Delimited(raw) => split_keys(raw).map(str::to_string).collect(),
            Self::List(items) => items.iter().filter(|k| !k.is_empty()).cloned().collect(),
        }
    }
}

impl From<&str> for KeyInput {
    fn from(raw: &str) -> Self {
        Self::Delimited(raw.to_string())
    }
}

impl From<String> for KeyInput {
    fn from(raw: String) -> Self {
        Self::Delimited(raw)
    }
}

impl From<Vec<String>> for KeyInput {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for KeyInput {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for KeyInput {
    fn from(items: &[&str]) -> Self {
        Self::List(items.iter().map(|k| k.to_string()).collect())
    }
}

impl From<&[String]> for KeyInput {
    fn from(items: &[String]) -> Self {
        Self::List(items.to_vec())
    }
}

impl TryFrom<&Value> for KeyInput {
    type Error = AppError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(raw) => Ok(Self::Delimited(raw.clone())),
            Value::Array(items) => Ok(Self::List(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            )),
            Value::Null => Err(AppError::InvalidKeyInput { kind: "null" }),
            Value::Bool(_) => Err(AppError::InvalidKeyInput { kind: "boolean" }),
            Value::Number(_) => Err(AppError::InvalidKeyInput { kind: "number" }),
            Value::Object(_) => Err(AppError::InvalidKeyInput { kind: "object" }),
        }
    }
}

/// Picks one key per outbound call, steering around keys that recently
/// failed, and records failures reported by callers.
///
/// Registry and ledger are shared with anything else holding the same `Arc`s.
/// No operation blocks beyond the short map lock needed to read or update an
/// entry, and selection never fails: the worst outcome is an empty string.
pub struct KeySelector {
    registry: Arc<KeyRegistry>,
    ledger: Arc<FailureLedger>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    default_provider: Option<String>,
}

impl Default for KeySelector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySelector {
    /// Fresh, empty state with the system clock and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_state(Arc::new(KeyRegistry::new()), Arc::new(FailureLedger::new()))
    }

    pub fn with_state(registry: Arc<KeyRegistry>, ledger: Arc<FailureLedger>) -> Self {
        Self {
            registry,
            ledger,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
            default_provider: None,
        }
    }

    /// Builds a selector and registers every configured provider in order.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut selector = Self::new();
        if let Some(seed) = config.selector.seed {
            selector = selector.with_seed(seed);
        }
        if let Some(provider) = &config.default_provider {
            selector = selector.with_default_provider(provider.clone());
        }
        for provider in &config.providers {
            selector.register_provider_keys(&provider.name, &provider.api_keys);
        }
        info!(
            providers = config.providers.len(),
            keys = selector.registry.len(),
            "Key selector initialized from configuration"
        );
        selector
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Provider assumed for multi-key input when none of the keys is registered.
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    pub fn registry(&self) -> &Arc<KeyRegistry> {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<FailureLedger> {
        &self.ledger
    }

    /// Registers a comma-separated key list under `provider`.
    pub fn register_provider_keys(&self, provider: &str, raw_keys: &str) -> usize {
        self.registry.register(provider, raw_keys)
    }

    /// Records that an outbound call with `key` failed with `status_code`
    /// (`0` when unknown). Keys without a provider are ignored.
    pub fn report_failure(&self, key: &str, status_code: u16) {
        let Some(provider) = self.registry.provider_of(key) else {
            debug!(
                api_key.preview = %preview_key(key),
                status_code,
                "Ignoring failure report for unregistered key"
            );
            return;
        };

        let record = self
            .ledger
            .record_failure(&provider, key, status_code, self.clock.now());
        metrics::record_failure_report(&provider);
        info!(
            api_key.preview = %preview_key(key),
            provider = %provider,
            status_code,
            failures = record.fail_count,
            cooldown_secs = record.cooldown().as_secs(),
            "API key failure recorded"
        );
    }

    /// Selects one key from `input`. Returns an empty string only when the
    /// input names no keys at all.
    pub fn select(&self, input: impl Into<KeyInput>) -> String {
        let input = input.into();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_select(&input)));

        match outcome {
            Ok(Ok(Some((key, path)))) => {
                metrics::record_selection(path);
                key
            }
            Ok(Ok(None)) => String::new(),
            Ok(Err(e)) => {
                warn!(error = %e, "Key selection failed. Falling back to an unfiltered pick.");
                self.fallback_pick(&input)
            }
            Err(_) => {
                warn!("Key selection panicked. Falling back to an unfiltered pick.");
                self.fallback_pick(&input)
            }
        }
    }

    /// Like [`select`](Self::select) for loosely-typed input. Anything other
    /// than a string or an array is rejected and yields an empty string.
    pub fn select_value(&self, input: &Value) -> String {
        match KeyInput::try_from(input) {
            Ok(input) => self.select(input),
            Err(e) => {
                warn!(error = %e, "Rejected key input");
                String::new()
            }
        }
    }

    /// Snapshot of every registered key, sorted by provider then key.
    pub fn key_statuses(&self) -> Vec<KeyStatus> {
        let now = self.clock.now();
        self.registry
            .entries()
            .into_iter()
            .map(|(key, provider)| {
                let failure = self.ledger.record(&provider, &key);
                KeyStatus {
                    key_preview: preview_key(&key),
                    available: failure.map_or(true, |r| r.is_expired(now)),
                    cooldown_remaining_secs: failure.map_or(0, |r| r.remaining(now).as_secs()),
                    failure,
                    provider,
                }
            })
            .collect()
    }

    fn try_select(&self, input: &KeyInput) -> Result<Option<(String, SelectionPath)>> {
        let candidates = input.candidates();
        trace!("Selecting key from {} candidates", candidates.len());

        match candidates.as_slice() {
            [] => Ok(None),
            [single] => self.select_single(single).map(Some),
            many => self.select_multi(many).map(Some),
        }
    }

    /// One key may stand for its whole provider pool, so rotate across the
    /// provider's registered keys.
    fn select_single(&self, key: &str) -> Result<(String, SelectionPath)> {
        let Some(provider) = self.registry.provider_of(key) else {
            self.log_key_selection(key, "unregistered", 1, SelectionPath::Passthrough);
            return Ok((key.to_string(), SelectionPath::Passthrough));
        };

        let pool = self.registry.all_keys_of(&provider);
        if pool.len() <= 1 {
            self.log_key_selection(key, &provider, pool.len(), SelectionPath::Passthrough);
            return Ok((key.to_string(), SelectionPath::Passthrough));
        }

        let available = self.ledger.filter_available(&provider, &pool, self.clock.now());
        if available.is_empty() {
            warn!(
                provider = %provider,
                pool_size = pool.len(),
                api_key.preview = %preview_key(key),
                "All keys for provider are cooling down. Using the requested key."
            );
            return Ok((key.to_string(), SelectionPath::LivenessFallback));
        }

        let chosen = self.pick(&available)?;
        self.log_key_selection(&chosen, &provider, available.len(), SelectionPath::Single);
        Ok((chosen, SelectionPath::Single))
    }

    /// Several keys are the full candidate set; only filter them.
    fn select_multi(&self, candidates: &[String]) -> Result<(String, SelectionPath)> {
        if let Some(provider) = self.resolve_provider(candidates) {
            let available = self
                .ledger
                .filter_available(&provider, candidates, self.clock.now());
            if !available.is_empty() {
                let chosen = self.pick(&available)?;
                self.log_key_selection(&chosen, &provider, available.len(), SelectionPath::Multi);
                return Ok((chosen, SelectionPath::Multi));
            }

            warn!(
                provider = %provider,
                candidates = candidates.len(),
                "All candidate keys are cooling down. Picking from the unfiltered input."
            );
            return Ok((self.pick(candidates)?, SelectionPath::LivenessFallback));
        }

        let chosen = self.pick(candidates)?;
        debug!(
            api_key.preview = %preview_key(&chosen),
            total_candidates = candidates.len(),
            "No provider resolved for input keys. Picked without health filtering."
        );
        Ok((chosen, SelectionPath::Multi))
    }

    fn resolve_provider(&self, candidates: &[String]) -> Option<String> {
        candidates
            .iter()
            .find_map(|key| self.registry.provider_of(key))
            .or_else(|| self.default_provider.clone())
    }

    fn pick(&self, candidates: &[String]) -> Result<String> {
        if candidates.is_empty() {
            return Err(AppError::NoCandidates);
        }
        let index = self.rng.lock().gen_range(0..candidates.len());
        Ok(candidates[index].clone())
    }

    fn fallback_pick(&self, input: &KeyInput) -> String {
        let candidates = input.candidates();
        match self.pick(&candidates) {
            Ok(key) => {
                metrics::record_selection(SelectionPath::ErrorFallback);
                key
            }
            Err(_) => String::new(),
        }
    }

    fn log_key_selection(
        &self,
        key: &str,
        provider: &str,
        total_candidates: usize,
        path: SelectionPath,
    ) {
        debug!(
            event = "key_selected",
            api_key.preview = %preview_key(key),
            provider = %provider,
            selection_path = path.as_str(),
            total_candidates,
            "API key selected for request"
        );
    }
}

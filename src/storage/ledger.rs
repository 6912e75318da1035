// src/storage/ledger.rs

use crate::storage::FailureRecord;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;

/// Per-provider record of failed keys.
///
/// Each provider bucket sits behind its own shard lock, so concurrent reports
/// against the same key serialize and none of them is lost. Readers copy the
/// record out under the same lock and never observe a half-written update.
#[derive(Debug, Default)]
pub struct FailureLedger {
    buckets: DashMap<String, HashMap<String, FailureRecord>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or updates the record for `key` in `provider`'s bucket and
    /// returns the record as stored.
    pub fn record_failure(
        &self,
        provider: &str,
        key: &str,
        status_code: u16,
        now: DateTime<Utc>,
    ) -> FailureRecord {
        let mut bucket = self.buckets.entry(provider.to_string()).or_default();
        let record = bucket
            .entry(key.to_string())
            .and_modify(|record| record.record_failure(status_code, now))
            .or_insert_with(|| FailureRecord::new(status_code, now));
        *record
    }

    pub fn record(&self, provider: &str, key: &str) -> Option<FailureRecord> {
        self.buckets
            .get(provider)
            .and_then(|bucket| bucket.get(key).copied())
    }

    /// A key is available when it has no record or its cooldown has elapsed.
    pub fn is_available(&self, provider: &str, key: &str, now: DateTime<Utc>) -> bool {
        self.record(provider, key)
            .map_or(true, |record| record.is_expired(now))
    }

    /// Keeps the keys of `candidates` that are available for `provider`.
    pub fn filter_available(
        &self,
        provider: &str,
        candidates: &[String],
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let Some(bucket) = self.buckets.get(provider) else {
            return candidates.to_vec();
        };
        candidates
            .iter()
            .filter(|key| bucket.get(key.as_str()).map_or(true, |r| r.is_expired(now)))
            .cloned()
            .collect()
    }

    pub fn failed_key_count(&self, provider: &str) -> usize {
        self.buckets.get(provider).map_or(0, |bucket| bucket.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_first_failure_creates_record() {
        let ledger = FailureLedger::new();
        let record = ledger.record_failure("brave", "k1", 429, at(0));
        assert_eq!(record, FailureRecord { failed_at: at(0), fail_count: 1, status_code: 429 });
        assert_eq!(ledger.record("brave", "k1"), Some(record));
        assert_eq!(ledger.record("tavily", "k1"), None);
    }

    #[test]
    fn test_repeat_failure_updates_record() {
        let ledger = FailureLedger::new();
        ledger.record_failure("brave", "k1", 429, at(0));
        let record = ledger.record_failure("brave", "k1", 500, at(10));
        assert_eq!(record.fail_count, 2);
        assert_eq!(record.status_code, 500);
        assert_eq!(record.failed_at, at(10));
    }

    #[test]
    fn test_availability_boundary_is_strict() {
        let ledger = FailureLedger::new();
        ledger.record_failure("brave", "k1", 429, at(0));

        assert!(!ledger.is_available("brave", "k1", at(1)));
        assert!(!ledger.is_available("brave", "k1", at(3600)));
        assert!(ledger.is_available("brave", "k1", at(3601)));
        assert!(ledger.is_available("brave", "k2", at(1)));
    }

    #[test]
    fn test_filter_available() {
        let ledger = FailureLedger::new();
        ledger.record_failure("brave", "k2", 401, at(0));
        let candidates = vec!["k1".to_string(), "k2".to_string(), "k3".to_string()];

        assert_eq!(ledger.filter_available("brave", &candidates, at(60)), vec!["k1", "k3"]);
        assert_eq!(ledger.filter_available("tavily", &candidates, at(60)), candidates);
        assert_eq!(ledger.failed_key_count("brave"), 1);
    }
}

// src/storage/key_state.rs

use crate::core::cooldown::cooldown_for;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Most recent failure observed for one key.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct FailureRecord {
    pub failed_at: DateTime<Utc>,
    pub fail_count: u32,
    pub status_code: u16,
}

impl FailureRecord {
    pub fn new(status_code: u16, now: DateTime<Utc>) -> Self {
        Self {
            failed_at: now,
            fail_count: 1,
            status_code,
        }
    }

    /// Records another failure. The count never resets.
    pub fn record_failure(&mut self, status_code: u16, now: DateTime<Utc>) {
        self.failed_at = now;
        self.status_code = status_code;
        self.fail_count = self.fail_count.saturating_add(1);
    }

    pub fn cooldown(&self) -> Duration {
        cooldown_for(self.status_code)
    }

    /// True once strictly more than the cooldown has passed since the failure.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match (now - self.failed_at).to_std() {
            Ok(elapsed) => elapsed > self.cooldown(),
            // Failure stamped in the future relative to `now`.
            Err(_) => false,
        }
    }

    /// Time left before the key is eligible again, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - self.failed_at).to_std().unwrap_or_default();
        self.cooldown().saturating_sub(elapsed)
    }
}

/// Point-in-time view of one registered key, for inspection and the CLI.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct KeyStatus {
    pub key_preview: String,
    pub provider: String,
    pub available: bool,
    pub cooldown_remaining_secs: u64,
    pub failure: Option<FailureRecord>,
}

//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use search_key_rotation::{KeySelector, ManualClock};
use std::sync::Arc;

pub const SEED: u64 = 0x5eed;

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

/// Seeded selector on a manual clock, so cooldowns can be stepped through.
pub fn test_selector() -> (KeySelector, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let selector = KeySelector::new()
        .with_seed(SEED)
        .with_clock(clock.clone());
    (selector, clock)
}

/// Runs `select` many times and returns every distinct result.
pub fn distinct_picks<F>(trials: usize, mut select: F) -> std::collections::BTreeSet<String>
where
    F: FnMut() -> String,
{
    (0..trials).map(|_| select()).collect()
}

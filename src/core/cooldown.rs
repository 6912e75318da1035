// src/core/cooldown.rs

//! Maps the HTTP status code that caused a key failure to the time the key
//! stays out of rotation.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Quota exhausted for the billing period (used by some search vendors).
pub const STATUS_QUOTA_EXHAUSTED: u16 = 432;

/// Returns the cooldown window for a failure with the given status code.
///
/// Explicit codes are matched before the generic 4xx/5xx ranges. Anything
/// outside those ranges, including `0` for "unknown", gets one hour.
pub fn cooldown_for(status_code: u16) -> Duration {
    let secs = match status_code {
        STATUS_QUOTA_EXHAUSTED => 7 * DAY,
        429 => HOUR,
        401 | 403 => DAY,
        400..=499 => 2 * HOUR,
        500..=599 => 30 * MINUTE,
        _ => HOUR,
    };
    Duration::from_secs(secs)
}

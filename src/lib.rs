// src/lib.rs

//! Client-side API key rotation for search provider integrations.
//!
//! A [`KeySelector`] picks one credential per outbound call from a pool of
//! keys grouped by provider, skipping keys that recently failed until a
//! status-code dependent cooldown has passed.

// --- Modules ---
pub mod clock;
pub mod config;
pub mod core;
pub mod error;
pub mod metrics;
pub mod storage;

// Re-exports of the types callers need
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use crate::core::{cooldown_for, KeyInput, KeySelector};
pub use error::{AppError, Result};
pub use storage::{FailureLedger, FailureRecord, KeyRegistry, KeyStatus};

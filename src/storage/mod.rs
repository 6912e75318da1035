// src/storage/mod.rs

pub mod key_state;
pub mod ledger;
pub mod registry;

pub use key_state::{FailureRecord, KeyStatus};
pub use ledger::FailureLedger;
pub use registry::{preview_key, split_keys, KeyRegistry};

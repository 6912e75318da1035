// src/core/mod.rs

pub mod cooldown;
pub mod key_rotation;

pub use cooldown::cooldown_for;
pub use key_rotation::{KeyInput, KeySelector};

// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "search-keys",
    version,
    about = "Pick search API keys with failure-aware rotation",
    long_about = "Loads provider key pools from configuration and selects keys the way the search integration does: rotating across a provider's keys and skipping keys that are cooling down after a failed call."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "SEARCH_KEYS_CONFIG", default_value = "search-keys.yaml")]
    pub config: PathBuf,

    /// Log level filter, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "SEARCH_KEYS_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration and print a summary
    Check,

    /// Select a key, optionally after recording failures
    Select {
        /// Record a failure before selecting, as KEY=STATUS (repeatable)
        #[arg(short, long = "fail", value_name = "KEY=STATUS", value_parser = parse_failure)]
        failures: Vec<(String, u16)>,

        /// One comma-separated key string, or several keys
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<String>,
    },

    /// Run concurrent selections with random failures and print key states
    Simulate {
        /// Number of concurrent workers
        #[arg(short, long, default_value = "8")]
        workers: usize,

        /// Selections per worker
        #[arg(short, long, default_value = "100")]
        rounds: usize,

        /// Probability that a selected key's call fails, between 0 and 1
        #[arg(short, long, default_value = "0.1", value_parser = parse_probability)]
        failure_rate: f64,
    },
}

/// Parses `KEY=STATUS`. The status is taken after the last `=`.
pub fn parse_failure(raw: &str) -> Result<(String, u16), String> {
    let (key, status) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected KEY=STATUS, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    let status = status
        .trim()
        .parse::<u16>()
        .map_err(|e| format!("invalid status code '{status}': {e}"))?;
    Ok((key.trim().to_string(), status))
}

/// Parses a probability in `[0, 1]`. NaN and infinities are rejected.
pub fn parse_probability(raw: &str) -> Result<f64, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid probability '{raw}': {e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("probability must be between 0 and 1, got '{raw}'"))
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

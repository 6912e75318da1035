// src/error.rs

use thiserror::Error;

/// Errors raised by configuration loading, input conversion and the binary.
///
/// Selection itself never surfaces these to callers: internal failures are
/// turned into the unfiltered random fallback inside [`crate::KeySelector`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration validation failed: {message}")]
    Config {
        message: String,
        field: Option<String>,
    },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {message}")]
    ConfigParse {
        message: String,
        line: Option<usize>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported key input: expected a string or a list of strings, got {kind}")]
    InvalidKeyInput { kind: &'static str },

    #[error("No candidate keys to choose from")]
    NoCandidates,

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl AppError {
    pub fn config_validation(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Config {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            line: err.location().map(|loc| loc.line()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

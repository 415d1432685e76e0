//! Error types for configuration loading.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading a [`crate::DumpConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config parsed but holds unusable values.
    #[error("invalid config: {0}")]
    Invalid(String),
}

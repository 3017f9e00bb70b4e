//! Configuration error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Config file is not valid JSON or has the wrong shape.
    #[error("invalid config file {path}: {message}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A setting has an unusable value.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Create an IO error with path context.
    #[must_use]
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create a JSON error with path context.
    #[must_use]
    pub fn json(path: &Path, err: &sonic_rs::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for gemstage_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

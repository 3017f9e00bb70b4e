//! Error types for gemstage operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gemstage.
#[derive(Error, Debug)]
pub enum Error {
    /// Input is neither an existing file nor a well-formed gem name.
    #[error("'{identifier}' is not a file and does not appear to be the name of a rubygem")]
    InvalidIdentifier {
        /// The rejected identifier.
        identifier: String,
    },

    /// Version constraint could not be parsed.
    #[error("invalid version constraint '{constraint}': {reason}")]
    InvalidConstraint {
        /// Raw constraint.
        constraint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Registry has no version matching the request.
    #[error("no gem found. name: {identifier}, version: {constraint}, errors: {errors}")]
    NotFound {
        /// Requested gem name.
        identifier: String,
        /// Requested constraint (`any` when absent).
        constraint: String,
        /// Diagnostics collected from the registry sources.
        errors: String,
    },

    /// Transport or lookup failure while talking to the registry.
    #[error("registry error: {0}")]
    Registry(String),

    /// Downloaded artifact does not match the published checksum.
    #[error("checksum mismatch for '{name}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Artifact name.
        name: String,
        /// Expected hash.
        expected: String,
        /// Actual hash.
        actual: String,
    },

    /// Artifact cannot be opened or its descriptor cannot be parsed.
    #[error("unreadable gem archive {path}: {message}")]
    UnreadableArchive {
        /// Artifact path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// External installer exited unsuccessfully.
    #[error("installing {artifact} failed (exit code {code}): {stderr}")]
    InstallFailed {
        /// Artifact being installed.
        artifact: PathBuf,
        /// Exit code, -1 when terminated by a signal or never spawned.
        code: i32,
        /// Captured stderr.
        stderr: String,
    },

    /// Archiving or compression failed.
    #[error("archiving {path} failed: {message}")]
    ArchiveFailed {
        /// Target archive path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] sonic_rs::Error),

    /// IO error.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an unreadable-archive error.
    #[must_use]
    pub fn unreadable(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::UnreadableArchive {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an archive failure.
    #[must_use]
    pub fn archive_failed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ArchiveFailed {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for gemstage operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Platform-specific error types.

use thiserror::Error;

/// Platform operation errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Process spawn failed.
    #[error("failed to spawn process '{command}': {reason}")]
    SpawnFailed {
        /// Command that failed.
        command: String,
        /// Failure reason.
        reason: String,
    },

    /// Process exited with non-zero status.
    #[error("process exited with code {code}: {stderr}")]
    ProcessFailed {
        /// Exit code.
        code: i32,
        /// Standard error output.
        stderr: String,
    },
}

impl PlatformError {
    /// Create a spawn failed error.
    #[must_use]
    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Exit code carried by the error, -1 when the process never ran.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ProcessFailed { code, .. } => *code,
            Self::SpawnFailed { .. } => -1,
        }
    }
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let err = PlatformError::ProcessFailed {
            code: 2,
            stderr: "boom".into(),
        };
        assert_eq!(err.exit_code(), 2);
        let err = PlatformError::spawn_failed("gem", "not found");
        assert_eq!(err.exit_code(), -1);
        assert!(err.to_string().contains("'gem'"));
    }
}

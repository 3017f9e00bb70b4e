//! Repository-specific error types.

use gemstage_core::Error as CoreError;
use thiserror::Error;

/// Repository-specific errors.
///
/// In strict mode these are collected per source instead of aborting the
/// query, so they must stay cheap to clone and render.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Network error during fetch.
    #[error("{}", network_message(url, message, *status))]
    Network {
        /// URL that failed.
        url: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Response body could not be decoded.
    #[error("failed to parse response from {url}: {message}")]
    Parse {
        /// URL of the response.
        url: String,
        /// Error message.
        message: String,
    },

    /// A request URL could not be built.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The invalid URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Request timed out.
    #[error("request to {url} timed out")]
    Timeout {
        /// URL that timed out.
        url: String,
    },

    /// HTTP client could not be configured.
    #[error("invalid registry configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

fn network_message(url: &str, message: &str, status: Option<u16>) -> String {
    status.map_or_else(
        || format!("network error fetching {url}: {message}"),
        |code| format!("HTTP {code} from {url}: {message}"),
    )
}

impl RepositoryError {
    /// Classify a reqwest failure for `url`.
    #[must_use]
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: err.to_string(),
                status: err.status().map(|s| s.as_u16()),
            }
        }
    }
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        Self::Registry(err.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_display() {
        let err = RepositoryError::Network {
            url: "https://rubygems.org/api/v1/versions/rake.json".into(),
            message: "Service Unavailable".into(),
            status: Some(503),
        };
        assert!(err.to_string().starts_with("HTTP 503 from https://rubygems.org"));

        let err = RepositoryError::Network {
            url: "https://example.com".into(),
            message: "connection refused".into(),
            status: None,
        };
        assert!(err.to_string().contains("network error"));
    }

    #[test]
    fn converts_to_registry_error() {
        let err: CoreError = RepositoryError::Timeout {
            url: "https://example.com".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Registry(ref m) if m.contains("timed out")));
    }
}

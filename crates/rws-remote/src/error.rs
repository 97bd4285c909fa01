//! Error types for remote operations and HTTP response classification.

use rws_types::ErrorKind;
use thiserror::Error;

/// Errors that can occur while talking to the remote store.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Repository, branch, ref, or object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote reported zero remaining requests in the current window.
    #[error("API rate limit exceeded; add a token or wait until the limit resets")]
    RateLimited {
        /// Unix timestamp at which the window resets, when reported.
        reset_at: Option<u64>,
    },

    /// The credential was missing, invalid, or lacks permission.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// The branch no longer points at the expected parent commit.
    #[error("branch {branch} moved since its head was read; refresh and retry")]
    StaleParent { branch: String },

    /// Transport failure: connect, TLS, timeout, or no response.
    #[error("network error: {0}")]
    Network(String),

    /// Any other non-success response.
    #[error("remote request failed ({status}): {message}")]
    Api { status: u16, message: String },

    /// The path exists but its content cannot be returned as text: a
    /// directory, a file over the host's inline limit, or binary data.
    #[error("content unavailable: {0}")]
    ContentUnavailable(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Client construction or URL building failed.
    #[error("invalid remote configuration: {0}")]
    Config(String),

    /// Local bookkeeping failure inside a backend.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RemoteError {
    /// Map onto the shared failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::AuthRejected(_) => ErrorKind::AuthRejected,
            Self::StaleParent { .. } => ErrorKind::StaleParent,
            Self::Network(_) => ErrorKind::Network,
            Self::ContentUnavailable(_) => ErrorKind::ContentUnavailable,
            Self::Api { status, .. } if *status >= 500 => ErrorKind::Network,
            Self::Api { status: 400 | 422, .. } | Self::Config(_) => ErrorKind::Validation,
            Self::Api { .. } | Self::Decode(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if e.is_builder() {
            Self::Config(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Convenience alias for remote results.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Classify a non-success response.
///
/// A remaining-requests header of exactly `0` wins over the status code:
/// hosts report exhausted quotas as 403 or 429, and those must not be
/// mistaken for permission failures.
pub fn classify_status(
    status: u16,
    rate_remaining: Option<&str>,
    rate_reset: Option<&str>,
    message: &str,
    target: &str,
) -> RemoteError {
    if rate_remaining.map(str::trim) == Some("0") {
        return RemoteError::RateLimited {
            reset_at: rate_reset.and_then(|r| r.trim().parse().ok()),
        };
    }
    match status {
        401 | 403 => RemoteError::AuthRejected(non_empty(message, target)),
        404 => RemoteError::NotFound(target.to_string()),
        429 => RemoteError::RateLimited { reset_at: None },
        _ => RemoteError::Api {
            status,
            message: non_empty(message, target),
        },
    }
}

fn non_empty(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

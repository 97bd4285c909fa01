use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid repository reference: {0}")]
    InvalidRepoRef(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl TypeError {
    /// Every malformed input is a validation failure.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// The failure taxonomy shared by every collaborator-facing operation.
///
/// Each crate's error type maps onto exactly one kind, so callers can decide
/// whether to retry, re-authenticate, or fix their input without matching on
/// crate-specific variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Repository, branch, or file absent.
    NotFound,
    /// The remote reported zero remaining requests.
    RateLimited,
    /// Missing or rejected credential.
    AuthRejected,
    /// The branch moved between reading the parent and updating the ref.
    StaleParent,
    /// Bad caller input (empty message, malformed reference, empty name).
    Validation,
    /// The content needed for a rename or delete could not be resolved.
    ContentUnavailable,
    /// Transport failure or timeout.
    Network,
    /// Malformed remote response or broken local invariant.
    Internal,
}

impl ErrorKind {
    /// How loudly a failure of this kind should be shown.
    pub fn severity(&self) -> Severity {
        match self {
            Self::RateLimited | Self::StaleParent | Self::Validation => Severity::Warning,
            Self::NotFound
            | Self::AuthRejected
            | Self::ContentUnavailable
            | Self::Network
            | Self::Internal => Severity::Error,
        }
    }

    /// Whether the same call may succeed later without any caller change.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Network)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::RateLimited => "rate limited",
            Self::AuthRejected => "auth rejected",
            Self::StaleParent => "stale parent",
            Self::Validation => "validation",
            Self::ContentUnavailable => "content unavailable",
            Self::Network => "network",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Severity attached to user-visible messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_and_input_errors_are_warnings() {
        assert_eq!(ErrorKind::StaleParent.severity(), Severity::Warning);
        assert_eq!(ErrorKind::Validation.severity(), Severity::Warning);
        assert_eq!(ErrorKind::RateLimited.severity(), Severity::Warning);
        assert_eq!(ErrorKind::Network.severity(), Severity::Error);
        assert_eq!(ErrorKind::AuthRejected.severity(), Severity::Error);
    }

    #[test]
    fn transient_kinds() {
        assert!(ErrorKind::Network.is_transient());
        assert!(ErrorKind::RateLimited.is_transient());
        assert!(!ErrorKind::StaleParent.is_transient());
        assert!(!ErrorKind::Validation.is_transient());
    }

    #[test]
    fn type_errors_are_validation() {
        let err = TypeError::InvalidRepoRef("nope".into());
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn severity_orders_by_loudness() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}

//! Error types for the index crate.

use rws_remote::RemoteError;
use rws_types::{ErrorKind, TypeError};

/// Errors that can occur while reading or changing workspace state.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// No leaf or directory exists at the path, remotely or pending.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// The branch resolved to a tree with no entries.
    #[error("repository {repo} is empty on branch {branch}")]
    EmptyTree { repo: String, branch: String },

    /// The target of a create or rename is already visible.
    #[error("path already exists: {0}")]
    AlreadyExists(String),

    /// A file cannot take the place of a visible directory.
    #[error("path is a directory: {0}")]
    IsDirectory(String),

    /// A file cannot be placed below another visible file.
    #[error("cannot place {path} below file {file}")]
    UnderFile { path: String, file: String },

    /// The path has no pending change, so there is nothing to stage.
    #[error("no pending change at path: {0}")]
    NotPending(String),

    /// A rename would move a directory below itself.
    #[error("cannot move {from} into itself ({to})")]
    IntoItself { from: String, to: String },

    /// The live content of a path could not be resolved.
    #[error("content unavailable for path: {0}")]
    ContentUnavailable(String),

    /// An invalid path was provided.
    #[error(transparent)]
    InvalidPath(#[from] TypeError),

    /// Remote operation failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl IndexError {
    /// Map onto the shared failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotFound(_) | Self::EmptyTree { .. } => ErrorKind::NotFound,
            Self::AlreadyExists(_)
            | Self::NotPending(_)
            | Self::IntoItself { .. }
            | Self::IsDirectory(_)
            | Self::UnderFile { .. }
            | Self::InvalidPath(_) => ErrorKind::Validation,
            Self::ContentUnavailable(_) => ErrorKind::ContentUnavailable,
            Self::Remote(e) => e.kind(),
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            IndexError::EmptyTree {
                repo: "o/r".into(),
                branch: "main".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(IndexError::AlreadyExists("a".into()).kind(), ErrorKind::Validation);
        assert_eq!(IndexError::IsDirectory("src".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            IndexError::ContentUnavailable("a".into()).kind(),
            ErrorKind::ContentUnavailable
        );
        assert_eq!(
            IndexError::from(RemoteError::RateLimited { reset_at: None }).kind(),
            ErrorKind::RateLimited
        );
    }
}

use rws_commit::CommitError;
use rws_index::IndexError;
use rws_remote::RemoteError;
use rws_types::{ErrorKind, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    InvalidInput(#[from] TypeError),

    #[error("name cannot be empty")]
    EmptyName,

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("no open buffer for {0}")]
    BufferNotOpen(String),
}

impl SdkError {
    /// Map onto the shared failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Index(e) => e.kind(),
            Self::Commit(e) => e.kind(),
            Self::Remote(e) => e.kind(),
            Self::InvalidInput(e) => e.kind(),
            Self::EmptyName | Self::NotADirectory(_) | Self::BufferNotOpen(_) => {
                ErrorKind::Validation
            }
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

//! Error types for the commit pipeline.

use rws_remote::RemoteError;
use rws_types::ErrorKind;
use thiserror::Error;

use crate::stage::PipelineStage;

/// Errors that can occur while publishing a commit.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The message is empty or whitespace.
    #[error("commit message cannot be empty")]
    EmptyMessage,

    /// Nothing is staged.
    #[error("no staged changes to commit")]
    EmptyStaging,

    /// Another run of the same pipeline has not finished.
    #[error("a commit is already in progress")]
    InFlight,

    /// A staged path has no pending change behind it.
    #[error("staged path has no pending change: {0}")]
    MissingChange(String),

    /// A remote call failed; the branch was not moved.
    #[error("commit failed at {stage}: {source}")]
    Remote {
        stage: PipelineStage,
        #[source]
        source: RemoteError,
    },
}

impl CommitError {
    pub(crate) fn at(stage: PipelineStage) -> impl FnOnce(RemoteError) -> Self {
        move |source| Self::Remote { stage, source }
    }

    /// Map onto the shared failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyMessage | Self::EmptyStaging | Self::InFlight | Self::MissingChange(_) => {
                ErrorKind::Validation
            }
            Self::Remote { source, .. } => source.kind(),
        }
    }

    /// Stage at which a remote call failed.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Remote { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type CommitResult<T> = Result<T, CommitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failure_keeps_its_kind() {
        let err = CommitError::at(PipelineStage::FetchParent)(RemoteError::NotFound("main".into()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.stage(), Some(PipelineStage::FetchParent));
        assert_eq!(err.to_string(), "commit failed at fetch parent: not found: main");
    }

    #[test]
    fn local_rejections_are_validation() {
        assert_eq!(CommitError::EmptyMessage.kind(), ErrorKind::Validation);
        assert_eq!(CommitError::InFlight.kind(), ErrorKind::Validation);
        assert_eq!(CommitError::EmptyStaging.stage(), None);
    }
}

use rws_index::{Overlay, OverlayEntry, RemoteTreeIndex, StagingSet};
use rws_types::{FileMode, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{CommitError, CommitResult};

/// One leaf to publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StagedChange {
    /// Write `content` at `path` with `mode`.
    Upsert {
        path: String,
        content: String,
        mode: FileMode,
    },
    /// Remove `path` from the base tree.
    Delete { path: String },
}

impl StagedChange {
    pub fn path(&self) -> &str {
        match self {
            Self::Upsert { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// A message and the staged changes to publish with it.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub message: String,
    pub changes: Vec<StagedChange>,
}

impl CommitRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changes: Vec::new(),
        }
    }

    pub fn with_upsert(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.with_upsert_mode(path, content, FileMode::Regular)
    }

    pub fn with_upsert_mode(
        mut self,
        path: impl Into<String>,
        content: impl Into<String>,
        mode: FileMode,
    ) -> Self {
        self.changes.push(StagedChange::Upsert {
            path: path.into(),
            content: content.into(),
            mode,
        });
        self
    }

    pub fn with_delete(mut self, path: impl Into<String>) -> Self {
        self.changes.push(StagedChange::Delete { path: path.into() });
        self
    }

    /// Collect the overlay entry of every staged path.
    ///
    /// Edited remote files keep the mode they have in `index`; new files
    /// are regular.
    pub fn from_staged(
        message: impl Into<String>,
        index: &RemoteTreeIndex,
        overlay: &Overlay,
        staging: &StagingSet,
    ) -> CommitResult<Self> {
        let changes = staging
            .iter()
            .map(|path| match overlay.get(path) {
                Some(OverlayEntry::Edited(content)) => Ok(StagedChange::Upsert {
                    path: path.to_string(),
                    content: content.clone(),
                    mode: index.file_mode(path).unwrap_or_default(),
                }),
                Some(OverlayEntry::Deleted) => Ok(StagedChange::Delete {
                    path: path.to_string(),
                }),
                None => Err(CommitError::MissingChange(path.to_string())),
            })
            .collect::<CommitResult<Vec<_>>>()?;
        Ok(Self {
            message: message.into(),
            changes,
        })
    }

    /// Reject an empty or whitespace message and an empty change list.
    pub fn validate(&self) -> CommitResult<()> {
        if self.message.trim().is_empty() {
            return Err(CommitError::EmptyMessage);
        }
        if self.changes.is_empty() {
            return Err(CommitError::EmptyStaging);
        }
        Ok(())
    }

    /// Paths touched, in request order.
    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter().map(StagedChange::path).collect()
    }

    /// Number of blobs a run will create.
    pub fn upsert_count(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, StagedChange::Upsert { .. }))
            .count()
    }
}

/// Ids produced by a successful commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// New branch head.
    pub commit_id: ObjectId,
    /// Root tree of the new commit.
    pub tree_id: ObjectId,
    /// Branch head the commit was built on.
    pub parent_id: ObjectId,
    pub blobs_created: usize,
    /// Every published path, in path order.
    pub paths: Vec<String>,
}

impl CommitReceipt {
    /// Drop the published paths from the overlay and the staging set,
    /// leaving every other pending change where it is.
    pub fn prune(&self, overlay: &mut Overlay, staging: &mut StagingSet) {
        overlay.clear_committed(self.paths.iter().map(String::as_str));
        staging.remove_all(self.paths.iter().map(String::as_str));
    }
}

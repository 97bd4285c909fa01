//! Pending-change status types.
//!
//! These types describe the overlay relative to the remote tree, split by
//! whether each change is selected for the next commit.

use serde::{Deserialize, Serialize};

use crate::overlay::{Overlay, OverlayEntry};
use crate::staging::StagingSet;
use crate::tree_index::RemoteTreeIndex;

/// Every pending change, staged or not.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    /// Changes selected for the next commit.
    pub staged: Vec<StatusEntry>,
    /// Changes held locally but not selected.
    pub unstaged: Vec<StatusEntry>,
}

impl ChangeStatus {
    /// Create an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the overlay against the remote tree.
    pub fn compute(index: &RemoteTreeIndex, overlay: &Overlay, staging: &StagingSet) -> Self {
        let mut status = Self::new();
        for (path, entry) in overlay.iter() {
            let kind = match entry {
                OverlayEntry::Deleted => FileStatus::Deleted,
                OverlayEntry::Edited(_) if index.contains_file(path) => FileStatus::Modified,
                OverlayEntry::Edited(_) => FileStatus::New,
            };
            let line = StatusEntry::new(path, kind);
            if staging.contains(path) {
                status.staged.push(line);
            } else {
                status.unstaged.push(line);
            }
        }
        status
    }

    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }

    /// Returns `true` if there are any staged changes.
    pub fn has_staged_changes(&self) -> bool {
        !self.staged.is_empty()
    }
}

/// A single status entry representing a file change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The file path relative to the repository root.
    pub path: String,
    /// The kind of change.
    pub status: FileStatus,
}

impl StatusEntry {
    /// Create a new status entry.
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// The kind of file change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// A file that does not exist remotely.
    New,
    /// A remote file with pending content.
    Modified,
    /// A remote file that will be removed.
    Deleted,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rws_remote::InMemoryRemote;
    use rws_types::RepoRef;

    #[test]
    fn empty_status_is_clean() {
        let status = ChangeStatus::new();
        assert!(status.is_clean());
        assert!(!status.has_staged_changes());
    }

    #[tokio::test]
    async fn compute_classifies_and_splits() {
        let repo = RepoRef::new("octo", "demo").unwrap();
        let remote = InMemoryRemote::new();
        remote
            .seed(&repo, "main", &[("a.txt", "1"), ("b.txt", "2")])
            .unwrap();
        let index = RemoteTreeIndex::load(&remote, repo, "main").await.unwrap();

        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "a.txt", "changed").unwrap();
        overlay.record_delete(&index, "b.txt").unwrap();
        overlay.record_edit(&index, "c.txt", "new").unwrap();
        let mut staging = StagingSet::new();
        staging.stage(&overlay, "a.txt").unwrap();
        staging.stage(&overlay, "c.txt").unwrap();

        let status = ChangeStatus::compute(&index, &overlay, &staging);
        assert_eq!(
            status.staged,
            vec![
                StatusEntry::new("a.txt", FileStatus::Modified),
                StatusEntry::new("c.txt", FileStatus::New),
            ]
        );
        assert_eq!(status.unstaged, vec![StatusEntry::new("b.txt", FileStatus::Deleted)]);
        assert!(status.has_staged_changes());
    }
}

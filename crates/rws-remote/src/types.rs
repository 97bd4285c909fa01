use serde::{Deserialize, Serialize};
use rws_types::{FileMode, ObjectId, RepositoryEntry};

/// One entry of a sparse tree submission.
///
/// `object_id == None` removes the path from the base tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeChange {
    pub path: String,
    pub mode: FileMode,
    pub object_id: Option<ObjectId>,
}

impl TreeChange {
    /// Point `path` at an existing blob with the given mode.
    pub fn upsert(path: impl Into<String>, object_id: ObjectId, mode: FileMode) -> Self {
        Self {
            path: path.into(),
            mode,
            object_id: Some(object_id),
        }
    }

    /// Remove `path` from the base tree.
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: FileMode::Regular,
            object_id: None,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.object_id.is_none()
    }
}

/// Result of a recursive tree fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeListing {
    /// Id of the root tree.
    pub tree_id: ObjectId,
    /// Every entry below the root, files and directories, in path order.
    pub entries: Vec<RepositoryEntry>,
    /// The host cut the listing short.
    pub truncated: bool,
}

/// The remote operations, used for call recording and fault injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    FetchTree,
    FetchContents,
    ResolveRef,
    CommitTree,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

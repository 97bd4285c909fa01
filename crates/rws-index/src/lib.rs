//! Local workspace state for remote workspaces.
//!
//! Holds the last-fetched remote tree, the sparse overlay of unpublished
//! edits and deletions on top of it, the subset of that overlay selected for
//! the next commit, and the hierarchical view derived from both.
//!
//! # Key Types
//!
//! - [`RemoteTreeIndex`] -- Authoritative flat snapshot of one branch
//! - [`Overlay`] -- Pending edits and tombstones, keyed by path
//! - [`StagingSet`] -- Paths selected for the next commit
//! - [`project`] / [`DirectoryTree`] -- Folder/file view of index and overlay
//! - [`ChangeStatus`] -- Pending changes split into staged and unstaged

pub mod error;
pub mod overlay;
pub mod projector;
pub mod staging;
pub mod status;
pub mod tree_index;

pub use error::{IndexError, IndexResult};
pub use overlay::{Overlay, OverlayEntry, RenameMove};
pub use projector::{project, DirectoryNode, DirectoryTree, NodeFlags, TreeLine};
pub use staging::StagingSet;
pub use status::{ChangeStatus, FileStatus, StatusEntry};
pub use tree_index::RemoteTreeIndex;

//! High-level SDK for remote workspaces.
//!
//! Browse, edit, stage and commit a repository hosted behind the Git Data
//! API without cloning it. [`Workspace`] is the single entry point a UI
//! drives: it owns the remote tree snapshot, the overlay of pending
//! changes, the staging set and the open buffers, and reports each outcome
//! as a [`Notification`].

pub mod buffer;
pub mod diff;
pub mod error;
pub mod notify;
pub mod services;
pub mod workspace;

pub use buffer::{BufferSet, OpenBuffer};
pub use diff::{diff_text, DiffHunk, DiffLine, FileDiff};
pub use error::{SdkError, SdkResult};
pub use notify::Notification;
pub use services::{
    AutoConfirm, ChangeCallback, EditorService, NoopEditor, ScriptedEditor, ScriptedPrompt,
    UserPrompt,
};
pub use workspace::{Services, Workspace, FOLDER_PLACEHOLDER};

// Re-export key types
pub use rws_commit::{CommitError, CommitReceipt, PipelineStage};
pub use rws_index::{
    ChangeStatus, DirectoryNode, DirectoryTree, FileStatus, NodeFlags, StatusEntry, TreeLine,
};
pub use rws_remote::{GithubRemote, InMemoryRemote, RemoteConfig, RemoteError, RemoteStore};
pub use rws_types::{EntryKind, ErrorKind, FileMode, ObjectId, RepoRef, Severity};

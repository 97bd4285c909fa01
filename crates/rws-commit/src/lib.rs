//! Publishing staged changes to a remote branch.
//!
//! A commit is a fixed sequence of remote calls: resolve the branch head,
//! read its tree, upload one blob per edited file, submit a sparse tree on
//! top of the base tree, create the commit, then fast-forward the branch.
//! Nothing before the final ref update is visible to other readers, so a
//! failure at any step leaves the branch where it was.
//!
//! # Key Types
//!
//! - [`CommitPipeline`] -- Runs the sequence, one run at a time
//! - [`CommitRequest`] -- Message plus the staged changes to publish
//! - [`CommitReceipt`] -- Ids produced by a successful run
//! - [`PipelineStage`] -- Where a run is, or where it failed

pub mod error;
pub mod pipeline;
pub mod request;
pub mod stage;

pub use error::{CommitError, CommitResult};
pub use pipeline::CommitPipeline;
pub use request::{CommitReceipt, CommitRequest, StagedChange};
pub use stage::PipelineStage;

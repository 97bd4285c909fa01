//! Remote store access for remote workspaces.
//!
//! The remote is a content-addressed object store with one mutable pointer
//! per branch, reached through the Git Data API. This crate defines the
//! [`RemoteStore`] interface the workspace and commit pipeline are written
//! against, and two backends:
//!
//! - [`GithubRemote`] -- HTTPS/JSON client for GitHub-compatible hosts
//! - [`InMemoryRemote`] -- content-addressed store held in memory, with
//!   call recording and fault injection for tests and embedding
//!
//! Transport failures are classified into the shared error taxonomy here;
//! nothing in this crate retries.

pub mod config;
pub mod error;
pub mod github;
pub mod hasher;
pub mod memory;
pub mod traits;
pub mod types;

pub use config::RemoteConfig;
pub use error::{classify_status, RemoteError, RemoteResult};
pub use github::GithubRemote;
pub use hasher::ContentHasher;
pub use memory::InMemoryRemote;
pub use traits::RemoteStore;
pub use types::{RemoteOp, TreeChange, TreeListing};
pub use rws_types::FileMode;

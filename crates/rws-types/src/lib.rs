//! Foundation types for remote workspaces.
//!
//! This crate provides the identity and structural types shared by every
//! other `rws` crate: remote object identifiers, the entries of a fetched
//! repository tree, repository references, path helpers, and the error
//! taxonomy every failure is classified into.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Content-addressed identifier of a remote object
//! - [`RepositoryEntry`] — One entry of a flat remote tree listing
//! - [`EntryKind`] — File or directory
//! - [`FileMode`] — Git mode carried by each entry
//! - [`RepoRef`] — `owner/repo` pair parsed from user input
//! - [`ErrorKind`] / [`Severity`] — Classification surfaced to collaborators

pub mod entry;
pub mod error;
pub mod object;
pub mod path;
pub mod repo;

pub use entry::{EntryKind, FileMode, RepositoryEntry};
pub use error::{ErrorKind, Severity, TypeError};
pub use object::ObjectId;
pub use repo::RepoRef;

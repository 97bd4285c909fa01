//! The [`RemoteStore`] trait defining the remote object-store interface.

use async_trait::async_trait;
use rws_types::{ObjectId, RepoRef};

use crate::error::RemoteResult;
use crate::types::{TreeChange, TreeListing};

/// Access to one remote content-addressed store.
///
/// Every method is a single remote round-trip and a suspension point; none
/// of them retries. Objects created by the write methods are immutable and
/// unreferenced until [`update_ref`](RemoteStore::update_ref) moves a branch
/// to a commit that reaches them.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Recursive listing of the tree at the head of `branch`.
    async fn fetch_tree(&self, repo: &RepoRef, branch: &str) -> RemoteResult<TreeListing>;

    /// Content of the file at `path` on `branch`.
    ///
    /// Returns `Ok(None)` if the file does not exist, and
    /// [`RemoteError::ContentUnavailable`](crate::RemoteError::ContentUnavailable)
    /// if the path names a directory or content that is not inline UTF-8 text.
    async fn fetch_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> RemoteResult<Option<String>>;

    /// Commit id the branch currently points at.
    async fn resolve_ref(&self, repo: &RepoRef, branch: &str) -> RemoteResult<ObjectId>;

    /// Root tree id referenced by a commit.
    async fn commit_tree(&self, repo: &RepoRef, commit: &ObjectId) -> RemoteResult<ObjectId>;

    /// Store file content and return its blob id.
    async fn create_blob(&self, repo: &RepoRef, content: &str) -> RemoteResult<ObjectId>;

    /// Apply a sparse list of changes on top of `base_tree`.
    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &ObjectId,
        changes: &[TreeChange],
    ) -> RemoteResult<ObjectId>;

    /// Create a commit with a single parent.
    async fn create_commit(
        &self,
        repo: &RepoRef,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> RemoteResult<ObjectId>;

    /// Fast-forward `branch` from `expected_parent` to `commit`.
    ///
    /// Fails with [`RemoteError::StaleParent`](crate::RemoteError::StaleParent)
    /// if the branch no longer points at `expected_parent`.
    async fn update_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        commit: &ObjectId,
        expected_parent: &ObjectId,
    ) -> RemoteResult<()>;

    /// Content of `path`, with a missing file read as empty.
    async fn read_file(&self, repo: &RepoRef, path: &str, branch: &str) -> RemoteResult<String> {
        Ok(self
            .fetch_contents(repo, path, branch)
            .await?
            .unwrap_or_default())
    }
}

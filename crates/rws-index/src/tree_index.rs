//! The last-fetched authoritative tree of one branch.

use std::collections::BTreeMap;

use rws_remote::{RemoteStore, TreeListing};
use rws_types::{path, EntryKind, FileMode, ObjectId, RepoRef, RepositoryEntry};
use tracing::{debug, info};

use crate::error::{IndexError, IndexResult};

/// Flat snapshot of every entry at the head of `(owner, repo, branch)`.
///
/// The snapshot is replaced wholesale by [`refresh`](Self::refresh); entries
/// are never patched in place, so a stale id can never survive a resync.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteTreeIndex {
    repo: RepoRef,
    branch: String,
    tree_id: ObjectId,
    entries: BTreeMap<String, RepositoryEntry>,
}

impl std::fmt::Debug for RemoteTreeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTreeIndex")
            .field("repo", &self.repo.full_name())
            .field("branch", &self.branch)
            .field("tree_id", &self.tree_id.short())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl RemoteTreeIndex {
    /// Fetch the recursive tree of `branch`.
    ///
    /// Fails with `NotFound` if the repository or branch is absent, or if the
    /// tree has no entries.
    pub async fn load<R>(remote: &R, repo: RepoRef, branch: impl Into<String>) -> IndexResult<Self>
    where
        R: RemoteStore + ?Sized,
    {
        let branch = branch.into();
        let listing = remote.fetch_tree(&repo, &branch).await?;
        let index = Self::from_listing(repo, branch, listing)?;
        info!(
            repo = %index.repo,
            branch = %index.branch,
            count = index.entries.len(),
            "loaded remote tree"
        );
        Ok(index)
    }

    /// Build an index from an already-fetched listing.
    pub fn from_listing(repo: RepoRef, branch: String, listing: TreeListing) -> IndexResult<Self> {
        if listing.entries.is_empty() {
            return Err(IndexError::EmptyTree {
                repo: repo.full_name(),
                branch,
            });
        }
        let entries = listing
            .entries
            .into_iter()
            .map(|e| (e.path.clone(), e))
            .collect();
        Ok(Self {
            repo,
            branch,
            tree_id: listing.tree_id,
            entries,
        })
    }

    /// Re-fetch the same branch and replace the snapshot.
    ///
    /// On failure the held snapshot is left untouched.
    pub async fn refresh<R>(&mut self, remote: &R) -> IndexResult<()>
    where
        R: RemoteStore + ?Sized,
    {
        let fresh = Self::load(remote, self.repo.clone(), self.branch.clone()).await?;
        debug!(
            from = self.tree_id.short(),
            to = fresh.tree_id.short(),
            "replaced remote tree"
        );
        *self = fresh;
        Ok(())
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Id of the root tree this snapshot was read from.
    pub fn tree_id(&self) -> &ObjectId {
        &self.tree_id
    }

    /// Number of entries, files and directories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry in path order.
    pub fn entries(&self) -> impl Iterator<Item = &RepositoryEntry> {
        self.entries.values()
    }

    /// Every leaf path in path order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.path.as_str())
    }

    pub fn get(&self, path: &str) -> Option<&RepositoryEntry> {
        self.entries.get(path)
    }

    /// Returns `true` if `path` is a leaf of the snapshot.
    pub fn contains_file(&self, path: &str) -> bool {
        self.entries.get(path).is_some_and(RepositoryEntry::is_file)
    }

    /// Returns `true` if `path` is a leaf whose remote blob holds exactly
    /// `content`.
    pub fn matches_content(&self, path: &str, content: &str) -> bool {
        self.entries
            .get(path)
            .is_some_and(|e| e.is_file() && e.content_id == ObjectId::git_blob(content.as_bytes()))
    }

    /// Mode of the leaf at `path`, if it is a remote file.
    pub fn file_mode(&self, path: &str) -> Option<FileMode> {
        self.entries
            .get(path)
            .filter(|e| e.is_file())
            .map(|e| e.mode)
    }

    /// Returns `true` if any entry lies below directory `dir`.
    pub fn has_descendants(&self, dir: &str) -> bool {
        self.descendants(dir).next().is_some()
    }

    /// Leaf paths below directory `dir`, in path order.
    pub fn files_under(&self, dir: &str) -> Vec<&str> {
        self.descendants(dir)
            .filter(|e| e.is_file())
            .map(|e| e.path.as_str())
            .collect()
    }

    fn descendants<'a>(&'a self, dir: &str) -> impl Iterator<Item = &'a RepositoryEntry> + 'a {
        let prefix = format!("{dir}{}", path::SEPARATOR);
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(|(_, e)| e)
    }
}

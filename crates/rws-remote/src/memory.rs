//! In-memory remote store for tests and embedding.
//!
//! [`InMemoryRemote`] implements the full [`RemoteStore`] contract with Git
//! semantics: content-addressed blobs, flat path-keyed trees, single-parent
//! commits, and branch refs that only fast-forward. It records every call
//! and supports one-shot fault injection and pausing, so commit sequences can
//! be observed and interrupted at any step.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rws_types::{path, EntryKind, FileMode, ObjectId, RepoRef, RepositoryEntry};
use tokio::sync::Notify;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::hasher::ContentHasher;
use crate::traits::RemoteStore;
use crate::types::{RemoteOp, TreeChange, TreeListing};

#[derive(Clone, Debug)]
struct CommitObject {
    tree: ObjectId,
    parent: Option<ObjectId>,
    message: String,
}

/// A file of a flat tree.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Leaf {
    blob: ObjectId,
    mode: FileMode,
}

/// Every leaf path below the root.
type Files = BTreeMap<String, Leaf>;

#[derive(Default)]
struct State {
    blobs: HashMap<ObjectId, String>,
    trees: HashMap<ObjectId, Files>,
    commits: HashMap<ObjectId, CommitObject>,
    /// Keyed by `owner/repo:branch`.
    refs: HashMap<String, ObjectId>,
    calls: Vec<RemoteOp>,
    failures: HashMap<RemoteOp, VecDeque<RemoteError>>,
    pauses: HashMap<RemoteOp, Arc<Notify>>,
}

impl State {
    fn head(&self, repo: &RepoRef, branch: &str) -> RemoteResult<ObjectId> {
        self.refs
            .get(&ref_key(repo, branch))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("{repo}@{branch}")))
    }

    fn commit(&self, id: &ObjectId) -> RemoteResult<&CommitObject> {
        self.commits
            .get(id)
            .ok_or_else(|| RemoteError::NotFound(format!("commit {id}")))
    }

    fn tree(&self, id: &ObjectId) -> RemoteResult<&Files> {
        self.trees
            .get(id)
            .ok_or_else(|| RemoteError::NotFound(format!("tree {id}")))
    }

    fn head_files(&self, repo: &RepoRef, branch: &str) -> RemoteResult<&Files> {
        let head = self.head(repo, branch)?;
        let tree = self.commit(&head)?.tree.clone();
        self.tree(&tree)
    }

    fn put_blob(&mut self, content: &str) -> ObjectId {
        let id = ObjectId::git_blob(content.as_bytes());
        self.blobs
            .entry(id.clone())
            .or_insert_with(|| content.to_string());
        id
    }

    fn put_tree(&mut self, files: Files) -> ObjectId {
        let id = tree_id(&files);
        self.trees.entry(id.clone()).or_insert(files);
        id
    }

    fn put_commit(&mut self, tree: ObjectId, parent: Option<ObjectId>, message: &str) -> ObjectId {
        let parent_str = parent.as_ref().map(|p| p.as_str()).unwrap_or("");
        let id = ContentHasher::COMMIT.hash_parts([
            tree.as_str().as_bytes(),
            parent_str.as_bytes(),
            message.as_bytes(),
        ]);
        self.commits.entry(id.clone()).or_insert(CommitObject {
            tree,
            parent,
            message: message.to_string(),
        });
        id
    }
}

/// An in-memory implementation of [`RemoteStore`].
///
/// All data lives behind a `Mutex` and is lost when the store is dropped.
/// The lock is never held across an await point.
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl InMemoryRemote {
    /// Create an empty remote with no repositories.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> RemoteResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| RemoteError::Internal(format!("lock poisoned: {e}")))
    }

    // ---------------------------------------------------------------
    // Seeding and direct manipulation (not recorded as calls)
    // ---------------------------------------------------------------

    /// Commit changes directly onto `branch`, creating the branch if needed.
    ///
    /// `Some(content)` writes a file, `None` removes it. This plays the part
    /// of any other writer on the remote and bypasses call recording.
    pub fn push(
        &self,
        repo: &RepoRef,
        branch: &str,
        changes: &[(&str, Option<&str>)],
        message: &str,
    ) -> RemoteResult<ObjectId> {
        self.rewrite(repo, branch, message, |state, files| {
            for (file_path, content) in changes {
                match content {
                    Some(content) => {
                        let blob = state.put_blob(content);
                        let mode = files.get(*file_path).map_or(FileMode::Regular, |l| l.mode);
                        files.insert((*file_path).to_string(), Leaf { blob, mode });
                    }
                    None => {
                        files.remove(*file_path);
                    }
                }
            }
            Ok(())
        })
    }

    /// Commit a mode change of an existing file onto `branch`.
    pub fn chmod(&self, repo: &RepoRef, branch: &str, file_path: &str, mode: FileMode) -> RemoteResult<ObjectId> {
        self.rewrite(repo, branch, "change mode", |_, files| {
            let leaf = files
                .get_mut(file_path)
                .ok_or_else(|| RemoteError::NotFound(file_path.to_string()))?;
            leaf.mode = mode;
            Ok(())
        })
    }

    fn rewrite<F>(&self, repo: &RepoRef, branch: &str, message: &str, apply: F) -> RemoteResult<ObjectId>
    where
        F: FnOnce(&mut State, &mut Files) -> RemoteResult<()>,
    {
        let mut state = self.lock()?;
        let parent = state.head(repo, branch).ok();
        let mut files = match &parent {
            Some(head) => {
                let tree = state.commit(head)?.tree.clone();
                state.tree(&tree)?.clone()
            }
            None => Files::new(),
        };
        apply(&mut *state, &mut files)?;
        let tree = state.put_tree(files);
        let commit = state.put_commit(tree, parent, message);
        state.refs.insert(ref_key(repo, branch), commit.clone());
        Ok(commit)
    }

    /// Seed a repository branch with files.
    pub fn seed(&self, repo: &RepoRef, branch: &str, files: &[(&str, &str)]) -> RemoteResult<ObjectId> {
        let changes: Vec<(&str, Option<&str>)> =
            files.iter().map(|(p, c)| (*p, Some(*c))).collect();
        self.push(repo, branch, &changes, "initial commit")
    }

    /// Point a new branch at the head of an existing one.
    pub fn create_branch(&self, repo: &RepoRef, branch: &str, from: &str) -> RemoteResult<()> {
        let mut state = self.lock()?;
        let head = state.head(repo, from)?;
        state.refs.insert(ref_key(repo, branch), head);
        Ok(())
    }

    /// Current head commit of a branch.
    pub fn head(&self, repo: &RepoRef, branch: &str) -> Option<ObjectId> {
        self.lock().ok()?.head(repo, branch).ok()
    }

    /// Every file at the head of `branch`, with content.
    pub fn files(&self, repo: &RepoRef, branch: &str) -> RemoteResult<BTreeMap<String, String>> {
        let state = self.lock()?;
        let files = state.head_files(repo, branch)?;
        files
            .iter()
            .map(|(p, leaf)| {
                let content = state
                    .blobs
                    .get(&leaf.blob)
                    .cloned()
                    .ok_or_else(|| RemoteError::Internal(format!("dangling blob {}", leaf.blob)))?;
                Ok((p.clone(), content))
            })
            .collect()
    }

    /// Mode of a file at the head of `branch`.
    pub fn mode_of(&self, repo: &RepoRef, branch: &str, file_path: &str) -> Option<FileMode> {
        let state = self.lock().ok()?;
        let files = state.head_files(repo, branch).ok()?;
        files.get(file_path).map(|leaf| leaf.mode)
    }

    /// Message and parent of a commit.
    pub fn commit_info(&self, id: &ObjectId) -> Option<(String, Option<ObjectId>)> {
        let state = self.lock().ok()?;
        let commit = state.commits.get(id)?;
        Some((commit.message.clone(), commit.parent.clone()))
    }

    /// Number of stored blobs.
    pub fn blob_count(&self) -> usize {
        self.lock().map(|s| s.blobs.len()).unwrap_or(0)
    }

    // ---------------------------------------------------------------
    // Call recording and fault injection
    // ---------------------------------------------------------------

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<RemoteOp> {
        self.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Number of recorded calls of one kind.
    pub fn call_count(&self, op: RemoteOp) -> usize {
        self.calls().into_iter().filter(|c| *c == op).count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.lock() {
            state.calls.clear();
        }
    }

    /// Make the next call of `op` fail with `error`.
    ///
    /// Injections queue: calling this twice fails the next two calls.
    pub fn fail_next(&self, op: RemoteOp, error: RemoteError) {
        if let Ok(mut state) = self.lock() {
            state.failures.entry(op).or_default().push_back(error);
        }
    }

    /// Hold the next call of `op` until the returned handle is notified.
    pub fn pause_next(&self, op: RemoteOp) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        if let Ok(mut state) = self.lock() {
            state.pauses.insert(op, Arc::clone(&notify));
        }
        notify
    }

    async fn enter(&self, op: RemoteOp) -> RemoteResult<()> {
        let pause = {
            let mut state = self.lock()?;
            state.calls.push(op);
            state.pauses.remove(&op)
        };
        if let Some(pause) = pause {
            debug!(?op, "paused");
            pause.notified().await;
        }
        let mut state = self.lock()?;
        if let Some(error) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            debug!(?op, %error, "injected failure");
            return Err(error);
        }
        Ok(())
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (blobs, refs) = self
            .lock()
            .map(|s| (s.blobs.len(), s.refs.len()))
            .unwrap_or_default();
        f.debug_struct("InMemoryRemote")
            .field("blobs", &blobs)
            .field("refs", &refs)
            .finish()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn fetch_tree(&self, repo: &RepoRef, branch: &str) -> RemoteResult<TreeListing> {
        self.enter(RemoteOp::FetchTree).await?;
        let state = self.lock()?;
        let head = state.head(repo, branch)?;
        let tree_id = state.commit(&head)?.tree.clone();
        let files = state.tree(&tree_id)?;
        Ok(TreeListing {
            tree_id,
            entries: list_entries(files),
            truncated: false,
        })
    }

    async fn fetch_contents(
        &self,
        repo: &RepoRef,
        file_path: &str,
        branch: &str,
    ) -> RemoteResult<Option<String>> {
        self.enter(RemoteOp::FetchContents).await?;
        let state = self.lock()?;
        let files = state.head_files(repo, branch)?;
        if files.keys().any(|p| path::is_within(p, file_path)) {
            return Err(RemoteError::ContentUnavailable(format!("{file_path}: not a file")));
        }
        Ok(files
            .get(file_path)
            .and_then(|leaf| state.blobs.get(&leaf.blob))
            .cloned())
    }

    async fn resolve_ref(&self, repo: &RepoRef, branch: &str) -> RemoteResult<ObjectId> {
        self.enter(RemoteOp::ResolveRef).await?;
        self.lock()?.head(repo, branch)
    }

    async fn commit_tree(&self, _repo: &RepoRef, commit: &ObjectId) -> RemoteResult<ObjectId> {
        self.enter(RemoteOp::CommitTree).await?;
        Ok(self.lock()?.commit(commit)?.tree.clone())
    }

    async fn create_blob(&self, _repo: &RepoRef, content: &str) -> RemoteResult<ObjectId> {
        self.enter(RemoteOp::CreateBlob).await?;
        Ok(self.lock()?.put_blob(content))
    }

    async fn create_tree(
        &self,
        _repo: &RepoRef,
        base_tree: &ObjectId,
        changes: &[TreeChange],
    ) -> RemoteResult<ObjectId> {
        self.enter(RemoteOp::CreateTree).await?;
        let mut state = self.lock()?;
        let mut files = state.tree(base_tree)?.clone();
        for change in changes {
            match &change.object_id {
                Some(blob) => {
                    if !state.blobs.contains_key(blob) {
                        return Err(unprocessable(format!(
                            "tree.sha {blob} is not a valid blob"
                        )));
                    }
                    if change.mode == FileMode::Directory {
                        return Err(unprocessable(format!(
                            "tree.mode {} is not a blob mode",
                            change.mode
                        )));
                    }
                    files.insert(
                        change.path.clone(),
                        Leaf {
                            blob: blob.clone(),
                            mode: change.mode,
                        },
                    );
                }
                None => {
                    if files.remove(&change.path).is_none() {
                        return Err(unprocessable(format!(
                            "cannot delete {}: not in base tree",
                            change.path
                        )));
                    }
                }
            }
        }
        Ok(state.put_tree(files))
    }

    async fn create_commit(
        &self,
        _repo: &RepoRef,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> RemoteResult<ObjectId> {
        self.enter(RemoteOp::CreateCommit).await?;
        let mut state = self.lock()?;
        if !state.trees.contains_key(tree) {
            return Err(unprocessable(format!("tree {tree} does not exist")));
        }
        if !state.commits.contains_key(parent) {
            return Err(unprocessable(format!("parent {parent} does not exist")));
        }
        Ok(state.put_commit(tree.clone(), Some(parent.clone()), message))
    }

    async fn update_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        commit: &ObjectId,
        expected_parent: &ObjectId,
    ) -> RemoteResult<()> {
        self.enter(RemoteOp::UpdateRef).await?;
        let mut state = self.lock()?;
        let current = state.head(repo, branch)?;
        let fast_forward = state.commit(commit)?.parent.as_ref() == Some(&current);
        if current != *expected_parent || !fast_forward {
            return Err(RemoteError::StaleParent {
                branch: branch.to_string(),
            });
        }
        state.refs.insert(ref_key(repo, branch), commit.clone());
        Ok(())
    }
}

fn ref_key(repo: &RepoRef, branch: &str) -> String {
    format!("{}:{branch}", repo.full_name())
}

fn unprocessable(message: String) -> RemoteError {
    RemoteError::Api {
        status: 422,
        message,
    }
}

fn tree_id(files: &Files) -> ObjectId {
    let modes: Vec<String> = files.values().map(|l| l.mode.to_string()).collect();
    ContentHasher::TREE.hash_parts(files.iter().zip(&modes).flat_map(|((p, leaf), mode)| {
        [p.as_bytes(), mode.as_bytes(), leaf.blob.as_str().as_bytes()]
    }))
}

/// Expand a flat file map into file and directory entries, in path order.
fn list_entries(files: &Files) -> Vec<RepositoryEntry> {
    let mut dirs = BTreeSet::new();
    for file_path in files.keys() {
        let mut dir = path::parent(file_path);
        while !dir.is_empty() {
            dirs.insert(dir.to_string());
            dir = path::parent(dir);
        }
    }

    let mut entries: Vec<RepositoryEntry> = files
        .iter()
        .map(|(p, leaf)| RepositoryEntry::file(p.clone(), leaf.blob.clone()).with_mode(leaf.mode))
        .collect();
    for dir in dirs {
        let below: Files = files
            .iter()
            .filter(|(p, _)| path::is_within(p, &dir))
            .map(|(p, leaf)| (p.clone(), leaf.clone()))
            .collect();
        entries.push(RepositoryEntry::new(dir, EntryKind::Directory, tree_id(&below)));
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoRef {
        RepoRef::new("octo", "demo").unwrap()
    }

    fn seeded() -> InMemoryRemote {
        let remote = InMemoryRemote::new();
        remote
            .seed(&repo(), "main", &[("README.md", "hi"), ("src/main.js", "v1")])
            .unwrap();
        remote
    }

    #[tokio::test]
    async fn fetch_tree_lists_files_and_directories() {
        let remote = seeded();
        let listing = remote.fetch_tree(&repo(), "main").await.unwrap();
        let paths: Vec<(&str, EntryKind)> = listing
            .entries
            .iter()
            .map(|e| (e.path.as_str(), e.kind))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("README.md", EntryKind::File),
                ("src", EntryKind::Directory),
                ("src/main.js", EntryKind::File),
            ]
        );
    }

    #[tokio::test]
    async fn missing_branch_is_not_found() {
        let remote = seeded();
        let err = remote.fetch_tree(&repo(), "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let remote = seeded();
        assert_eq!(remote.read_file(&repo(), "gone.txt", "main").await.unwrap(), "");
        assert_eq!(
            remote.read_file(&repo(), "src/main.js", "main").await.unwrap(),
            "v1"
        );
    }

    #[tokio::test]
    async fn directory_contents_are_unavailable() {
        let remote = seeded();
        let err = remote.fetch_contents(&repo(), "src", "main").await.unwrap_err();
        assert!(matches!(err, RemoteError::ContentUnavailable(_)));
    }

    #[tokio::test]
    async fn full_write_sequence_moves_branch() {
        let remote = seeded();
        let r = repo();
        let parent = remote.resolve_ref(&r, "main").await.unwrap();
        let base = remote.commit_tree(&r, &parent).await.unwrap();
        let blob = remote.create_blob(&r, "v2").await.unwrap();
        let tree = remote
            .create_tree(
                &r,
                &base,
                &[
                    TreeChange::upsert("src/main.js", blob, FileMode::Regular),
                    TreeChange::delete("README.md"),
                ],
            )
            .await
            .unwrap();
        let commit = remote.create_commit(&r, "update", &tree, &parent).await.unwrap();
        remote.update_ref(&r, "main", &commit, &parent).await.unwrap();

        let files = remote.files(&r, "main").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files["src/main.js"], "v2");
        let (message, recorded_parent) = remote.commit_info(&commit).unwrap();
        assert_eq!(message, "update");
        assert_eq!(recorded_parent, Some(parent));
    }

    #[tokio::test]
    async fn update_ref_rejects_moved_branch() {
        let remote = seeded();
        let r = repo();
        let parent = remote.resolve_ref(&r, "main").await.unwrap();
        let base = remote.commit_tree(&r, &parent).await.unwrap();
        let commit = remote.create_commit(&r, "mine", &base, &parent).await.unwrap();

        remote
            .push(&r, "main", &[("other.txt", Some("x"))], "someone else")
            .unwrap();

        let err = remote.update_ref(&r, "main", &commit, &parent).await.unwrap_err();
        assert!(matches!(err, RemoteError::StaleParent { .. }));
    }

    #[tokio::test]
    async fn deleting_absent_path_is_unprocessable() {
        let remote = seeded();
        let r = repo();
        let parent = remote.resolve_ref(&r, "main").await.unwrap();
        let base = remote.commit_tree(&r, &parent).await.unwrap();
        let err = remote
            .create_tree(&r, &base, &[TreeChange::delete("nope.txt")])
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 422, .. }));
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let remote = seeded();
        remote.fail_next(RemoteOp::ResolveRef, RemoteError::Network("timeout".into()));
        assert!(remote.resolve_ref(&repo(), "main").await.is_err());
        assert!(remote.resolve_ref(&repo(), "main").await.is_ok());
        assert_eq!(remote.call_count(RemoteOp::ResolveRef), 2);
    }

    #[tokio::test]
    async fn blobs_are_deduplicated() {
        let remote = InMemoryRemote::new();
        let a = remote.create_blob(&repo(), "same").await.unwrap();
        let b = remote.create_blob(&repo(), "same").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(remote.blob_count(), 1);
    }

    #[tokio::test]
    async fn blob_ids_are_git_blob_ids() {
        let remote = InMemoryRemote::new();
        let id = remote.create_blob(&repo(), "hello\n").await.unwrap();
        assert_eq!(id.as_str(), "ce013625030ba8dba906f756967f9e9ca394464a");

        let listing = seeded().fetch_tree(&repo(), "main").await.unwrap();
        let readme = listing.entries.iter().find(|e| e.path == "README.md").unwrap();
        assert_eq!(readme.content_id, ObjectId::git_blob(b"hi"));
    }

    #[tokio::test]
    async fn modes_are_listed_and_survive_pushes() {
        let remote = seeded();
        let r = repo();
        remote.chmod(&r, "main", "src/main.js", FileMode::Executable).unwrap();
        remote.push(&r, "main", &[("src/main.js", Some("v2"))], "edit").unwrap();

        let listing = remote.fetch_tree(&r, "main").await.unwrap();
        let modes: Vec<(&str, FileMode)> = listing
            .entries
            .iter()
            .map(|e| (e.path.as_str(), e.mode))
            .collect();
        assert_eq!(
            modes,
            vec![
                ("README.md", FileMode::Regular),
                ("src", FileMode::Directory),
                ("src/main.js", FileMode::Executable),
            ]
        );
        assert!(remote.chmod(&r, "main", "nope", FileMode::Executable).is_err());
    }

    #[tokio::test]
    async fn tree_submission_sets_mode() {
        let remote = seeded();
        let r = repo();
        let parent = remote.resolve_ref(&r, "main").await.unwrap();
        let base = remote.commit_tree(&r, &parent).await.unwrap();
        let blob = remote.create_blob(&r, "#!/bin/sh").await.unwrap();
        let tree = remote
            .create_tree(&r, &base, &[TreeChange::upsert("run.sh", blob.clone(), FileMode::Executable)])
            .await
            .unwrap();
        let commit = remote.create_commit(&r, "add script", &tree, &parent).await.unwrap();
        remote.update_ref(&r, "main", &commit, &parent).await.unwrap();
        assert_eq!(remote.mode_of(&r, "main", "run.sh"), Some(FileMode::Executable));

        let err = remote
            .create_tree(&r, &base, &[TreeChange::upsert("x", blob, FileMode::Directory)])
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 422, .. }));
    }

    #[tokio::test]
    async fn paused_call_waits_for_release() {
        let remote = Arc::new(seeded());
        let gate = remote.pause_next(RemoteOp::ResolveRef);
        let r = repo();
        let (resolved, ()) = tokio::join!(remote.resolve_ref(&r, "main"), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });
        assert!(resolved.is_ok());
    }
}

//! The sparse map of unpublished changes on top of the remote tree.
//!
//! The [`Overlay`] holds one [`OverlayEntry`] per path that differs from the
//! [`RemoteTreeIndex`]: new or edited content, or a deletion tombstone. A
//! path with no entry reads through to the remote. Every operation is a
//! last-write-wins replacement per path; no history is kept. Content that
//! equals the remote blob is not a change, so it leaves no entry behind.

use std::collections::{BTreeMap, BTreeSet};

use rws_remote::{RemoteError, RemoteStore};
use rws_types::path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::tree_index::RemoteTreeIndex;

/// Pending state of one path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayEntry {
    /// New or changed content.
    Edited(String),
    /// The remote leaf is removed.
    Deleted,
}

impl OverlayEntry {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Pending content, if this is an edit.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Edited(content) => Some(content),
            Self::Deleted => None,
        }
    }
}

/// One leaf moved by a rename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameMove {
    pub from: String,
    pub to: String,
}

/// Pending changes keyed by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overlay {
    entries: BTreeMap<String, OverlayEntry>,
}

impl Overlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&OverlayEntry> {
        self.entries.get(path)
    }

    /// Returns `true` if `path` has a pending change.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Pending content of `path`, if it has been edited.
    pub fn content(&self, path: &str) -> Option<&str> {
        self.entries.get(path).and_then(OverlayEntry::content)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverlayEntry)> {
        self.entries.iter().map(|(p, e)| (p.as_str(), e))
    }

    /// Paths with a pending change, in path order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    // ---------------------------------------------------------------
    // Live view
    // ---------------------------------------------------------------

    /// Returns `true` if `path` is a visible leaf: edited here, or a remote
    /// file that is not tombstoned.
    pub fn is_live(&self, index: &RemoteTreeIndex, path: &str) -> bool {
        match self.entries.get(path) {
            Some(OverlayEntry::Edited(_)) => true,
            Some(OverlayEntry::Deleted) => false,
            None => index.contains_file(path),
        }
    }

    /// Every visible leaf path, in path order.
    pub fn live_leaves(&self, index: &RemoteTreeIndex) -> BTreeSet<String> {
        let mut leaves: BTreeSet<String> = index
            .files()
            .filter(|p| !self.entries.get(*p).is_some_and(OverlayEntry::is_deleted))
            .map(str::to_string)
            .collect();
        leaves.extend(
            self.entries
                .iter()
                .filter(|(_, e)| !e.is_deleted())
                .map(|(p, _)| p.clone()),
        );
        leaves
    }

    /// Visible leaf paths strictly below directory `dir`.
    pub fn live_under(&self, index: &RemoteTreeIndex, dir: &str) -> Vec<String> {
        let mut leaves: BTreeSet<String> = index
            .files_under(dir)
            .into_iter()
            .filter(|p| self.is_live(index, p))
            .map(str::to_string)
            .collect();
        leaves.extend(
            self.entries
                .iter()
                .filter(|(p, e)| !e.is_deleted() && path::is_within(p, dir))
                .map(|(p, _)| p.clone()),
        );
        leaves.into_iter().collect()
    }

    /// Returns `true` if `path` is a visible leaf or a directory with at
    /// least one visible leaf below it.
    pub fn exists(&self, index: &RemoteTreeIndex, path: &str) -> bool {
        self.is_live(index, path) || !self.live_under(index, path).is_empty()
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Set `path` to `Edited(content)`, for existing and new paths alike.
    ///
    /// Writing back the remote content drops the entry instead. The path may
    /// not name a visible directory or lie below a visible file. Returns the
    /// normalized path.
    pub fn record_edit(
        &mut self,
        index: &RemoteTreeIndex,
        path: &str,
        content: impl Into<String>,
    ) -> IndexResult<String> {
        let path = path::normalize(path)?;
        self.check_leaf_target(index, &path)?;
        self.settle(index, path.clone(), content.into());
        Ok(path)
    }

    /// Fail unless a leaf can be placed at `path` without colliding with a
    /// visible directory of the same name or a visible file above it.
    pub fn check_leaf_target(&self, index: &RemoteTreeIndex, path: &str) -> IndexResult<()> {
        if !self.live_under(index, path).is_empty() {
            return Err(IndexError::IsDirectory(path.to_string()));
        }
        let mut dir = path::parent(path);
        while !dir.is_empty() {
            if self.is_live(index, dir) {
                return Err(IndexError::UnderFile {
                    path: path.to_string(),
                    file: dir.to_string(),
                });
            }
            dir = path::parent(dir);
        }
        Ok(())
    }

    fn settle(&mut self, index: &RemoteTreeIndex, path: String, content: String) {
        if index.matches_content(&path, &content) {
            self.entries.remove(&path);
        } else {
            self.entries.insert(path, OverlayEntry::Edited(content));
        }
    }

    /// Delete a leaf, or every leaf below a directory.
    ///
    /// Remote leaves are tombstoned. Leaves that exist only in the overlay
    /// are dropped, since there is nothing to remove remotely. Returns the
    /// affected leaf paths in path order.
    pub fn record_delete(&mut self, index: &RemoteTreeIndex, path: &str) -> IndexResult<Vec<String>> {
        let path = path::normalize(path)?;
        let targets = self.delete_targets(index, &path);
        if targets.is_empty() {
            return Err(IndexError::PathNotFound(path));
        }
        for target in &targets {
            self.delete_leaf(index, target);
        }
        debug!(path = %path, count = targets.len(), "recorded delete");
        Ok(targets)
    }

    fn delete_targets(&self, index: &RemoteTreeIndex, path: &str) -> Vec<String> {
        if index.contains_file(path) || self.contains(path) {
            return vec![path.to_string()];
        }
        let mut targets: BTreeSet<String> = index
            .files_under(path)
            .into_iter()
            .map(str::to_string)
            .collect();
        targets.extend(
            self.entries
                .keys()
                .filter(|p| path::is_within(p, path))
                .cloned(),
        );
        targets.into_iter().collect()
    }

    fn delete_leaf(&mut self, index: &RemoteTreeIndex, path: &str) {
        if index.contains_file(path) {
            self.entries.insert(path.to_string(), OverlayEntry::Deleted);
        } else {
            self.entries.remove(path);
        }
    }

    /// Work out which leaves a rename moves, without changing anything.
    ///
    /// Renaming onto itself plans nothing. The target must not already be
    /// visible or sit below a visible file, and a directory cannot move below
    /// itself.
    pub fn plan_rename(
        &self,
        index: &RemoteTreeIndex,
        old: &str,
        new: &str,
    ) -> IndexResult<Vec<RenameMove>> {
        let old = path::normalize(old)?;
        let new = path::normalize(new)?;
        if old == new {
            return Ok(Vec::new());
        }
        if path::is_within(&new, &old) {
            return Err(IndexError::IntoItself { from: old, to: new });
        }

        let sources = if self.is_live(index, &old) {
            vec![old.clone()]
        } else {
            self.live_under(index, &old)
        };
        if sources.is_empty() {
            return Err(IndexError::PathNotFound(old));
        }
        if self.exists(index, &new) {
            return Err(IndexError::AlreadyExists(new));
        }

        let moves: Vec<RenameMove> = sources
            .into_iter()
            .filter_map(|from| {
                path::rebase(&from, &old, &new).map(|to| RenameMove { from, to })
            })
            .collect();
        for mv in &moves {
            self.check_leaf_target(index, &mv.to)?;
        }
        Ok(moves)
    }

    /// Rename a leaf or directory as deletes plus edits.
    ///
    /// The live content of every moved leaf is resolved first, from this
    /// overlay or else from the remote, and the overlay is only changed once
    /// all of it is in hand. A leaf whose content cannot be resolved fails the
    /// whole rename with `ContentUnavailable`. Returns every affected path,
    /// old and new, in path order.
    pub async fn record_rename<R>(
        &mut self,
        index: &RemoteTreeIndex,
        remote: &R,
        old: &str,
        new: &str,
    ) -> IndexResult<Vec<String>>
    where
        R: RemoteStore + ?Sized,
    {
        let moves = self.plan_rename(index, old, new)?;
        if moves.is_empty() {
            return Ok(Vec::new());
        }

        let mut resolved = Vec::with_capacity(moves.len());
        for mv in moves {
            let content = match self.entries.get(&mv.from) {
                Some(OverlayEntry::Edited(content)) => content.clone(),
                Some(OverlayEntry::Deleted) => {
                    return Err(IndexError::ContentUnavailable(mv.from));
                }
                None => match remote
                    .fetch_contents(index.repo(), &mv.from, index.branch())
                    .await
                {
                    Ok(Some(content)) => content,
                    Ok(None)
                    | Err(RemoteError::NotFound(_))
                    | Err(RemoteError::ContentUnavailable(_)) => {
                        return Err(IndexError::ContentUnavailable(mv.from));
                    }
                    Err(e) => return Err(e.into()),
                },
            };
            resolved.push((mv, content));
        }

        let mut affected = BTreeSet::new();
        for (mv, content) in resolved {
            self.delete_leaf(index, &mv.from);
            self.settle(index, mv.to.clone(), content);
            affected.insert(mv.from);
            affected.insert(mv.to);
        }
        debug!(count = affected.len(), "recorded rename");
        Ok(affected.into_iter().collect())
    }

    /// Drop the pending change at `path`.
    pub fn remove(&mut self, path: &str) -> Option<OverlayEntry> {
        self.entries.remove(path)
    }

    /// Drop the entries for exactly `paths`, leaving every other pending
    /// change in place. Returns how many were removed.
    pub fn clear_committed<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) -> usize {
        paths
            .into_iter()
            .filter(|p| self.entries.remove(*p).is_some())
            .count()
    }

    /// Drop entries the remote has caught up with: edits whose content is
    /// now the remote blob, and tombstones of files the remote no longer
    /// has. Returns the dropped paths in path order.
    pub fn reconcile(&mut self, index: &RemoteTreeIndex) -> Vec<String> {
        let settled: Vec<String> = self
            .entries
            .iter()
            .filter(|(p, e)| match e {
                OverlayEntry::Edited(content) => index.matches_content(p, content),
                OverlayEntry::Deleted => !index.contains_file(p),
            })
            .map(|(p, _)| p.clone())
            .collect();
        for path in &settled {
            self.entries.remove(path);
        }
        if !settled.is_empty() {
            debug!(count = settled.len(), "dropped changes already on the remote");
        }
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rws_remote::{InMemoryRemote, RemoteOp, TreeListing};
    use rws_types::{ObjectId, RepoRef, RepositoryEntry};

    fn repo() -> RepoRef {
        RepoRef::new("octo", "demo").unwrap()
    }

    async fn setup() -> (InMemoryRemote, RemoteTreeIndex) {
        let remote = InMemoryRemote::new();
        remote
            .seed(
                &repo(),
                "main",
                &[
                    ("README.md", "hi"),
                    ("a.txt", "alpha"),
                    ("dir/one.txt", "1"),
                    ("dir/sub/two.txt", "2"),
                    ("dirx.txt", "x"),
                ],
            )
            .unwrap();
        let index = RemoteTreeIndex::load(&remote, repo(), "main").await.unwrap();
        remote.clear_calls();
        (remote, index)
    }

    /// An index holding one unrelated file, for tests that never read content.
    fn bare_index() -> RemoteTreeIndex {
        let listing = TreeListing {
            tree_id: ObjectId::from_bytes(b"root"),
            entries: vec![RepositoryEntry::file("seed.txt", ObjectId::git_blob(b"seed"))],
            truncated: false,
        };
        RemoteTreeIndex::from_listing(repo(), "main".into(), listing).unwrap()
    }

    #[test]
    fn edit_normalizes_path() {
        let index = bare_index();
        let mut overlay = Overlay::new();
        let path = overlay.record_edit(&index, "/docs/new.md", "").unwrap();
        assert_eq!(path, "docs/new.md");
        assert_eq!(overlay.content("docs/new.md"), Some(""));
        assert!(overlay.record_edit(&index, "a//b", "x").is_err());
    }

    #[tokio::test]
    async fn delete_leaf_tombstones_remote_file() {
        let (_remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "a.txt", "changed").unwrap();

        let affected = overlay.record_delete(&index, "a.txt").unwrap();
        assert_eq!(affected, vec!["a.txt"]);
        assert_eq!(overlay.get("a.txt"), Some(&OverlayEntry::Deleted));

        // Repeating the delete leaves the same state.
        overlay.record_delete(&index, "a.txt").unwrap();
        assert_eq!(overlay.len(), 1);
    }

    #[tokio::test]
    async fn delete_directory_expands_to_leaves() {
        let (_remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "dir/new.txt", "n").unwrap();

        let affected = overlay.record_delete(&index, "dir").unwrap();
        assert_eq!(
            affected,
            vec!["dir/new.txt", "dir/one.txt", "dir/sub/two.txt"]
        );
        assert_eq!(overlay.get("dir/one.txt"), Some(&OverlayEntry::Deleted));
        assert_eq!(overlay.get("dir/sub/two.txt"), Some(&OverlayEntry::Deleted));
        // Overlay-only file is dropped rather than tombstoned.
        assert!(!overlay.contains("dir/new.txt"));
        // Sibling sharing the prefix text is untouched.
        assert!(!overlay.contains("dirx.txt"));
        assert!(overlay.live_under(&index, "dir").is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_path_is_not_found() {
        let (_remote, index) = setup().await;
        let mut overlay = Overlay::new();
        let err = overlay.record_delete(&index, "nope").unwrap_err();
        assert!(matches!(err, IndexError::PathNotFound(p) if p == "nope"));
        assert!(overlay.is_empty());
    }

    #[tokio::test]
    async fn rename_file_moves_remote_content() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();

        let affected = overlay
            .record_rename(&index, &remote, "a.txt", "b.txt")
            .await
            .unwrap();
        assert_eq!(affected, vec!["a.txt", "b.txt"]);
        assert_eq!(overlay.get("a.txt"), Some(&OverlayEntry::Deleted));
        assert_eq!(overlay.content("b.txt"), Some("alpha"));
        assert_eq!(remote.call_count(RemoteOp::FetchContents), 1);
    }

    #[tokio::test]
    async fn rename_pending_file_uses_overlay_content() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "notes.md", "draft").unwrap();

        overlay
            .record_rename(&index, &remote, "notes.md", "docs/notes.md")
            .await
            .unwrap();
        assert!(!overlay.contains("notes.md"));
        assert_eq!(overlay.content("docs/notes.md"), Some("draft"));
        assert_eq!(remote.call_count(RemoteOp::FetchContents), 0);
    }

    #[tokio::test]
    async fn rename_directory_moves_every_leaf() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "dir/one.txt", "edited").unwrap();

        let affected = overlay
            .record_rename(&index, &remote, "dir", "lib")
            .await
            .unwrap();
        assert_eq!(
            affected,
            vec!["dir/one.txt", "dir/sub/two.txt", "lib/one.txt", "lib/sub/two.txt"]
        );
        assert_eq!(overlay.content("lib/one.txt"), Some("edited"));
        assert_eq!(overlay.content("lib/sub/two.txt"), Some("2"));
        assert!(!overlay.is_live(&index, "dir/one.txt"));
        assert!(overlay.is_live(&index, "dirx.txt"));
    }

    #[tokio::test]
    async fn rename_rejects_existing_target_and_self_nesting() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();

        let err = overlay
            .record_rename(&index, &remote, "a.txt", "README.md")
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::AlreadyExists(_)));

        let err = overlay
            .record_rename(&index, &remote, "a.txt", "dir")
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::AlreadyExists(_)));

        let err = overlay
            .record_rename(&index, &remote, "dir", "dir/inner")
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::IntoItself { .. }));

        assert!(overlay.is_empty());
    }

    #[tokio::test]
    async fn rename_onto_itself_is_noop() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();
        let affected = overlay
            .record_rename(&index, &remote, "a.txt", "/a.txt")
            .await
            .unwrap();
        assert!(affected.is_empty());
        assert!(overlay.is_empty());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn rename_is_all_or_nothing() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "dir/keep.txt", "k").unwrap();
        let before = overlay.clone();

        // Second remote read fails after the first succeeded.
        remote.push(&repo(), "main", &[("dir/sub/two.txt", None)], "gone").unwrap();
        let err = overlay
            .record_rename(&index, &remote, "dir", "lib")
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::ContentUnavailable(p) if p == "dir/sub/two.txt"));
        assert_eq!(overlay, before);
    }

    #[tokio::test]
    async fn rename_surfaces_transport_failure() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();
        remote.fail_next(RemoteOp::FetchContents, RemoteError::Network("timeout".into()));
        let err = overlay
            .record_rename(&index, &remote, "a.txt", "b.txt")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), rws_types::ErrorKind::Network);
        assert!(overlay.is_empty());
    }

    #[tokio::test]
    async fn edit_back_to_remote_content_leaves_no_entry() {
        let (_remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "a.txt", "changed").unwrap();
        assert!(overlay.contains("a.txt"));

        overlay.record_edit(&index, "a.txt", "alpha").unwrap();
        assert!(overlay.is_empty());

        // Restoring a tombstoned file with its remote content also clears it.
        overlay.record_delete(&index, "a.txt").unwrap();
        overlay.record_edit(&index, "a.txt", "alpha").unwrap();
        assert!(overlay.is_empty());
        assert!(overlay.is_live(&index, "a.txt"));
    }

    #[tokio::test]
    async fn edit_rejects_file_and_directory_collisions() {
        let (_remote, index) = setup().await;
        let mut overlay = Overlay::new();

        let err = overlay.record_edit(&index, "dir", "x").unwrap_err();
        assert!(matches!(err, IndexError::IsDirectory(p) if p == "dir"));
        let err = overlay.record_edit(&index, "README.md/notes.txt", "x").unwrap_err();
        assert!(matches!(err, IndexError::UnderFile { file, .. } if file == "README.md"));
        let err = overlay.record_edit(&index, "a.txt/b/c.txt", "x").unwrap_err();
        assert_eq!(err.kind(), rws_types::ErrorKind::Validation);
        assert!(overlay.is_empty());

        // Once the blocking leaves are gone the paths are free.
        overlay.record_delete(&index, "README.md").unwrap();
        overlay.record_edit(&index, "README.md/notes.txt", "x").unwrap();
        overlay.record_delete(&index, "dir").unwrap();
        overlay.record_edit(&index, "dir", "now a file").unwrap();
        assert!(overlay.is_live(&index, "dir"));
    }

    #[tokio::test]
    async fn rename_below_a_file_is_rejected() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();

        let err = overlay
            .record_rename(&index, &remote, "a.txt", "README.md/a.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::UnderFile { .. }));
        let err = overlay
            .record_rename(&index, &remote, "dir", "a.txt/dir")
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::UnderFile { file, .. } if file == "a.txt"));
        assert!(overlay.is_empty());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn rename_there_and_back_leaves_no_changes() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();

        overlay.record_rename(&index, &remote, "a.txt", "b.txt").await.unwrap();
        overlay.record_rename(&index, &remote, "b.txt", "a.txt").await.unwrap();
        assert!(overlay.is_empty());

        overlay.record_rename(&index, &remote, "dir", "lib").await.unwrap();
        overlay.record_rename(&index, &remote, "lib", "dir").await.unwrap();
        assert!(overlay.is_empty());
    }

    #[tokio::test]
    async fn rename_of_unreadable_content_is_unavailable() {
        let (remote, index) = setup().await;
        let mut overlay = Overlay::new();
        remote.fail_next(
            RemoteOp::FetchContents,
            RemoteError::ContentUnavailable("a.txt: host returned encoding \"none\"".into()),
        );
        let err = overlay
            .record_rename(&index, &remote, "a.txt", "b.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::ContentUnavailable(p) if p == "a.txt"));
        assert!(overlay.is_empty());
    }

    #[tokio::test]
    async fn clear_committed_removes_only_given_paths() {
        let (_remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "x", "1").unwrap();
        overlay.record_edit(&index, "y", "2").unwrap();
        overlay.record_delete(&index, "a.txt").unwrap();

        assert_eq!(overlay.clear_committed(["x", "a.txt", "absent"]), 2);
        assert_eq!(overlay.paths().collect::<Vec<_>>(), vec!["y"]);
    }

    #[tokio::test]
    async fn reconcile_drops_changes_the_remote_already_has() {
        let (remote, mut index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_edit(&index, "a.txt", "beta").unwrap();
        overlay.record_edit(&index, "c.txt", "mine").unwrap();
        overlay.record_delete(&index, "README.md").unwrap();
        overlay.record_delete(&index, "dirx.txt").unwrap();

        remote
            .push(
                &repo(),
                "main",
                &[("a.txt", Some("beta")), ("README.md", None), ("c.txt", Some("theirs"))],
                "other writer",
            )
            .unwrap();
        index.refresh(&remote).await.unwrap();

        assert_eq!(overlay.reconcile(&index), vec!["README.md", "a.txt"]);
        assert_eq!(overlay.paths().collect::<Vec<_>>(), vec!["c.txt", "dirx.txt"]);
        assert!(overlay.reconcile(&index).is_empty());
    }

    #[tokio::test]
    async fn live_leaves_merge_remote_and_overlay() {
        let (_remote, index) = setup().await;
        let mut overlay = Overlay::new();
        overlay.record_delete(&index, "README.md").unwrap();
        overlay.record_edit(&index, "new.txt", "").unwrap();

        let leaves: Vec<String> = overlay.live_leaves(&index).into_iter().collect();
        assert_eq!(
            leaves,
            vec!["a.txt", "dir/one.txt", "dir/sub/two.txt", "dirx.txt", "new.txt"]
        );
        assert!(overlay.exists(&index, "dir/sub"));
        assert!(!overlay.exists(&index, "README.md"));
    }

    proptest! {
        #[test]
        fn repeated_edits_keep_only_the_last(
            path in "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
            contents in proptest::collection::vec(".*", 1..8),
        ) {
            let index = bare_index();
            let mut overlay = Overlay::new();
            for content in &contents {
                overlay.record_edit(&index, &path, content.clone()).unwrap();
            }
            prop_assert_eq!(overlay.len(), 1);
            prop_assert_eq!(
                overlay.get(&path),
                Some(&OverlayEntry::Edited(contents.last().unwrap().clone()))
            );
        }
    }
}

//! The subset of pending changes selected for the next commit.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::overlay::Overlay;

/// Staged leaf paths.
///
/// Every staged path has an entry in the [`Overlay`] at the time it is
/// staged. Directories are never staged; directory-level actions expand to
/// their leaves before reaching this set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagingSet {
    paths: BTreeSet<String>,
}

impl StagingSet {
    /// Create an empty staging set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Staged paths in path order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Owned copy of the staged paths.
    pub fn to_set(&self) -> BTreeSet<String> {
        self.paths.clone()
    }

    /// Stage `path`. Fails with `NotPending` if the overlay has no entry for
    /// it. Returns `false` if it was already staged.
    pub fn stage(&mut self, overlay: &Overlay, path: &str) -> IndexResult<bool> {
        if !overlay.contains(path) {
            return Err(IndexError::NotPending(path.to_string()));
        }
        Ok(self.paths.insert(path.to_string()))
    }

    /// Stage every path that still has an overlay entry; others are
    /// unstaged. Used after delete and rename, where overlay-only leaves may
    /// have been dropped instead of tombstoned.
    pub fn sync_paths<'a>(&mut self, overlay: &Overlay, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            if overlay.contains(path) {
                self.paths.insert(path.to_string());
            } else {
                self.paths.remove(path);
            }
        }
    }

    /// Remove `path`. Returns `false` if it was not staged.
    pub fn unstage(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    /// Remove exactly `paths`, leaving anything staged since untouched.
    pub fn remove_all<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            self.paths.remove(path);
        }
    }

    /// Drop staged paths that no longer have an overlay entry.
    pub fn retain_overlay(&mut self, overlay: &Overlay) {
        let before = self.paths.len();
        self.paths.retain(|p| overlay.contains(p));
        let dropped = before - self.paths.len();
        if dropped > 0 {
            debug!(count = dropped, "unstaged paths without pending changes");
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

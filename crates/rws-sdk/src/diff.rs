//! Line diff between the remote copy of a file and its pending content.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce hunks with
//! three lines of context.

use std::fmt::Write as _;

use rws_index::FileStatus;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Pending change of one file as line hunks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    pub path: String,
    /// `None` when the file has no pending change.
    pub status: Option<FileStatus>,
    pub hunks: Vec<DiffHunk>,
}

impl FileDiff {
    /// Returns `true` if both sides are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Total number of lines added across all hunks.
    pub fn additions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Added(_)))
    }

    /// Total number of lines removed across all hunks.
    pub fn deletions(&self) -> usize {
        self.count(|l| matches!(l, DiffLine::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| pred(l))
            .count()
    }

    /// Render in unified format.
    pub fn to_unified(&self) -> String {
        let mut out = String::new();
        let (old, new) = match self.status {
            Some(FileStatus::New) => ("/dev/null".to_string(), format!("b/{}", self.path)),
            Some(FileStatus::Deleted) => (format!("a/{}", self.path), "/dev/null".to_string()),
            _ => (format!("a/{}", self.path), format!("b/{}", self.path)),
        };
        let _ = writeln!(out, "--- {old}");
        let _ = writeln!(out, "+++ {new}");
        for hunk in &self.hunks {
            let _ = writeln!(
                out,
                "@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
            );
            for line in &hunk.lines {
                let _ = match line {
                    DiffLine::Context(t) => writeln!(out, " {t}"),
                    DiffLine::Added(t) => writeln!(out, "+{t}"),
                    DiffLine::Removed(t) => writeln!(out, "-{t}"),
                };
            }
        }
        out
    }
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffHunk {
    /// 1-based start line in the remote copy.
    pub old_start: usize,
    pub old_count: usize,
    /// 1-based start line in the pending content.
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// Diff `old` (remote) against `new` (pending).
pub fn diff_text(path: &str, status: Option<FileStatus>, old: &str, new: &str) -> FileDiff {
    let mut diff = FileDiff {
        path: path.to_string(),
        status,
        hunks: Vec::new(),
    };
    if old == new {
        return diff;
    }

    let text_diff = TextDiff::from_lines(old, new);
    for group in text_diff.grouped_ops(3) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };
        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
            }
        }
        diff.hunks.push(hunk);
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_no_hunks() {
        let diff = diff_text("a", None, "x\ny\n", "x\ny\n");
        assert!(diff.is_empty());
        assert_eq!(diff.additions(), 0);
    }

    #[test]
    fn modification_shows_remove_and_add() {
        let diff = diff_text("a", Some(FileStatus::Modified), "a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 1);
        assert_eq!(
            diff.hunks[0].lines,
            vec![
                DiffLine::Context("a".into()),
                DiffLine::Removed("b".into()),
                DiffLine::Added("B".into()),
                DiffLine::Context("c".into()),
            ]
        );
    }

    #[test]
    fn unified_headers_follow_status() {
        let new_file = diff_text("docs/new.md", Some(FileStatus::New), "", "hello\n");
        let text = new_file.to_unified();
        assert!(text.starts_with("--- /dev/null\n+++ b/docs/new.md\n@@ -1,0 +1,1 @@\n+hello\n"));

        let deleted = diff_text("old.txt", Some(FileStatus::Deleted), "bye\n", "");
        assert!(deleted.to_unified().contains("+++ /dev/null"));
        assert_eq!(deleted.deletions(), 1);
    }
}

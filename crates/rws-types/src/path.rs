//! Slash-separated repository path helpers.
//!
//! Repository paths are always relative, `/`-separated, and carry no leading
//! or trailing separator. The empty string denotes the repository root.

use crate::error::TypeError;

/// The path separator used by remote trees.
pub const SEPARATOR: char = '/';

/// Normalize and validate a leaf or directory path.
///
/// Leading and trailing separators are stripped. Empty segments and `.` /
/// `..` segments are rejected, as is the root itself.
pub fn normalize(path: &str) -> Result<String, TypeError> {
    let trimmed = path.trim().trim_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Err(TypeError::InvalidPath("empty path".to_string()));
    }
    for segment in trimmed.split(SEPARATOR) {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(TypeError::InvalidPath(path.to_string()));
        }
    }
    Ok(trimmed.to_string())
}

/// Join a base directory (`""` for the root) and a relative name.
pub fn join(base: &str, name: &str) -> Result<String, TypeError> {
    let base = base.trim().trim_matches(SEPARATOR);
    if base.is_empty() {
        normalize(name)
    } else {
        normalize(&format!("{base}{SEPARATOR}{name}"))
    }
}

/// The parent directory of `path`, or `""` at the top level.
pub fn parent(path: &str) -> &str {
    path.rsplit_once(SEPARATOR).map(|(p, _)| p).unwrap_or("")
}

/// The final segment of `path`.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once(SEPARATOR).map(|(_, n)| n).unwrap_or(path)
}

/// Returns `true` if `path` lies strictly below directory `dir`.
pub fn is_within(path: &str, dir: &str) -> bool {
    path.len() > dir.len()
        && path.starts_with(dir)
        && path.as_bytes()[dir.len()] == SEPARATOR as u8
}

/// Move `path` from under `old` to under `new`.
///
/// Only a whole-segment prefix is replaced: `src/a` rebased from `src` to
/// `lib` becomes `lib/a`, but `srcx/a` is left alone (returns `None`).
pub fn rebase(path: &str, old: &str, new: &str) -> Option<String> {
    if path == old {
        Some(new.to_string())
    } else if is_within(path, old) {
        Some(format!("{new}{}", &path[old.len()..]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize("/src/main.rs/").unwrap(), "src/main.rs");
    }

    #[test]
    fn normalize_rejects_bad_segments() {
        assert!(normalize("").is_err());
        assert!(normalize("/").is_err());
        assert!(normalize("a//b").is_err());
        assert!(normalize("a/../b").is_err());
        assert!(normalize("./a").is_err());
    }

    #[test]
    fn join_at_root_and_below() {
        assert_eq!(join("", "README.md").unwrap(), "README.md");
        assert_eq!(join("docs", "new.md").unwrap(), "docs/new.md");
        assert!(join("docs", "").is_err());
    }

    #[test]
    fn parent_and_file_name() {
        assert_eq!(parent("src/lib/mod.rs"), "src/lib");
        assert_eq!(parent("README.md"), "");
        assert_eq!(file_name("src/lib/mod.rs"), "mod.rs");
        assert_eq!(file_name("README.md"), "README.md");
    }

    #[test]
    fn within_requires_segment_boundary() {
        assert!(is_within("dir/a.txt", "dir"));
        assert!(!is_within("dir", "dir"));
        assert!(!is_within("dirx/a.txt", "dir"));
    }

    #[test]
    fn rebase_replaces_prefix_only() {
        assert_eq!(rebase("src/a.rs", "src", "lib").as_deref(), Some("lib/a.rs"));
        assert_eq!(rebase("src", "src", "lib").as_deref(), Some("lib"));
        assert_eq!(rebase("srcx/a.rs", "src", "lib"), None);
        assert_eq!(
            rebase("a/src/src.rs", "a/src", "a/lib").as_deref(),
            Some("a/lib/src.rs")
        );
    }

    proptest! {
        #[test]
        fn join_then_split_roundtrips(base in "[a-z]{1,8}(/[a-z]{1,8}){0,3}", name in "[a-z]{1,8}") {
            let joined = join(&base, &name).unwrap();
            prop_assert_eq!(parent(&joined), base.as_str());
            prop_assert_eq!(file_name(&joined), name.as_str());
        }
    }
}

//! Entries of a fetched remote tree.

use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// Whether a tree entry is a leaf file or an intermediate directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// A leaf holding content (a Git blob).
    #[serde(rename = "blob")]
    File,
    /// A directory (a Git tree).
    #[serde(rename = "tree")]
    Directory,
}

impl EntryKind {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Git file mode of a tree entry, serialized as the octal string Git uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    /// Normal file (100644).
    #[default]
    #[serde(rename = "100644")]
    Regular,
    /// Executable file (100755).
    #[serde(rename = "100755")]
    Executable,
    /// Symbolic link (120000).
    #[serde(rename = "120000")]
    Symlink,
    /// Subtree / directory (040000).
    #[serde(rename = "040000")]
    Directory,
}

impl FileMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Parse from the octal string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "100644" => Some(Self::Regular),
            "100755" => Some(Self::Executable),
            "120000" => Some(Self::Symlink),
            "040000" | "40000" => Some(Self::Directory),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// One entry of a flat, recursive remote tree listing.
///
/// Identity is the path: within one snapshot no two entries share a path.
/// Entries are immutable once fetched and are replaced wholesale on resync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    /// Slash-separated path relative to the repository root.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Remote object id of the blob or tree.
    pub content_id: ObjectId,
    /// Git mode; files keep theirs when their content is replaced.
    #[serde(default)]
    pub mode: FileMode,
}

impl RepositoryEntry {
    pub fn new(path: impl Into<String>, kind: EntryKind, content_id: ObjectId) -> Self {
        let mode = match kind {
            EntryKind::File => FileMode::Regular,
            EntryKind::Directory => FileMode::Directory,
        };
        Self {
            path: path.into(),
            kind,
            content_id,
            mode,
        }
    }

    pub fn file(path: impl Into<String>, content_id: ObjectId) -> Self {
        Self::new(path, EntryKind::File, content_id)
    }

    /// Replace the mode, e.g. for executables and symlinks.
    pub fn with_mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn directory(path: impl Into<String>, content_id: ObjectId) -> Self {
        Self::new(path, EntryKind::Directory, content_id)
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_uses_git_names_on_the_wire() {
        assert_eq!(serde_json::to_string(&EntryKind::File).unwrap(), "\"blob\"");
        assert_eq!(
            serde_json::from_str::<EntryKind>("\"tree\"").unwrap(),
            EntryKind::Directory
        );
    }

    #[test]
    fn constructors_set_kind_and_mode() {
        let id = ObjectId::from_bytes(b"x");
        let file = RepositoryEntry::file("a.txt", id.clone());
        assert!(file.is_file());
        assert_eq!(file.mode, FileMode::Regular);
        let dir = RepositoryEntry::directory("src", id.clone());
        assert!(!dir.is_file());
        assert_eq!(dir.mode, FileMode::Directory);
        let tool = RepositoryEntry::file("run.sh", id).with_mode(FileMode::Executable);
        assert_eq!(tool.mode, FileMode::Executable);
    }

    #[test]
    fn mode_serializes_as_octal_string() {
        assert_eq!(
            serde_json::to_string(&FileMode::Regular).unwrap(),
            "\"100644\""
        );
        assert_eq!(FileMode::Directory.to_string(), "040000");
        assert_eq!(FileMode::parse("100755"), Some(FileMode::Executable));
        assert_eq!(FileMode::parse("40000"), Some(FileMode::Directory));
        assert_eq!(FileMode::parse("777"), None);
    }
}

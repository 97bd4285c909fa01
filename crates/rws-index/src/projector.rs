//! Hierarchical folder/file view of the remote tree plus pending changes.
//!
//! [`project`] is a pure function: it owns no state and is re-run after
//! every change, so callers always hold a fresh snapshot.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::overlay::{Overlay, OverlayEntry};
use crate::tree_index::RemoteTreeIndex;

/// Markers shown next to a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NodeFlags {
    /// The overlay holds unpublished content for this file that differs
    /// from the remote blob.
    pub pending_edit: bool,
    /// The file does not exist remotely.
    pub is_new: bool,
}

/// One node of the projected tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectoryNode {
    File {
        path: String,
        flags: NodeFlags,
    },
    Directory {
        path: String,
        children: BTreeMap<String, DirectoryNode>,
    },
}

impl DirectoryNode {
    fn directory(path: String) -> Self {
        Self::Directory {
            path,
            children: BTreeMap::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Full path from the repository root; `""` for the root.
    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Directory { path, .. } => path,
        }
    }

    /// Flags of a file node.
    pub fn flags(&self) -> Option<NodeFlags> {
        match self {
            Self::File { flags, .. } => Some(*flags),
            Self::Directory { .. } => None,
        }
    }

    /// Children in display order: directories first, then files, each group
    /// by name. Empty for files.
    pub fn children(&self) -> Vec<(&str, &DirectoryNode)> {
        let Self::Directory { children, .. } = self else {
            return Vec::new();
        };
        let (mut ordered, files): (Vec<_>, Vec<_>) = children
            .iter()
            .map(|(name, node)| (name.as_str(), node))
            .partition(|(_, node)| node.is_dir());
        ordered.extend(files);
        ordered
    }
}

/// A line of a depth-first walk.
#[derive(Clone, Copy, Debug)]
pub struct TreeLine<'a> {
    pub depth: usize,
    pub name: &'a str,
    pub node: &'a DirectoryNode,
}

/// The projected tree, rooted at the repository root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryTree {
    root: DirectoryNode,
}

impl DirectoryTree {
    pub fn root(&self) -> &DirectoryNode {
        &self.root
    }

    /// Top-level nodes in display order.
    pub fn children(&self) -> Vec<(&str, &DirectoryNode)> {
        self.root.children()
    }

    pub fn is_empty(&self) -> bool {
        self.children().is_empty()
    }

    /// Node at `path`, file or directory.
    pub fn find(&self, path: &str) -> Option<&DirectoryNode> {
        let mut node = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match node {
                DirectoryNode::Directory { children, .. } => node = children.get(segment)?,
                DirectoryNode::File { .. } => return None,
            }
        }
        Some(node)
    }

    /// Depth-first walk in display order, root excluded.
    pub fn walk(&self) -> Vec<TreeLine<'_>> {
        fn visit<'a>(node: &'a DirectoryNode, depth: usize, out: &mut Vec<TreeLine<'a>>) {
            for (name, child) in node.children() {
                out.push(TreeLine {
                    depth,
                    name,
                    node: child,
                });
                visit(child, depth + 1, out);
            }
        }
        let mut lines = Vec::new();
        visit(&self.root, 0, &mut lines);
        lines
    }

    /// File paths in display order.
    pub fn file_paths(&self) -> Vec<&str> {
        self.walk()
            .into_iter()
            .filter(|line| !line.node.is_dir())
            .map(|line| line.node.path())
            .collect()
    }
}

/// Derive the folder/file view of `index` with `overlay` applied.
///
/// Tombstoned leaves are hidden, and directories exist only while some
/// visible leaf lies below them.
pub fn project(index: &RemoteTreeIndex, overlay: &Overlay) -> DirectoryTree {
    let mut root = DirectoryNode::directory(String::new());
    for leaf in overlay.live_leaves(index) {
        let flags = match overlay.get(&leaf) {
            Some(OverlayEntry::Edited(content)) if !index.matches_content(&leaf, content) => {
                NodeFlags {
                    pending_edit: true,
                    is_new: !index.contains_file(&leaf),
                }
            }
            _ => NodeFlags::default(),
        };
        let segments: Vec<&str> = leaf.split('/').collect();
        if let DirectoryNode::Directory { children, .. } = &mut root {
            insert(children, "", &segments, &leaf, flags);
        }
    }
    DirectoryTree { root }
}

fn insert(
    children: &mut BTreeMap<String, DirectoryNode>,
    prefix: &str,
    segments: &[&str],
    leaf: &str,
    flags: NodeFlags,
) {
    let Some((name, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        if children.get(*name).is_some_and(DirectoryNode::is_dir) {
            debug!(path = leaf, "file shadowed by directory of the same name");
            return;
        }
        children.insert(
            (*name).to_string(),
            DirectoryNode::File {
                path: leaf.to_string(),
                flags,
            },
        );
        return;
    }

    let dir_path = if prefix.is_empty() {
        (*name).to_string()
    } else {
        format!("{prefix}/{name}")
    };
    let node = children
        .entry((*name).to_string())
        .or_insert_with(|| DirectoryNode::directory(dir_path.clone()));
    if !node.is_dir() {
        debug!(path = %dir_path, "directory replaces file of the same name");
        *node = DirectoryNode::directory(dir_path.clone());
    }
    if let DirectoryNode::Directory { children, .. } = node {
        insert(children, &dir_path, rest, leaf, flags);
    }
}

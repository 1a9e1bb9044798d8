//! Node types for the in-memory snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Key of the root directory node.
pub const ROOT_SENTINEL: &str = ".";

/// Prefix of the content stored for files that could not be read.
pub const UNREADABLE_PREFIX: &str = "Error reading file";

/// One tracked file at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRepr {
    /// Slash-separated path relative to the watch root.
    pub path: String,
    /// Full text, or a diagnostic message when `unreadable` is set.
    pub content: String,
    pub unreadable: bool,
}

impl FileRepr {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            unreadable: false,
        }
    }

    /// Repr for a file whose read failed.
    pub fn unreadable(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            content: format!("{UNREADABLE_PREFIX}: {reason}"),
            unreadable: true,
        }
    }
}

impl fmt::Display for FileRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File Path: {}\nFile Content: {}", self.path, self.content)
    }
}

/// A directory or a file in the snapshot tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotNode {
    Directory(BTreeMap<String, SnapshotNode>),
    File(Arc<FileRepr>),
}

impl SnapshotNode {
    pub fn empty_dir() -> Self {
        SnapshotNode::Directory(BTreeMap::new())
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, SnapshotNode::Directory(_))
    }

    /// The file repr, if this is a file node.
    pub fn as_file(&self) -> Option<&Arc<FileRepr>> {
        match self {
            SnapshotNode::File(repr) => Some(repr),
            SnapshotNode::Directory(_) => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, SnapshotNode>> {
        match self {
            SnapshotNode::Directory(children) => Some(children),
            SnapshotNode::File(_) => None,
        }
    }

    /// Collect every file below this node, depth first.
    pub(crate) fn collect_files(&self, out: &mut Vec<Arc<FileRepr>>) {
        match self {
            SnapshotNode::File(repr) => out.push(Arc::clone(repr)),
            SnapshotNode::Directory(children) => {
                for child in children.values() {
                    child.collect_files(out);
                }
            }
        }
    }
}

// Files render as their path so a dump never includes file contents.
impl Serialize for SnapshotNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SnapshotNode::Directory(children) => children.serialize(serializer),
            SnapshotNode::File(repr) => serializer.serialize_str(&repr.path),
        }
    }
}

/// Outcome of resolving a path against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a SnapshotNode),
    /// A segment of the path is an excluded name.
    Excluded,
    NotFound,
}

impl<'a> Lookup<'a> {
    /// The file repr if the lookup landed on a file node.
    pub fn file(&self) -> Option<&'a Arc<FileRepr>> {
        match self {
            Lookup::Found(node) => node.as_file(),
            _ => None,
        }
    }
}

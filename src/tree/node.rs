// src/tree/node.rs

use std::sync::Arc;
use std::time::SystemTime;

use crate::uri::Uri;

/// One node of a project snapshot.
///
/// Snapshots are handed out as `Arc<Node>` and never mutated after
/// construction; a new poll produces a new tree. Equality is deep and
/// order-sensitive, which is what change detection compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Directory(DirectoryNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub extension: Option<String>,
    pub uri: Uri,
    pub last_modified: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub name: String,
    pub uri: Uri,
    pub last_modified: SystemTime,
    /// Subdirectories and expandable files; every entry is shared with `files`.
    pub children: Vec<Arc<Node>>,
    /// Every direct child, in listing order.
    pub files: Vec<Arc<Node>>,
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => &f.name,
            Node::Directory(d) => &d.name,
        }
    }

    pub fn uri(&self) -> &Uri {
        match self {
            Node::File(f) => &f.uri,
            Node::Directory(d) => &d.uri,
        }
    }

    pub fn last_modified(&self) -> SystemTime {
        match self {
            Node::File(f) => f.last_modified,
            Node::Directory(d) => d.last_modified,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn extension(&self) -> Option<&str> {
        match self {
            Node::File(f) => f.extension.as_deref(),
            Node::Directory(_) => None,
        }
    }

    /// All direct children; empty for files.
    pub fn files(&self) -> &[Arc<Node>] {
        match self {
            Node::File(_) => &[],
            Node::Directory(d) => &d.files,
        }
    }

    /// Expandable children; empty for files.
    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Node::File(_) => &[],
            Node::Directory(d) => &d.children,
        }
    }

    /// Depth-first lookup by URI, including `self`.
    pub fn find(&self, uri: &Uri) -> Option<&Node> {
        if self.uri() == uri {
            return Some(self);
        }
        self.files().iter().find_map(|child| child.find(uri))
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.files().iter().map(|c| c.node_count()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::ts;

    fn file(path: &str, ext: Option<&str>, secs: u64) -> Arc<Node> {
        Arc::new(Node::File(FileNode {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            extension: ext.map(str::to_string),
            uri: Uri::from_path(path).unwrap(),
            last_modified: ts(secs),
        }))
    }

    fn sample() -> Node {
        let a = file("/proj/a.gltf", Some("gltf"), 1);
        let b = file("/proj/b.txt", Some("txt"), 2);
        Node::Directory(DirectoryNode {
            name: "proj".into(),
            uri: Uri::from_path("/proj").unwrap(),
            last_modified: ts(0),
            children: vec![a.clone()],
            files: vec![a, b],
        })
    }

    #[test]
    fn find_locates_nested_file() {
        let root = sample();
        let uri = Uri::from_path("/proj/b.txt").unwrap();
        let found = root.find(&uri).unwrap();
        assert_eq!(found.name(), "b.txt");
        assert_eq!(found.extension(), Some("txt"));
        assert!(root.find(&Uri::from_path("/proj/c").unwrap()).is_none());
    }

    #[test]
    fn equality_is_deep_and_timestamp_sensitive() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a, b);

        if let Node::Directory(d) = &mut b {
            d.files[1] = file("/proj/b.txt", Some("txt"), 99);
        }
        assert_ne!(a, b);
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = sample();
        let mut b = sample();
        if let Node::Directory(d) = &mut b {
            d.files.reverse();
        }
        assert_ne!(a, b);
    }

    #[test]
    fn node_count_includes_root() {
        assert_eq!(sample().node_count(), 3);
    }
}

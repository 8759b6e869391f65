// src/tree/builder.rs

//! Recursive construction of project snapshots.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::errors::{ProjwatchError, Result};
use crate::fs::{DirEntry, FileSystem};
use crate::tree::node::{DirectoryNode, FileNode, Node};
use crate::tree::ExpandableExtensions;
use crate::uri::Uri;

/// Walks a directory through a [`FileSystem`] and produces a snapshot.
///
/// Building is a pure function of the filesystem state it observes. Entries
/// that disappear between being listed and being stat'd are skipped.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    fs: Arc<dyn FileSystem>,
    expandable: ExpandableExtensions,
}

impl TreeBuilder {
    pub fn new(fs: Arc<dyn FileSystem>, expandable: ExpandableExtensions) -> Self {
        Self { fs, expandable }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Build a snapshot rooted at `root`.
    ///
    /// Fails with a `Build` error wrapping `Access` if the root itself can't be
    /// stat'd or listed, or isn't a directory.
    pub fn build(&self, root: &Path) -> Result<Node> {
        let stat = self
            .fs
            .stat(root)
            .map_err(|e| ProjwatchError::build(root, e))?;
        if !stat.is_dir {
            return Err(ProjwatchError::build(
                root,
                ProjwatchError::access(root, io::Error::other("not a directory")),
            ));
        }

        let dir = self
            .build_directory(root, entry_name(root), stat.modified)
            .map_err(|e| ProjwatchError::build(root, e))?;
        debug!(root = %root.display(), entries = dir.files.len(), "built project tree");
        Ok(Node::Directory(dir))
    }

    fn build_directory(
        &self,
        path: &Path,
        name: String,
        last_modified: SystemTime,
    ) -> Result<DirectoryNode> {
        let mut files = Vec::new();
        let mut children = Vec::new();

        for entry in self.fs.read_dir(path)? {
            let node = match self.build_entry(&entry) {
                Ok(node) => Arc::new(node),
                Err(err) if err.is_access() => {
                    warn!(
                        path = %entry.path.display(),
                        error = %err,
                        "entry vanished during tree build; skipping"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };

            if node.is_directory() || self.expandable.contains(node.extension()) {
                children.push(Arc::clone(&node));
            }
            files.push(node);
        }

        Ok(DirectoryNode {
            name,
            uri: Uri::from_path(path)?,
            last_modified,
            children,
            files,
        })
    }

    fn build_entry(&self, entry: &DirEntry) -> Result<Node> {
        let modified = match entry.modified {
            Some(modified) => modified,
            None => self.fs.stat(&entry.path)?.modified,
        };

        if entry.is_dir {
            let dir = self.build_directory(&entry.path, entry.name.clone(), modified)?;
            return Ok(Node::Directory(dir));
        }

        Ok(Node::File(FileNode {
            name: entry.name.clone(),
            extension: Path::new(&entry.name)
                .extension()
                .map(|e| e.to_string_lossy().into_owned()),
            uri: Uri::from_path(&entry.path)?,
            last_modified: modified,
        }))
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

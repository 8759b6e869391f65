// src/tree/mod.rs

//! Immutable project snapshots.
//!
//! - [`node`] defines the snapshot data model.
//! - [`builder`] walks a directory through a `FileSystem` and produces one.
//! - [`render`] turns a snapshot into indented text for the CLI.

pub mod builder;
pub mod node;
pub mod render;

pub use builder::TreeBuilder;
pub use node::{DirectoryNode, FileNode, Node};
pub use render::render_tree;

/// Extensions listed by default in a directory's `children`.
pub const DEFAULT_EXPANDABLE_EXTENSIONS: &[&str] = &["gltf", "glb"];

/// File extensions eligible for a directory's `children` list.
///
/// Matching is case-insensitive and ignores files without an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandableExtensions {
    extensions: Vec<String>,
}

impl ExpandableExtensions {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| {
            self.extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExpandableExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_EXPANDABLE_EXTENSIONS)
    }
}

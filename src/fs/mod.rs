// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::{ProjwatchError, Result};

pub mod mock;

/// Result of stat'ing a single filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub modified: SystemTime,
    pub is_dir: bool,
}

/// A single entry returned by [`FileSystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    /// Modification time, if the listing already carried it.
    /// When `None`, callers stat the entry themselves.
    pub modified: Option<SystemTime>,
}

/// Abstract filesystem interface.
///
/// All failures are reported as [`ProjwatchError::Access`].
pub trait FileSystem: Send + Sync + Debug {
    fn stat(&self, path: &Path) -> Result<FileStat>;

    /// Return the entries of a directory in the order the platform lists them.
    ///
    /// Symbolic links are never reported as directories, so a tree walk can't
    /// loop through them.
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> Result<FileStat> {
        let meta = fs::metadata(path).map_err(|e| ProjwatchError::access(path, e))?;
        let modified = meta.modified().map_err(|e| ProjwatchError::access(path, e))?;
        Ok(FileStat {
            modified,
            is_dir: meta.is_dir(),
        })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| ProjwatchError::access(path, e))? {
            let entry = entry.map_err(|e| ProjwatchError::access(path, e))?;
            let entry_path = entry.path();
            let is_symlink = entry.file_type().is_ok_and(|t| t.is_symlink());

            // Symlinks are leaves: a link to an ancestor would otherwise be
            // walked until the kernel gives up. Their timestamp is the
            // target's when it resolves, the link's own otherwise.
            let meta = if is_symlink {
                fs::metadata(&entry_path)
                    .or_else(|_| fs::symlink_metadata(&entry_path))
                    .ok()
            } else {
                entry.metadata().ok()
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: !is_symlink && meta.as_ref().is_some_and(|m| m.is_dir()),
                modified: meta.and_then(|m| m.modified().ok()),
                path: entry_path,
            });
        }
        Ok(entries)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).map_err(|e| ProjwatchError::access(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_fs_lists_entries_with_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.gltf"), b"{}").unwrap();
        fs::create_dir(dir.path().join("textures")).unwrap();

        let mut entries = RealFileSystem.read_dir(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.gltf");
        assert!(!entries[0].is_dir);
        assert!(entries[0].modified.is_some());
        assert_eq!(entries[1].name, "textures");
        assert!(entries[1].is_dir);
    }

    #[cfg(unix)]
    #[test]
    fn real_fs_does_not_descend_through_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("textures")).unwrap();
        std::os::unix::fs::symlink(".", dir.path().join("self")).unwrap();
        std::os::unix::fs::symlink("textures", dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink("missing", dir.path().join("broken")).unwrap();

        let mut entries = RealFileSystem.read_dir(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let kinds: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.is_dir)).collect();
        assert_eq!(
            kinds,
            vec![("broken", false), ("linked", false), ("self", false), ("textures", true)]
        );
        assert!(entries.iter().all(|e| e.modified.is_some()));
    }

    #[test]
    fn real_fs_stat_missing_is_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RealFileSystem.stat(&dir.path().join("nope")).unwrap_err();
        assert!(err.is_access());
    }
}

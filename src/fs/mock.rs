// src/fs/mock.rs

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use super::{DirEntry, FileStat, FileSystem};
use crate::errors::{ProjwatchError, Result};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { modified: SystemTime },
    Dir { modified: SystemTime, children: Vec<String> }, // child names, listing order
}

impl MockEntry {
    fn modified(&self) -> SystemTime {
        match self {
            MockEntry::File { modified } | MockEntry::Dir { modified, .. } => *modified,
        }
    }
}

/// In-memory filesystem keyed by absolute path.
///
/// Directory listings preserve insertion order. Timestamps are explicit so
/// tests control exactly when something counts as modified.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    /// Number of `stat` calls, for asserting on redundant work.
    stats: Arc<Mutex<usize>>,
}

/// Timestamp `secs` seconds after the epoch.
pub fn ts(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn add_dir(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        Self::link_into_parent(&mut entries, &path, modified);
        match entries.get_mut(&path) {
            Some(MockEntry::Dir { modified: m, .. }) => *m = modified,
            _ => {
                entries.insert(
                    path,
                    MockEntry::Dir {
                        modified,
                        children: Vec::new(),
                    },
                );
            }
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        Self::link_into_parent(&mut entries, &path, modified);
        entries.insert(path, MockEntry::File { modified });
    }

    /// Update the modification time of an existing entry.
    pub fn touch(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let mut entries = self.lock();
        match entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified: m }) | Some(MockEntry::Dir { modified: m, .. }) => {
                *m = modified;
            }
            None => {}
        }
    }

    /// Remove an entry (and everything below it) and unlink it from its parent.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.lock();
        entries.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(MockEntry::Dir { children, .. }) = entries.get_mut(parent) {
                let name = name.to_string_lossy();
                children.retain(|c| *c != name);
            }
        }
    }

    /// Move a single file to a new path, keeping its timestamp.
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) {
        let modified = match self.lock().get(from.as_ref()) {
            Some(entry) => entry.modified(),
            None => return,
        };
        self.remove(from);
        self.add_file(to, modified);
    }

    /// List `name` under `dir` without creating a backing entry, so the name
    /// shows up in a listing but cannot be stat'd.
    pub fn add_dangling_entry(&self, dir: impl AsRef<Path>, name: &str) {
        let mut entries = self.lock();
        if let Some(MockEntry::Dir { children, .. }) = entries.get_mut(dir.as_ref()) {
            children.push(name.to_string());
        }
    }

    pub fn stat_calls(&self) -> usize {
        *self.stats.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn link_into_parent(
        entries: &mut HashMap<PathBuf, MockEntry>,
        path: &Path,
        modified: SystemTime,
    ) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        if parent.as_os_str().is_empty() {
            return;
        }
        if !entries.contains_key(parent) {
            Self::link_into_parent(entries, parent, modified);
            entries.insert(
                parent.to_path_buf(),
                MockEntry::Dir {
                    modified,
                    children: Vec::new(),
                },
            );
        }
        if let Some(MockEntry::Dir { children, .. }) = entries.get_mut(parent) {
            let name = name.to_string_lossy().into_owned();
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }
}

fn not_found(path: &Path) -> ProjwatchError {
    ProjwatchError::access(path, io::Error::from(io::ErrorKind::NotFound))
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> Result<FileStat> {
        *self.stats.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        let entries = self.lock();
        match entries.get(path) {
            Some(entry) => Ok(FileStat {
                modified: entry.modified(),
                is_dir: matches!(entry, MockEntry::Dir { .. }),
            }),
            None => Err(not_found(path)),
        }
    }

    /// Entries carry no timestamp so the tree builder has to stat each one,
    /// the same way a bare directory listing behaves.
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = self.lock();
        match entries.get(path) {
            Some(MockEntry::Dir { children, .. }) => Ok(children
                .iter()
                .map(|name| {
                    let child = path.join(name);
                    DirEntry {
                        name: name.clone(),
                        is_dir: matches!(entries.get(&child), Some(MockEntry::Dir { .. })),
                        path: child,
                        modified: None,
                    }
                })
                .collect()),
            Some(MockEntry::File { .. }) => Err(ProjwatchError::access(
                path,
                io::Error::other("not a directory"),
            )),
            None => Err(not_found(path)),
        }
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Mock paths are already absolute.
        if self.lock().contains_key(path) {
            Ok(path.to_path_buf())
        } else {
            Err(not_found(path))
        }
    }
}

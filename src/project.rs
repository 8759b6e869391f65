// src/project.rs

//! The watcher for a single project directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::fs::FileSystem;
use crate::tree::{ExpandableExtensions, Node, TreeBuilder};
use crate::uri::Uri;
use crate::watch::{
    ChangeDetector, FileChangedHandler, FileWatchRegistry, PollTiming, SubscriptionLifecycle,
    TickOutcome, TreeChangedHandler, TreeListeners,
};

/// Knobs for a [`ProjectWatcher`], usually produced from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOptions {
    pub timing: PollTiming,
    pub expandable: ExpandableExtensions,
}

/// Watches one project directory.
///
/// This wires together:
/// - a [`TreeBuilder`] over the injected filesystem
/// - the [`ChangeDetector`] holding the cached snapshot and polling timer
/// - the [`SubscriptionLifecycle`] deciding when polling runs
/// - the [`FileWatchRegistry`] for per-file watches
///
/// Dropping the watcher closes it.
#[derive(Debug)]
pub struct ProjectWatcher {
    root: PathBuf,
    root_uri: Uri,
    lifecycle: Arc<SubscriptionLifecycle>,
    registry: FileWatchRegistry,
}

impl ProjectWatcher {
    /// Create a watcher for `root`. Nothing is read until the tree is
    /// requested or someone subscribes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        root: impl AsRef<Path>,
        options: WatchOptions,
    ) -> Result<Self> {
        let root = fs.canonicalize(root.as_ref())?;
        let root_uri = Uri::from_path(&root)?;

        let listeners = TreeListeners::new();
        let builder = TreeBuilder::new(Arc::clone(&fs), options.expandable);
        let detector = ChangeDetector::new(builder, root.clone(), options.timing, listeners.clone())?;
        let lifecycle = Arc::new(SubscriptionLifecycle::new(listeners, detector));
        let registry = FileWatchRegistry::new(fs, Arc::clone(&lifecycle));

        debug!(root = %root.display(), "project watcher created");
        Ok(Self {
            root,
            root_uri,
            lifecycle,
            registry,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn root_uri(&self) -> &Uri {
        &self.root_uri
    }

    /// Return the project tree.
    ///
    /// The cached snapshot is returned unless `force_rebuild` is set or none
    /// has been built yet. A forced rebuild replaces the cache without
    /// notifying subscribers.
    pub async fn build_tree(&self, force_rebuild: bool) -> Result<Arc<Node>> {
        let detector = self.detector().clone();
        if !force_rebuild {
            if let Some(tree) = detector.snapshot() {
                return Ok(tree);
            }
        }

        tokio::task::spawn_blocking(move || detector.rebuild())
            .await
            .map_err(Error::from)?
    }

    pub fn on_tree_changed(&self, handler: TreeChangedHandler) {
        self.lifecycle.subscribe(handler);
    }

    /// Returns `false` if `handler` wasn't subscribed.
    pub fn off_tree_changed(&self, handler: &TreeChangedHandler) -> bool {
        self.lifecycle.unsubscribe(handler)
    }

    pub fn watch_file(&self, uri: &Uri, handler: FileChangedHandler) -> Result<()> {
        self.registry.watch_file(uri, handler)
    }

    pub fn unwatch_file(&self, uri: &Uri, handler: &FileChangedHandler) {
        self.registry.unwatch_file(uri, handler);
    }

    /// Run one poll tick now on the calling thread.
    pub fn check_now(&self) -> TickOutcome {
        self.detector().check_now()
    }

    /// Number of tree-changed subscriptions, counting the file registry as one
    /// while it watches anything.
    pub fn tree_subscriber_count(&self) -> usize {
        self.lifecycle.subscriber_count()
    }

    pub fn is_polling(&self) -> bool {
        self.detector().is_running()
    }

    pub fn registry(&self) -> &FileWatchRegistry {
        &self.registry
    }

    /// Cancel polling and drop every subscription. Idempotent.
    pub fn close(&self) {
        self.registry.clear();
        self.lifecycle.close();
        info!(root = %self.root.display(), "project watcher closed");
    }

    fn detector(&self) -> &ChangeDetector {
        self.lifecycle.detector()
    }
}

impl Drop for ProjectWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::{ts, MockFileSystem};

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj", ts(0));
        fs.add_file("/proj/a.gltf", ts(1));
        fs.add_file("/proj/b.txt", ts(2));
        fs
    }

    #[tokio::test]
    async fn build_tree_returns_cached_snapshot() {
        let fs = project();
        let watcher = ProjectWatcher::new(Arc::new(fs.clone()), "/proj", WatchOptions::default()).unwrap();

        let first = watcher.build_tree(false).await.unwrap();
        fs.touch("/proj/b.txt", ts(50));
        let second = watcher.build_tree(false).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let forced = watcher.build_tree(true).await.unwrap();
        assert_ne!(first, forced);
        assert_eq!(forced.files()[1].last_modified(), ts(50));
    }

    #[tokio::test]
    async fn missing_root_fails_on_construction() {
        let fs = MockFileSystem::new();
        let err = ProjectWatcher::new(Arc::new(fs), "/nope", WatchOptions::default()).unwrap_err();
        assert!(err.is_access());
    }

    #[tokio::test]
    async fn close_with_no_watches_is_safe() {
        let watcher = ProjectWatcher::new(Arc::new(project()), "/proj", WatchOptions::default()).unwrap();
        watcher.close();
        watcher.close();
        assert!(!watcher.is_polling());
    }
}

// src/watch/registry.rs

//! Per-file watches layered on tree-changed notifications.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::SystemTime;

use tracing::{debug, trace};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::uri::Uri;
use crate::watch::{FileChangedHandler, FileSignal, SubscriptionLifecycle, TreeChangedHandler};

/// Callbacks and last-known modification time for one watched file.
struct WatchRegistration {
    callbacks: Vec<FileChangedHandler>,
    last_modified: SystemTime,
    /// Set once `Removed` has been reported, so it isn't repeated every tick.
    reported_removed: bool,
}

#[derive(Default)]
struct RegistryState {
    registrations: BTreeMap<Uri, WatchRegistration>,
    /// Our own tree-changed subscription, present while any file is watched.
    subscription: Option<TreeChangedHandler>,
}

struct RegistryInner {
    fs: Arc<dyn FileSystem>,
    lifecycle: Arc<SubscriptionLifecycle>,
    state: Mutex<RegistryState>,
}

/// Lets callers watch individual files.
///
/// The registry never polls on its own: it subscribes to tree-changed
/// notifications while at least one file is watched and re-stats every
/// watched file whenever the tree changes.
#[derive(Clone)]
pub struct FileWatchRegistry {
    inner: Arc<RegistryInner>,
}

impl fmt::Debug for FileWatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("FileWatchRegistry")
            .field("watched", &state.registrations.keys().collect::<Vec<_>>())
            .field("subscribed", &state.subscription.is_some())
            .finish()
    }
}

impl FileWatchRegistry {
    pub fn new(fs: Arc<dyn FileSystem>, lifecycle: Arc<SubscriptionLifecycle>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                fs,
                lifecycle,
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    /// Register `callback` for `uri`.
    ///
    /// The first registration for a URI stats the file to record its baseline
    /// timestamp and fails with an access error if the file doesn't exist.
    pub fn watch_file(&self, uri: &Uri, callback: FileChangedHandler) -> Result<()> {
        let mut state = self.inner.lock();

        if let Some(registration) = state.registrations.get_mut(uri) {
            registration.callbacks.push(callback);
            debug!(%uri, callbacks = registration.callbacks.len(), "added file watch callback");
            return Ok(());
        }

        let path = uri.to_path()?;
        let stat = self.inner.fs.stat(&path)?;
        state.registrations.insert(
            uri.clone(),
            WatchRegistration {
                callbacks: vec![callback],
                last_modified: stat.modified,
                reported_removed: false,
            },
        );
        debug!(%uri, "watching file");

        if state.subscription.is_none() {
            let handler = self.tree_changed_handler();
            state.subscription = Some(Arc::clone(&handler));
            self.inner.lifecycle.subscribe(handler);
        }
        Ok(())
    }

    /// Remove the first registration of `callback` for `uri`.
    ///
    /// Unknown URIs and callbacks are ignored.
    pub fn unwatch_file(&self, uri: &Uri, callback: &FileChangedHandler) {
        let mut state = self.inner.lock();

        let Some(registration) = state.registrations.get_mut(uri) else {
            return;
        };
        if let Some(pos) = registration
            .callbacks
            .iter()
            .position(|c| Arc::ptr_eq(c, callback))
        {
            registration.callbacks.remove(pos);
        }
        if registration.callbacks.is_empty() {
            state.registrations.remove(uri);
            debug!(%uri, "stopped watching file");
        }

        if state.registrations.is_empty() {
            if let Some(handler) = state.subscription.take() {
                self.inner.lifecycle.unsubscribe(&handler);
            }
        }
    }

    /// Drop every watch and the tree-changed subscription.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.registrations.clear();
        if let Some(handler) = state.subscription.take() {
            self.inner.lifecycle.unsubscribe(&handler);
        }
    }

    pub fn watched_count(&self) -> usize {
        self.inner.lock().registrations.len()
    }

    pub fn is_watching(&self, uri: &Uri) -> bool {
        self.inner.lock().registrations.contains_key(uri)
    }

    /// Whether the registry currently holds a tree-changed subscription.
    pub fn is_subscribed(&self) -> bool {
        self.inner.lock().subscription.is_some()
    }

    /// Re-stat every watched file and fire callbacks.
    ///
    /// Normally driven by tree-changed notifications.
    pub fn recheck(&self) {
        self.inner.recheck();
    }

    fn tree_changed_handler(&self) -> TreeChangedHandler {
        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        Arc::new(move |_tree| {
            if let Some(inner) = weak.upgrade() {
                inner.recheck();
            }
        })
    }
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn recheck(&self) {
        let pending = self.collect_signals();

        // Callbacks run without the lock so they can unwatch themselves.
        for (uri, signal, callbacks) in pending {
            debug!(%uri, %signal, callbacks = callbacks.len(), "file watch fired");
            for callback in callbacks {
                callback(signal, &uri);
            }
        }
    }

    fn collect_signals(&self) -> Vec<(Uri, FileSignal, Vec<FileChangedHandler>)> {
        let mut state = self.lock();
        let mut pending = Vec::new();

        for (uri, registration) in state.registrations.iter_mut() {
            let Ok(path) = uri.to_path() else {
                continue;
            };

            let signal = match self.fs.stat(&path) {
                Ok(stat) => {
                    registration.reported_removed = false;
                    if stat.modified == registration.last_modified {
                        trace!(%uri, "watched file unchanged");
                        continue;
                    }
                    registration.last_modified = stat.modified;
                    FileSignal::Changed
                }
                Err(_) if registration.reported_removed => continue,
                Err(_) => {
                    registration.reported_removed = true;
                    FileSignal::Removed
                }
            };

            pending.push((uri.clone(), signal, registration.callbacks.clone()));
        }

        pending
    }
}

// src/watch/listeners.rs

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::tree::Node;
use crate::watch::TreeChangedHandler;

/// Ordered list of tree-changed handlers, shared between the lifecycle (which
/// edits it) and the detector (which notifies it).
#[derive(Clone, Default)]
pub struct TreeListeners {
    handlers: Arc<Mutex<Vec<TreeChangedHandler>>>,
}

impl fmt::Debug for TreeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeListeners")
            .field("len", &self.len())
            .finish()
    }
}

impl TreeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<TreeChangedHandler>> {
        self.handlers.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invoke every handler in subscription order.
    ///
    /// The list is cloned first so handlers may subscribe or unsubscribe
    /// while being notified; such edits take effect on the next notification.
    pub fn notify(&self, tree: &Arc<Node>) {
        let handlers = self.lock().clone();
        for handler in handlers {
            handler(tree);
        }
    }
}

/// Remove the first handler that is the same allocation as `handler`.
pub(crate) fn remove_first(
    handlers: &mut Vec<TreeChangedHandler>,
    handler: &TreeChangedHandler,
) -> bool {
    match handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
        Some(pos) => {
            handlers.remove(pos);
            true
        }
        None => false,
    }
}

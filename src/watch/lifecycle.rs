// src/watch/lifecycle.rs

use tracing::debug;

use crate::watch::listeners::remove_first;
use crate::watch::{ChangeDetector, TreeChangedHandler, TreeListeners};

/// Ties the detector's run state to the number of tree-changed subscribers.
///
/// The first subscriber starts polling and the last one leaving stops it.
/// Subscriber list edits and detector start/stop happen under the same lock,
/// so concurrent subscribe/unsubscribe can't leave the timer in the wrong
/// state.
#[derive(Debug)]
pub struct SubscriptionLifecycle {
    listeners: TreeListeners,
    detector: ChangeDetector,
}

impl SubscriptionLifecycle {
    /// `listeners` must be the same list the detector notifies.
    pub fn new(listeners: TreeListeners, detector: ChangeDetector) -> Self {
        Self {
            listeners,
            detector,
        }
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn subscribe(&self, handler: TreeChangedHandler) {
        let mut handlers = self.listeners.lock();
        handlers.push(handler);
        debug!(subscribers = handlers.len(), "tree-changed subscriber added");
        if handlers.len() == 1 {
            self.detector.start();
        }
    }

    /// Remove the first subscription made with this exact handler.
    ///
    /// Returns `false` if the handler wasn't subscribed.
    pub fn unsubscribe(&self, handler: &TreeChangedHandler) -> bool {
        let mut handlers = self.listeners.lock();
        if !remove_first(&mut handlers, handler) {
            return false;
        }
        debug!(subscribers = handlers.len(), "tree-changed subscriber removed");
        if handlers.is_empty() {
            self.detector.stop();
        }
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stop polling and drop every subscriber. Safe to call repeatedly.
    pub fn close(&self) {
        let mut handlers = self.listeners.lock();
        handlers.clear();
        self.detector.stop();
    }
}

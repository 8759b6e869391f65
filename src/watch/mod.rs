// src/watch/mod.rs

//! Polling-based change detection.
//!
//! This module is responsible for:
//! - Periodically rebuilding the project snapshot and diffing it against the
//!   previous one ([`detector`]).
//! - Arming and disarming the polling timer depending on whether anybody is
//!   listening ([`lifecycle`]).
//! - Per-file watches layered on top of tree-changed notifications
//!   ([`registry`]).
//!
//! There is no OS-level notification here; everything is driven by polling.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::tree::Node;
use crate::uri::Uri;

pub mod detector;
pub mod lifecycle;
pub mod listeners;
pub mod registry;

pub use detector::{ChangeDetector, TickOutcome};
pub use lifecycle::SubscriptionLifecycle;
pub use listeners::TreeListeners;
pub use registry::FileWatchRegistry;

/// Callback for tree-changed notifications.
///
/// Handlers are compared by pointer identity when unsubscribing, so keep a
/// clone of the `Arc` you subscribed with.
pub type TreeChangedHandler = Arc<dyn Fn(&Arc<Node>) + Send + Sync>;

/// Callback for per-file notifications.
pub type FileChangedHandler = Arc<dyn Fn(FileSignal, &Uri) + Send + Sync>;

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSignal {
    /// The modification time differs from the last one observed.
    Changed,
    /// The file can no longer be stat'd.
    Removed,
}

impl fmt::Display for FileSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSignal::Changed => f.write_str("changed"),
            FileSignal::Removed => f.write_str("removed"),
        }
    }
}

/// Polling cadence.
///
/// The first tick after the detector starts uses `initial_delay` so changes
/// made right after subscribing are picked up quickly; later ticks use
/// `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            interval: Duration::from_millis(5000),
        }
    }
}

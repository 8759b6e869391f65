// src/watch/detector.rs

//! Periodic rebuild-and-diff of the project snapshot.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};
use crate::tree::{Node, TreeBuilder};
use crate::watch::{PollTiming, TreeListeners};

/// Result of a single poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The new snapshot differs; listeners were notified.
    Changed,
    Unchanged,
    /// No snapshot existed yet; the new one was stored without notifying.
    Baseline,
    /// The rebuild failed; treated as no change.
    Failed,
    /// The detector was stopped while this tick was in flight.
    Cancelled,
}

/// Owns the current snapshot and the polling timer.
///
/// Only [`SubscriptionLifecycle`](crate::watch::SubscriptionLifecycle) is
/// expected to call [`start`](Self::start) / [`stop`](Self::stop).
#[derive(Clone)]
pub struct ChangeDetector {
    shared: Arc<DetectorShared>,
}

struct DetectorShared {
    builder: TreeBuilder,
    root: PathBuf,
    timing: PollTiming,
    listeners: TreeListeners,
    runtime: Handle,
    state: Mutex<DetectorState>,
}

#[derive(Default)]
struct DetectorState {
    snapshot: Option<Arc<Node>>,
    /// Bumped on every snapshot store; a build that started before a store
    /// must not overwrite it.
    version: u64,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every start/stop; a tick carrying an older value is stale.
    generation: u64,
}

impl DetectorState {
    fn store(&mut self, tree: Arc<Node>) {
        self.snapshot = Some(tree);
        self.version += 1;
    }
}

impl fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("root", &self.shared.root)
            .field("timing", &self.shared.timing)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl ChangeDetector {
    /// Create an idle detector.
    ///
    /// Must be called from within a Tokio runtime; the polling task is spawned
    /// onto that runtime when the detector starts.
    pub fn new(
        builder: TreeBuilder,
        root: impl Into<PathBuf>,
        timing: PollTiming,
        listeners: TreeListeners,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(Error::from)?;
        Ok(Self {
            shared: Arc::new(DetectorShared {
                builder,
                root: root.into(),
                timing,
                listeners,
                runtime,
                state: Mutex::new(DetectorState::default()),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    /// The last snapshot built, if any.
    pub fn snapshot(&self) -> Option<Arc<Node>> {
        self.shared.lock().snapshot.clone()
    }

    /// Build a fresh snapshot and store it without notifying anyone.
    ///
    /// If a tick stored a snapshot while this build was running, that one is
    /// newer: it is kept and returned instead.
    pub fn rebuild(&self) -> Result<Arc<Node>> {
        let version = self.shared.lock().version;
        let tree = Arc::new(self.shared.builder.build(&self.shared.root)?);

        let mut state = self.shared.lock();
        if state.version != version {
            if let Some(current) = &state.snapshot {
                debug!("snapshot replaced during rebuild; keeping the newer one");
                return Ok(Arc::clone(current));
            }
        }
        state.store(Arc::clone(&tree));
        Ok(tree)
    }

    /// Arm the polling timer. No-op if already running.
    ///
    /// Never touches the filesystem on the calling thread. If no snapshot is
    /// cached, the polling task builds a baseline on the blocking pool before
    /// its first delay, so the first tick compares against the state at
    /// subscription time.
    pub fn start(&self) {
        let mut state = self.shared.lock();
        if state.timer.is_some() {
            return;
        }

        state.generation += 1;
        let generation = state.generation;
        let shared = Arc::clone(&self.shared);
        state.timer = Some(self.shared.runtime.spawn(shared.run(generation)));

        info!(
            root = %self.shared.root.display(),
            initial_delay = ?self.shared.timing.initial_delay,
            interval = ?self.shared.timing.interval,
            "change detector started"
        );
    }

    /// Cancel the pending timer. No-op if not running.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
            state.generation += 1;
            info!(root = %self.shared.root.display(), "change detector stopped");
        }
    }

    /// Run one tick on the calling thread, regardless of the timer.
    pub fn check_now(&self) -> TickOutcome {
        self.shared.tick(None)
    }
}

impl DetectorShared {
    fn lock(&self) -> MutexGuard<'_, DetectorState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    async fn run(self: Arc<Self>, generation: u64) {
        if self.lock().snapshot.is_none() {
            let shared = Arc::clone(&self);
            if let Err(err) = tokio::task::spawn_blocking(move || shared.baseline(generation)).await {
                warn!(error = %err, "baseline build panicked or was cancelled");
            }
        }

        let mut delay = self.timing.initial_delay;
        loop {
            tokio::time::sleep(delay).await;
            delay = self.timing.interval;

            // Ticks stat the filesystem synchronously, so keep them off the
            // async workers. The next sleep only starts once this one is done.
            let shared = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || shared.tick(Some(generation))).await {
                Ok(TickOutcome::Cancelled) => break,
                Ok(outcome) => debug!(?outcome, "poll tick finished"),
                Err(err) => warn!(error = %err, "poll tick panicked or was cancelled"),
            }
        }
        debug!(generation, "poll loop exited");
    }

    /// Store a first snapshot unless one appeared in the meantime.
    fn baseline(&self, generation: u64) {
        let tree = match self.builder.build(&self.root) {
            Ok(tree) => Arc::new(tree),
            Err(err) => {
                warn!(error = %err, "failed to build baseline snapshot");
                return;
            }
        };

        let mut state = self.lock();
        if state.generation == generation && state.snapshot.is_none() {
            state.store(tree);
            debug!(root = %self.root.display(), "baseline snapshot stored");
        }
    }

    fn tick(&self, generation: Option<u64>) -> TickOutcome {
        if self.is_stale(generation) {
            return TickOutcome::Cancelled;
        }

        let version = self.lock().version;
        let tree = match self.builder.build(&self.root) {
            Ok(tree) => Arc::new(tree),
            Err(err) => {
                warn!(error = %err, "poll rebuild failed; treating as unchanged");
                return TickOutcome::Failed;
            }
        };

        match self.store_if_changed(&tree, generation, version) {
            TickOutcome::Changed => self.emit(&tree, generation),
            outcome => outcome,
        }
    }

    fn store_if_changed(&self, tree: &Arc<Node>, generation: Option<u64>, version: u64) -> TickOutcome {
        let mut state = self.lock();
        if generation.is_some_and(|g| g != state.generation) {
            return TickOutcome::Cancelled;
        }
        let Some(previous) = state.snapshot.as_deref() else {
            state.store(Arc::clone(tree));
            return TickOutcome::Baseline;
        };
        if previous == &**tree {
            return TickOutcome::Unchanged;
        }
        if state.version != version {
            // Someone stored a snapshot built no earlier than ours.
            debug!("snapshot replaced during tick; dropping this build");
            return TickOutcome::Unchanged;
        }
        state.store(Arc::clone(tree));
        TickOutcome::Changed
    }

    fn emit(&self, tree: &Arc<Node>, generation: Option<u64>) -> TickOutcome {
        // stop() may have landed after the snapshot was stored.
        if self.is_stale(generation) {
            return TickOutcome::Cancelled;
        }
        debug!(root = %self.root.display(), "project tree changed");
        self.listeners.notify(tree);
        TickOutcome::Changed
    }

    fn is_stale(&self, generation: Option<u64>) -> bool {
        generation.is_some_and(|g| g != self.lock().generation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::fs::mock::{ts, MockFileSystem};
    use crate::tree::ExpandableExtensions;
    use crate::uri::Uri;
    use crate::watch::TreeChangedHandler;

    fn detector(fs: &MockFileSystem, listeners: TreeListeners) -> ChangeDetector {
        let builder = TreeBuilder::new(Arc::new(fs.clone()), ExpandableExtensions::default());
        let timing = PollTiming {
            initial_delay: Duration::from_millis(10),
            interval: Duration::from_millis(50),
        };
        ChangeDetector::new(builder, "/proj", timing, listeners).unwrap()
    }

    fn counting(listeners: &TreeListeners) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handler: TreeChangedHandler = Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        listeners.lock().push(handler);
        count
    }

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj", ts(0));
        fs.add_file("/proj/a.gltf", ts(1));
        fs.add_file("/proj/b.txt", ts(2));
        fs
    }

    #[tokio::test]
    async fn unchanged_tree_does_not_notify() {
        let fs = project();
        let listeners = TreeListeners::new();
        let count = counting(&listeners);
        let detector = detector(&fs, listeners);

        detector.rebuild().unwrap();
        assert_eq!(detector.check_now(), TickOutcome::Unchanged);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn timestamp_change_notifies_once() {
        let fs = project();
        let listeners = TreeListeners::new();
        let count = counting(&listeners);
        let detector = detector(&fs, listeners);

        detector.rebuild().unwrap();
        fs.touch("/proj/b.txt", ts(100));

        assert_eq!(detector.check_now(), TickOutcome::Changed);
        assert_eq!(detector.check_now(), TickOutcome::Unchanged);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous_snapshot() {
        let fs = project();
        let listeners = TreeListeners::new();
        let count = counting(&listeners);
        let detector = detector(&fs, listeners);

        let before = detector.rebuild().unwrap();
        fs.remove("/proj");

        assert_eq!(detector.check_now(), TickOutcome::Failed);
        assert_eq!(detector.snapshot().unwrap(), before);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let fs = project();
        let detector = detector(&fs, TreeListeners::new());

        detector.start();
        detector.start();
        assert!(detector.is_running());

        detector.stop();
        detector.stop();
        assert!(!detector.is_running());
    }

    #[tokio::test]
    async fn start_builds_the_baseline_on_the_polling_task() {
        let fs = project();
        let listeners = TreeListeners::new();
        let count = counting(&listeners);
        let detector = detector(&fs, listeners);

        detector.start();
        assert_eq!(fs.stat_calls(), 0, "nothing read on the caller's thread");
        assert!(detector.snapshot().is_none());

        for _ in 0..200 {
            if detector.snapshot().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(detector.snapshot().is_some(), "baseline stored by the polling task");
        assert_eq!(count.load(Ordering::SeqCst), 0);
        detector.stop();
    }

    #[tokio::test]
    async fn first_manual_tick_only_stores_a_baseline() {
        let fs = project();
        let listeners = TreeListeners::new();
        let count = counting(&listeners);
        let detector = detector(&fs, listeners);

        assert_eq!(detector.check_now(), TickOutcome::Baseline);
        fs.touch("/proj/b.txt", ts(100));
        assert_eq!(detector.check_now(), TickOutcome::Changed);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rebuild_racing_a_tick_keeps_the_newer_snapshot() {
        /// Runs a hook right after the first stat of `trigger`, so a tick can
        /// complete while a rebuild is mid-walk with stale data in hand.
        struct Interleaved {
            inner: MockFileSystem,
            trigger: &'static str,
            hook: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
        }

        impl fmt::Debug for Interleaved {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct("Interleaved").field("trigger", &self.trigger).finish()
            }
        }

        impl crate::fs::FileSystem for Interleaved {
            fn stat(&self, path: &Path) -> Result<crate::fs::FileStat> {
                let stat = self.inner.stat(path);
                if path == Path::new(self.trigger) {
                    let hook = self.hook.lock().unwrap().take();
                    if let Some(hook) = hook {
                        hook();
                    }
                }
                stat
            }
            fn read_dir(&self, path: &Path) -> Result<Vec<crate::fs::DirEntry>> {
                self.inner.read_dir(path)
            }
            fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
                self.inner.canonicalize(path)
            }
        }

        let fs = project();
        let hook: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>> = Arc::default();
        let interleaved = Interleaved {
            inner: fs.clone(),
            trigger: "/proj/b.txt",
            hook: Arc::clone(&hook),
        };
        let listeners = TreeListeners::new();
        let count = counting(&listeners);
        let builder = TreeBuilder::new(Arc::new(interleaved), ExpandableExtensions::default());
        let detector =
            ChangeDetector::new(builder, "/proj", PollTiming::default(), listeners).unwrap();

        detector.rebuild().unwrap();
        {
            let fs = fs.clone();
            let detector = detector.clone();
            *hook.lock().unwrap() = Some(Box::new(move || {
                fs.touch("/proj/b.txt", ts(100));
                assert_eq!(detector.check_now(), TickOutcome::Changed);
            }));
        }

        let rebuilt = detector.rebuild().unwrap();
        let b = Uri::from_path("/proj/b.txt").unwrap();

        assert_eq!(rebuilt.find(&b).unwrap().last_modified(), ts(100));
        assert_eq!(detector.check_now(), TickOutcome::Unchanged);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_after_store_suppresses_the_emit() {
        let fs = project();
        let listeners = TreeListeners::new();
        let count = counting(&listeners);
        let detector = detector(&fs, listeners);

        detector.rebuild().unwrap();
        detector.start();
        let generation = detector.shared.lock().generation;
        let version = detector.shared.lock().version;

        fs.touch("/proj/b.txt", ts(100));
        let tree = Arc::new(detector.shared.builder.build(Path::new("/proj")).unwrap());
        assert_eq!(
            detector.shared.store_if_changed(&tree, Some(generation), version),
            TickOutcome::Changed
        );
        detector.stop();

        assert_eq!(detector.shared.emit(&tree, Some(generation)), TickOutcome::Cancelled);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_generation_is_cancelled() {
        let fs = project();
        let detector = detector(&fs, TreeListeners::new());

        detector.start();
        let generation = detector.shared.lock().generation;
        detector.stop();

        assert_eq!(detector.shared.tick(Some(generation)), TickOutcome::Cancelled);
    }

    #[test]
    fn new_outside_runtime_is_an_error() {
        let fs = project();
        let builder = TreeBuilder::new(Arc::new(fs), ExpandableExtensions::default());
        let result = ChangeDetector::new(builder, "/proj", PollTiming::default(), TreeListeners::new());
        assert!(result.is_err());
    }
}

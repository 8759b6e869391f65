use std::sync::Arc;
use std::time::Duration;

use projwatch::fs::mock::{ts, MockFileSystem};
use projwatch::uri::Uri;
use projwatch::watch::PollTiming;
use projwatch::{ProjectWatcher, WatchOptions};

/// Builder for a `MockFileSystem` holding one project directory.
///
/// Paths passed to `file` / `dir` are relative to the project root.
pub struct MockProjectBuilder {
    root: String,
    fs: MockFileSystem,
}

impl MockProjectBuilder {
    pub fn new(root: &str) -> Self {
        let fs = MockFileSystem::new();
        fs.add_dir(root, ts(0));
        Self {
            root: root.trim_end_matches('/').to_string(),
            fs,
        }
    }

    pub fn file(self, rel: &str, secs: u64) -> Self {
        self.fs.add_file(format!("{}/{}", self.root, rel), ts(secs));
        self
    }

    pub fn dir(self, rel: &str, secs: u64) -> Self {
        self.fs.add_dir(format!("{}/{}", self.root, rel), ts(secs));
        self
    }

    pub fn build(self) -> MockProject {
        MockProject {
            root: self.root,
            fs: self.fs,
        }
    }
}

/// A mock project: the filesystem plus helpers addressing it by relative path.
#[derive(Clone)]
pub struct MockProject {
    pub root: String,
    pub fs: MockFileSystem,
}

impl MockProject {
    pub fn path(&self, rel: &str) -> String {
        format!("{}/{}", self.root, rel)
    }

    pub fn uri(&self, rel: &str) -> Uri {
        Uri::from_path(self.path(rel)).expect("mock paths are absolute")
    }

    pub fn touch(&self, rel: &str, secs: u64) {
        self.fs.touch(self.path(rel), ts(secs));
    }

    pub fn add_file(&self, rel: &str, secs: u64) {
        self.fs.add_file(self.path(rel), ts(secs));
    }

    pub fn remove(&self, rel: &str) {
        self.fs.remove(self.path(rel));
    }

    pub fn rename(&self, from: &str, to: &str) {
        self.fs.rename(self.path(from), self.path(to));
    }

    /// Watcher with the default whitelist and the given timing.
    ///
    /// Nothing is read until a subscriber or `build_tree` asks for it.
    pub fn cold_watcher(&self, timing: PollTiming) -> ProjectWatcher {
        ProjectWatcher::new(
            Arc::new(self.fs.clone()),
            &self.root,
            WatchOptions {
                timing,
                ..WatchOptions::default()
            },
        )
        .expect("mock project root exists")
    }

    /// Like [`cold_watcher`](Self::cold_watcher), with the current layout
    /// already cached so later ticks diff against it.
    pub async fn watcher(&self, timing: PollTiming) -> ProjectWatcher {
        let watcher = self.cold_watcher(timing);
        watcher
            .build_tree(false)
            .await
            .expect("mock project tree builds");
        watcher
    }

    /// Watcher whose timer effectively never fires; drive it with `check_now`.
    pub async fn manual_watcher(&self) -> ProjectWatcher {
        self.watcher(PollTiming {
            initial_delay: Duration::from_secs(3600),
            interval: Duration::from_secs(3600),
        })
        .await
    }
}

/// Short real-time cadence for timer-driven tests.
pub fn fast_timing() -> PollTiming {
    PollTiming {
        initial_delay: Duration::from_millis(20),
        interval: Duration::from_millis(100),
    }
}

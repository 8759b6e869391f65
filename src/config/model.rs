// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::project::WatchOptions;
use crate::tree::{ExpandableExtensions, DEFAULT_EXPANDABLE_EXTENSIONS};
use crate::watch::PollTiming;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [watch]
/// initial_delay_ms = 1000
/// interval_ms = 5000
/// expandable_extensions = ["gltf", "glb"]
/// ```
///
/// Every field is optional and has a default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Delay before the first poll after polling starts.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Delay between subsequent polls.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// File extensions (without the dot) listed in a directory's `children`.
    #[serde(default = "default_expandable_extensions")]
    pub expandable_extensions: Vec<String>,
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_expandable_extensions() -> Vec<String> {
    DEFAULT_EXPANDABLE_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            interval_ms: default_interval_ms(),
            expandable_extensions: default_expandable_extensions(),
        }
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection) -> Self {
        Self { watch }
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn poll_timing(&self) -> PollTiming {
        PollTiming {
            initial_delay: Duration::from_millis(self.watch.initial_delay_ms),
            interval: Duration::from_millis(self.watch.interval_ms),
        }
    }

    pub fn expandable_extensions(&self) -> ExpandableExtensions {
        ExpandableExtensions::new(&self.watch.expandable_extensions)
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            timing: self.poll_timing(),
            expandable: self.expandable_extensions(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(WatchSection::default())
    }
}

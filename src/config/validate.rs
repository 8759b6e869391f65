// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, WatchSection};
use crate::errors::{ProjwatchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ProjwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_watch_section(&raw.watch)?;
        Ok(ConfigFile::new_unchecked(raw.watch))
    }
}

fn validate_watch_section(watch: &WatchSection) -> Result<()> {
    if watch.initial_delay_ms == 0 {
        return Err(ProjwatchError::ConfigError(
            "watch.initial_delay_ms must be greater than 0".to_string(),
        ));
    }
    if watch.interval_ms == 0 {
        return Err(ProjwatchError::ConfigError(
            "watch.interval_ms must be greater than 0".to_string(),
        ));
    }
    for ext in &watch.expandable_extensions {
        if ext.trim().is_empty() {
            return Err(ProjwatchError::ConfigError(
                "watch.expandable_extensions contains an empty extension".to_string(),
            ));
        }
        if ext.starts_with('.') {
            return Err(ProjwatchError::ConfigError(format!(
                "watch.expandable_extensions: write {:?} without the leading dot",
                ext
            )));
        }
    }
    Ok(())
}

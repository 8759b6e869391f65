// src/logging.rs

//! Logging setup for `projwatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `PROJWATCH_LOG` environment variable: a bare level ("debug") or full
//!    `EnvFilter` directives ("warn,projwatch::watch=trace")
//! 3. default to `info`
//!
//! A bare level only applies to projwatch's own targets; everything else stays
//! at `warn` so dependency chatter doesn't drown out poll ticks.
//!
//! Logs go to STDERR; the tree and file signals are printed on STDOUT.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

const ENV_VAR: &str = "PROJWATCH_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => crate_filter(level_from_log_level(lvl)),
        None => std::env::var(ENV_VAR)
            .ok()
            .and_then(|s| filter_from_env(&s))
            .unwrap_or_else(|| crate_filter(tracing::Level::INFO)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

fn crate_directives(level: tracing::Level) -> String {
    format!(
        "warn,{}={}",
        env!("CARGO_CRATE_NAME"),
        level.as_str().to_ascii_lowercase()
    )
}

fn crate_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::new(crate_directives(level))
}

fn filter_from_env(value: &str) -> Option<EnvFilter> {
    if let Some(level) = parse_level_str(value) {
        return Some(crate_filter(level));
    }
    match EnvFilter::try_new(value.trim()) {
        Ok(filter) => Some(filter),
        Err(err) => {
            eprintln!("ignoring invalid {ENV_VAR}={value:?}: {err}");
            None
        }
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `projwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "projwatch",
    version,
    about = "Print a project directory tree and report changes by polling.",
    long_about = None
)]
pub struct CliArgs {
    /// Project directory to watch.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Projwatch.toml` in the current directory is used when it
    /// exists, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the tree once and exit without watching.
    #[arg(long)]
    pub once: bool,

    /// Report changes to this file (relative to the project root). Repeatable.
    #[arg(long = "watch-file", value_name = "PATH")]
    pub watch_files: Vec<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROJWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

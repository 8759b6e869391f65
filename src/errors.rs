// src/errors.rs

//! Crate-wide error type and result alias.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjwatchError {
    /// A filesystem object could not be stat'd or listed (missing or unreadable).
    #[error("cannot access {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Building a tree failed at `path`.
    #[error("failed to build tree at {}: {source}", path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: Box<ProjwatchError>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProjwatchError {
    pub fn access(path: impl AsRef<Path>, source: io::Error) -> Self {
        ProjwatchError::Access {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn build(path: impl AsRef<Path>, source: ProjwatchError) -> Self {
        ProjwatchError::Build {
            path: path.as_ref().to_path_buf(),
            source: Box::new(source),
        }
    }

    /// True if this is (or wraps) an access failure.
    pub fn is_access(&self) -> bool {
        match self {
            ProjwatchError::Access { .. } => true,
            ProjwatchError::Build { source, .. } => source.is_access(),
            _ => false,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProjwatchError>;

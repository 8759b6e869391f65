// src/uri.rs

//! `file://` identifiers for tree nodes and watched files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;

use crate::errors::{ProjwatchError, Result};

/// A `file://` URI naming a filesystem object.
///
/// Conversion to and from absolute paths is lossless; relative paths are
/// rejected because a URI has no working directory to resolve against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uri(Url);

impl Uri {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Url::from_file_path(path)
            .map(Uri)
            .map_err(|_| ProjwatchError::InvalidUri(format!("not an absolute path: {}", path.display())))
    }

    pub fn to_path(&self) -> Result<PathBuf> {
        self.0
            .to_file_path()
            .map_err(|_| ProjwatchError::InvalidUri(self.0.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Uri {
    type Err = ProjwatchError;

    fn from_str(s: &str) -> Result<Self> {
        let url = Url::parse(s).map_err(|e| ProjwatchError::InvalidUri(format!("{s}: {e}")))?;
        if url.scheme() != "file" {
            return Err(ProjwatchError::InvalidUri(format!(
                "{s}: expected a file:// uri"
            )));
        }
        Ok(Uri(url))
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

//! Run manifest (flatten.yaml) parsing.
//!
//! The manifest stores defaults for a flatten run so a resource pipeline
//! can invoke `flatten` without repeating its folders on every call.
//! Command-line values always take precedence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FlattenError, Result};

/// The name of the manifest file looked up in the working directory.
pub const MANIFEST_FILENAME: &str = "flatten.yaml";

/// Flatten manifest loaded from flatten.yaml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Resource tree to flatten.
    pub source: Option<PathBuf>,

    /// Flat destination directory.
    pub output: Option<PathBuf>,

    /// Create the destination directory when it does not exist.
    pub create_output: bool,

    /// Follow symbolic links while walking the source tree.
    pub follow_links: bool,
}

impl Manifest {
    /// Load manifest from a flatten.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FlattenError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| FlattenError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some(format!("Check {} syntax", MANIFEST_FILENAME)),
        })
    }

    /// Load `flatten.yaml` from `dir` if one exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILENAME);
        if path.is_file() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Relative `source`/`output` entries are taken relative to `base`.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        self.source = self.source.map(|p| rebase(base, p));
        self.output = self.output.map(|p| rebase(base, p));
        self
    }
}

fn rebase(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

//! Source tree traversal.
//!
//! Recursively walks a resource tree and yields every file below it,
//! at any depth, in a stable order (entries sorted by file name within
//! each directory).

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{FlattenError, Result};

/// A read-only view of the resource tree being flattened.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    follow_links: bool,
    pruned: Option<PathBuf>,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: false,
            pruned: None,
        }
    }

    /// Descend into symlinked directories.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Skip `dir` (and everything under it) if it lives inside the tree.
    ///
    /// Used to keep a destination nested in the source from being walked.
    pub fn prune(mut self, dir: &Path) -> Self {
        self.pruned = nested_path(&self.root, dir);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Iterate over every file in the tree.
    ///
    /// Unreadable directories surface as errors rather than being skipped.
    pub fn files(&self) -> impl Iterator<Item = Result<PathBuf>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_pruned(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) if is_file(&entry) => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    Some(Err(FlattenError::Io {
                        path,
                        message: format!("Failed to walk source tree: {}", e),
                    }))
                }
            })
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        match &self.pruned {
            Some(pruned) => entry.file_type().is_dir() && entry.path() == pruned,
            None => false,
        }
    }
}

/// Symlinked files count as files; broken links and directories do not.
fn is_file(entry: &DirEntry) -> bool {
    !entry.file_type().is_dir() && entry.path().is_file()
}

/// Express `dir` as a path under `root` when it is nested inside it.
fn nested_path(root: &Path, dir: &Path) -> Option<PathBuf> {
    let canonical_root = root.canonicalize().ok()?;
    let canonical_dir = dir.canonicalize().ok()?;
    let relative = canonical_dir.strip_prefix(&canonical_root).ok()?;

    // The whole tree being the destination is the self-flatten case; keep walking.
    if relative.as_os_str().is_empty() {
        return None;
    }

    Some(root.join(relative))
}

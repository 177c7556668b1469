//! The flatten engine.
//!
//! Copies every file of a [`SourceTree`] into one flat destination,
//! keyed by base name, then hands each copy to the reference rewriter
//! its extension selects. The first file to claim a base name wins; later
//! files with the same name are reported and skipped.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FlattenError, Result};
use crate::output::{display_path, Printer};
use crate::rewrite::{rewrite_file, DocumentFormat};
use crate::walker::SourceTree;

/// What happened to a single visited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Copied into the destination, possibly rewritten.
    Copied {
        dest: PathBuf,
        format: Option<DocumentFormat>,
        references: usize,
    },
    /// Base name already present in the destination.
    Skipped { name: OsString },
}

/// Per-run counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlattenReport {
    /// Files visited in the source tree.
    pub visited: usize,
    /// Files copied into the destination.
    pub copied: usize,
    /// Base names dropped because the destination already had them.
    pub skipped: Vec<OsString>,
    /// Copies that went through a rewriter.
    pub documents: usize,
    /// References that were changed across all documents.
    pub references: usize,
}

impl FlattenReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, outcome: &FileOutcome) {
        self.visited += 1;
        match outcome {
            FileOutcome::Copied {
                format, references, ..
            } => {
                self.copied += 1;
                if format.is_some() {
                    self.documents += 1;
                }
                self.references += references;
            }
            FileOutcome::Skipped { name } => self.skipped.push(name.clone()),
        }
    }
}

/// Make sure `dest` is a usable directory, creating it when allowed.
pub fn prepare_destination(dest: &Path, create: bool) -> Result<()> {
    if dest.is_dir() {
        return Ok(());
    }

    if dest.exists() {
        return Err(FlattenError::Usage {
            message: format!("{} is not a directory", dest.display()),
            help: Some("The destination must be a directory".to_string()),
        });
    }

    if !create {
        return Err(FlattenError::Usage {
            message: format!("Destination {} does not exist", dest.display()),
            help: Some("Create it first or pass --create".to_string()),
        });
    }

    fs::create_dir_all(dest).map_err(|e| FlattenError::Io {
        path: dest.to_path_buf(),
        message: format!("Failed to create destination directory: {}", e),
    })
}

/// Copies a tree into a flat directory, one file at a time.
pub struct Flattener<'a> {
    dest: PathBuf,
    printer: &'a Printer,
}

impl<'a> Flattener<'a> {
    pub fn new(dest: impl Into<PathBuf>, printer: &'a Printer) -> Self {
        Self {
            dest: dest.into(),
            printer,
        }
    }

    /// Flatten the whole tree. Aborts on the first I/O or parse error;
    /// files processed before that stay in the destination.
    pub fn run(&self, tree: &SourceTree) -> Result<FlattenReport> {
        let mut report = FlattenReport::new();

        for path in tree.files() {
            let outcome = self.process_file(&path?)?;
            report.record(&outcome);
        }

        Ok(report)
    }

    /// Copy one file into the destination and rewrite it if its format is known.
    pub fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        self.printer.status("Copying", &display_path(path));

        let name = path.file_name().ok_or_else(|| FlattenError::Io {
            path: path.to_path_buf(),
            message: "Path has no file name".to_string(),
        })?;
        let dest = self.dest.join(name);

        if dest.exists() {
            self.printer.warning(
                "Warning",
                &format!("{} file already exists! Skipping.", name.to_string_lossy()),
            );
            return Ok(FileOutcome::Skipped {
                name: name.to_os_string(),
            });
        }

        fs::copy(path, &dest).map_err(|e| FlattenError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to copy to {}: {}", dest.display(), e),
        })?;

        let format = DocumentFormat::detect(&dest);
        let references = match format {
            Some(format) => rewrite_file(&dest, format)?,
            None => 0,
        };

        Ok(FileOutcome::Copied {
            dest,
            format,
            references,
        })
    }
}

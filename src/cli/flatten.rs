//! Flatten command implementation.
//!
//! Collapses a resource tree into a single directory and rewrites the
//! references inside copied documents.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::error::{FlattenError, Result};
use crate::flatten::{prepare_destination, FlattenReport, Flattener};
use crate::manifest::Manifest;
use crate::output::{display_path, plural, Printer};
use crate::walker::SourceTree;

/// Flatten a resource folder and its subfolders into a single folder,
/// fixing file references in materials, shaders, meshes and XML layouts
#[derive(Parser, Debug, Default)]
#[command(name = "flatten")]
#[command(version, about, long_about = None)]
pub struct FlattenArgs {
    /// Resource tree to flatten
    pub source: Option<PathBuf>,

    /// Flat destination directory
    pub dest: Option<PathBuf>,

    /// Manifest with default settings (default: ./flatten.yaml if present)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Create the destination directory if it does not exist
    #[arg(long)]
    pub create: bool,

    /// Follow symbolic links while walking the source tree
    #[arg(long)]
    pub follow_links: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub create: bool,
    pub follow_links: bool,
}

impl FlattenArgs {
    /// Merge command-line values over the manifest.
    ///
    /// Returns `None` when either folder is still unknown.
    pub fn settings(&self, manifest: Manifest) -> Option<RunSettings> {
        Some(RunSettings {
            source: self.source.clone().or(manifest.source)?,
            dest: self.dest.clone().or(manifest.output)?,
            create: self.create || manifest.create_output,
            follow_links: self.follow_links || manifest.follow_links,
        })
    }
}

/// Run the flatten command.
///
/// Returns `None` when arguments were insufficient and only the usage
/// line was printed.
pub fn run(args: FlattenArgs, printer: &Printer) -> Result<Option<FlattenReport>> {
    if let Some(shell) = args.completions {
        super::completions::generate::<FlattenArgs>(shell);
        return Ok(None);
    }

    let manifest = load_manifest(args.config.as_deref())?;

    let Some(settings) = args.settings(manifest) else {
        super::print_usage(&mut FlattenArgs::command(), printer);
        return Ok(None);
    };

    flatten_with(&settings, printer).map(Some)
}

/// Flatten using already-resolved settings.
pub fn flatten_with(settings: &RunSettings, printer: &Printer) -> Result<FlattenReport> {
    if !settings.source.is_dir() {
        return Err(FlattenError::Usage {
            message: format!("Source {} is not a directory", settings.source.display()),
            help: Some("Pass the root folder of the resource tree".to_string()),
        });
    }

    prepare_destination(&settings.dest, settings.create)?;

    printer.info(
        "Flattening",
        &format!(
            "{} {} {}",
            display_path(&settings.source),
            printer.dim("->"),
            display_path(&settings.dest)
        ),
    );

    let tree = SourceTree::new(&settings.source)
        .follow_links(settings.follow_links)
        .prune(&settings.dest);

    let report = Flattener::new(&settings.dest, printer).run(&tree)?;

    printer.success(
        "Finished",
        &format!(
            "{} copied, {} skipped, {} rewritten",
            plural(report.copied, "file", "files"),
            report.skipped.len(),
            plural(report.references, "reference", "references"),
        ),
    );

    Ok(report)
}

fn load_manifest(config: Option<&Path>) -> Result<Manifest> {
    if let Some(path) = config {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        return Ok(Manifest::load(path)?.resolve_relative_to(base));
    }

    let cwd = std::env::current_dir()?;
    Ok(Manifest::discover(&cwd)?
        .map(|m| m.resolve_relative_to(&cwd))
        .unwrap_or_default())
}

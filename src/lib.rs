//! resflat - Resource tree flattener
//!
//! A library for collapsing a nested engine resource tree into a single
//! flat directory while rewriting the file references embedded in
//! materials, shaders, meshes and XML layouts.

pub mod cli;
pub mod error;
pub mod flatten;
pub mod font;
pub mod manifest;
pub mod output;
pub mod rewrite;
pub mod walker;

pub use error::{FlattenError, Result};
pub use flatten::{prepare_destination, FileOutcome, FlattenReport, Flattener};
pub use font::{convert_font, FontDocument, Glyph};
pub use manifest::{Manifest, MANIFEST_FILENAME};
pub use output::Printer;
pub use rewrite::{base_name, rewrite_file, DocumentError, DocumentFormat};
pub use walker::SourceTree;

//! Reference rewriting for copied resource documents.
//!
//! Once a file has landed in the flat destination, any paths it embeds
//! must drop their directory component so they resolve next to it.
//! Which rewriter runs is decided by a fixed extension table.

pub mod keyed;
pub mod markup;

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::{FlattenError, Result};

/// Why a structured document could not be rewritten.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid XML reference: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("ill-formed XML: {0}")]
    Malformed(String),

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured document formats that carry file references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// JSON-style keyed trees: materials, shaders and meshes.
    Keyed,
    /// XML markup with image/source attributes.
    Markup,
}

/// Extension table for rewritable documents. Anything not listed is copied opaquely.
pub const FORMAT_TABLE: &[(&str, DocumentFormat)] = &[
    ("material", DocumentFormat::Keyed),
    ("shader", DocumentFormat::Keyed),
    ("mesh", DocumentFormat::Keyed),
    ("xml", DocumentFormat::Markup),
];

impl DocumentFormat {
    /// Look up the format for a bare extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        FORMAT_TABLE
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, format)| *format)
    }

    /// Detect the format from a path's final extension.
    ///
    /// Dot-files such as `.material` count as having that extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?;
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::Keyed => "keyed",
            DocumentFormat::Markup => "markup",
        }
    }

    /// Rewrite an in-memory document, returning the new bytes and the
    /// number of references that changed.
    pub fn rewrite(&self, source: &[u8]) -> std::result::Result<(Vec<u8>, usize), DocumentError> {
        match self {
            DocumentFormat::Keyed => Ok(keyed::rewrite_document(source)?),
            DocumentFormat::Markup => markup::rewrite_document(source),
        }
    }
}

/// Strip every directory component from a reference.
///
/// Both `/` and `\` count as separators, since resource trees are often
/// authored on Windows.
pub fn base_name(reference: &str) -> &str {
    reference
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(reference)
}

/// Rewrite the document at `path` in place.
///
/// Returns the number of references that changed. A malformed document
/// is a parse error and leaves the file as copied.
pub fn rewrite_file(path: &Path, format: DocumentFormat) -> Result<usize> {
    let source = fs::read(path).map_err(|e| FlattenError::io(path, "Failed to read document", e))?;

    let (rewritten, changed) = format.rewrite(&source).map_err(|e| FlattenError::Parse {
        message: format!("{}: {}", path.display(), e),
        help: Some(format!(
            "{} is treated as a {} document and must be well-formed",
            path.display(),
            format.name()
        )),
    })?;

    fs::write(path, rewritten).map_err(|e| FlattenError::io(path, "Failed to write document", e))?;

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_table() {
        assert_eq!(DocumentFormat::from_extension("material"), Some(DocumentFormat::Keyed));
        assert_eq!(DocumentFormat::from_extension("shader"), Some(DocumentFormat::Keyed));
        assert_eq!(DocumentFormat::from_extension("mesh"), Some(DocumentFormat::Keyed));
        assert_eq!(DocumentFormat::from_extension("xml"), Some(DocumentFormat::Markup));
        assert_eq!(DocumentFormat::from_extension("png"), None);
        assert_eq!(DocumentFormat::from_extension("MESH"), None);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            DocumentFormat::detect(Path::new("models/hero.mesh")),
            Some(DocumentFormat::Keyed)
        );
        assert_eq!(
            DocumentFormat::detect(Path::new("/abs/ui/menu.xml")),
            Some(DocumentFormat::Markup)
        );
        assert_eq!(
            DocumentFormat::detect(Path::new("dist/.material")),
            Some(DocumentFormat::Keyed)
        );
        assert_eq!(DocumentFormat::detect(Path::new("shaders/basic.vert.spv")), None);
        assert_eq!(DocumentFormat::detect(Path::new("README")), None);
        assert_eq!(DocumentFormat::detect(Path::new("mesh.bak")), None);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("textures/skin/a.png"), "a.png");
        assert_eq!(base_name("/abs/path/b.png"), "b.png");
        assert_eq!(base_name("textures\\win\\c.png"), "c.png");
        assert_eq!(base_name("d.png"), "d.png");
        assert_eq!(base_name(""), "");
        assert_eq!(base_name("trailing/"), "");
    }

    #[test]
    fn test_base_name_is_idempotent() {
        for reference in ["textures/skin/a.png", "x\\y.png", "plain.png"] {
            let once = base_name(reference);
            assert_eq!(base_name(once), once);
            assert!(!once.contains('/') && !once.contains('\\'));
        }
    }

    #[test]
    fn test_rewrite_file_keyed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basic.shader");
        fs::write(&path, r#"{"name": "basic", "filename": "shaders/spv/basic.vert.spv"}"#).unwrap();

        let changed = rewrite_file(&path, DocumentFormat::Keyed).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(changed, 1);
        assert_eq!(value["filename"], "basic.vert.spv");
    }

    #[test]
    fn test_rewrite_file_malformed_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.material");
        fs::write(&path, "{\"filename\": ").unwrap();

        let result = rewrite_file(&path, DocumentFormat::Keyed);

        assert!(matches!(result, Err(FlattenError::Parse { .. })));
        // Left as copied
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"filename\": ");
    }

    #[test]
    fn test_rewrite_errors_keep_their_source() {
        let keyed = DocumentFormat::Keyed.rewrite(b"{").unwrap_err();
        assert!(matches!(keyed, DocumentError::Json(_)));

        let markup = DocumentFormat::Markup.rewrite(b"<a>&bogus;</a>").unwrap_err();
        assert!(matches!(markup, DocumentError::Escape(_) | DocumentError::Xml(_)));
    }

    #[test]
    fn test_rewrite_file_malformed_markup_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("menu.xml");
        fs::write(&path, "<menu><button image=\"a/b.png\">").unwrap();

        let result = rewrite_file(&path, DocumentFormat::Markup);

        assert!(matches!(result, Err(FlattenError::Parse { .. })));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<menu><button image=\"a/b.png\">"
        );
    }

    #[test]
    fn test_rewrite_file_missing_is_io_error() {
        let dir = tempdir().unwrap();
        let result = rewrite_file(&dir.path().join("gone.xml"), DocumentFormat::Markup);

        assert!(matches!(result, Err(FlattenError::Io { .. })));
    }
}

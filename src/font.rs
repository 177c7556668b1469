//! Bitmap font conversion.
//!
//! Turns a BMFont XML description (`.fnt`) into the engine's `.font`
//! document: font metrics, the backing material, and a glyph table keyed
//! by the character itself.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{FlattenError, Result};
use crate::rewrite::keyed::to_pretty_bytes;

/// Extension of converted font documents.
pub const FONT_EXTENSION: &str = "font";

/// A converted font document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontDocument {
    pub name: String,
    pub size: i32,
    pub bold: bool,
    pub italic: bool,
    pub width: i32,
    pub height: i32,
    pub material: String,
    #[serde(serialize_with = "serialize_glyphs")]
    pub characters: Vec<Glyph>,
}

/// One glyph box on the font bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Glyph {
    #[serde(skip)]
    pub character: char,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub advance: i32,
}

fn serialize_glyphs<S: Serializer>(glyphs: &[Glyph], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(glyphs.len()))?;
    for glyph in glyphs {
        map.serialize_entry(&glyph.character.to_string(), glyph)?;
    }
    map.end()
}

impl FontDocument {
    /// Parse a BMFont XML description.
    pub fn from_fnt(source: &str, material: &str, name: &str) -> Result<Self> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut info: Option<(i32, bool, bool)> = None;
        let mut common: Option<(i32, i32)> = None;
        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut index: HashMap<char, usize> = HashMap::new();

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"info" if info.is_none() => {
                        info = Some((
                            int_attr(&e, "size")?,
                            int_attr(&e, "bold")? != 0,
                            int_attr(&e, "italic")? != 0,
                        ));
                    }
                    b"common" if common.is_none() => {
                        common = Some((int_attr(&e, "scaleW")?, int_attr(&e, "scaleH")?));
                    }
                    b"char" => {
                        let glyph = parse_glyph(&e)?;
                        match index.get(&glyph.character) {
                            Some(&slot) => glyphs[slot] = glyph,
                            None => {
                                index.insert(glyph.character, glyphs.len());
                                glyphs.push(glyph);
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        let (size, bold, italic) = info.ok_or_else(|| missing("info"))?;
        let (width, height) = common.ok_or_else(|| missing("common"))?;

        Ok(Self {
            name: name.to_string(),
            size,
            bold,
            italic,
            width,
            height,
            material: material.to_string(),
            characters: glyphs,
        })
    }

    /// Serialise as a pretty-printed `.font` document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        to_pretty_bytes(self).map_err(json_error)
    }

    /// File name this document is written under.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, FONT_EXTENSION)
    }
}

/// Convert `fnt_path` and write `<name>.font` into `output_dir`.
pub fn convert_font(fnt_path: &Path, material: &str, name: &str, output_dir: &Path) -> Result<PathBuf> {
    let source = fs::read_to_string(fnt_path).map_err(|e| FlattenError::Io {
        path: fnt_path.to_path_buf(),
        message: format!("Failed to read font description: {}", e),
    })?;

    let document = FontDocument::from_fnt(&source, material, name)?;
    let out_path = output_dir.join(document.file_name());

    fs::write(&out_path, document.to_bytes()?).map_err(|e| FlattenError::Io {
        path: out_path.clone(),
        message: format!("Failed to write font: {}", e),
    })?;

    Ok(out_path)
}

fn parse_glyph(e: &BytesStart<'_>) -> Result<Glyph> {
    let id = int_attr(e, "id")?;
    let character = u32::try_from(id)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| FlattenError::Parse {
            message: format!("Invalid character code {}", id),
            help: Some("<char id> must be a Unicode scalar value".to_string()),
        })?;

    Ok(Glyph {
        character,
        x: int_attr(e, "x")?,
        y: int_attr(e, "y")?,
        width: int_attr(e, "width")?,
        height: int_attr(e, "height")?,
        origin_x: negated_attr(e, "xoffset")?,
        origin_y: negated_attr(e, "yoffset")?,
        advance: int_attr(e, "xadvance")?,
    })
}

fn int_attr(e: &BytesStart<'_>, name: &str) -> Result<i32> {
    let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    for attribute in e.attributes() {
        let attribute = attribute.map_err(|err| FlattenError::Parse {
            message: format!("<{}> has a malformed attribute: {}", element, err),
            help: None,
        })?;
        if attribute.key.as_ref() != name.as_bytes() {
            continue;
        }

        let text = String::from_utf8_lossy(&attribute.value);
        return text.trim().parse().map_err(|_| FlattenError::Parse {
            message: format!("<{} {}=\"{}\"> is not an integer", element, name, text),
            help: None,
        });
    }

    Err(FlattenError::Parse {
        message: format!("<{}> is missing attribute '{}'", element, name),
        help: None,
    })
}

/// Offsets flip sign on conversion; `i32::MIN` has no positive counterpart.
fn negated_attr(e: &BytesStart<'_>, name: &str) -> Result<i32> {
    let value = int_attr(e, name)?;
    value.checked_neg().ok_or_else(|| FlattenError::Parse {
        message: format!("<char {}=\"{}\"> cannot be negated", name, value),
        help: None,
    })
}

fn missing(element: &str) -> FlattenError {
    FlattenError::Parse {
        message: format!("Font description has no <{}> element", element),
        help: Some("Export the font as BMFont XML".to_string()),
    }
}

fn xml_error(e: quick_xml::Error) -> FlattenError {
    FlattenError::Parse {
        message: format!("Invalid font description: {}", e),
        help: None,
    }
}

fn json_error(e: serde_json::Error) -> FlattenError {
    FlattenError::Parse {
        message: format!("Failed to encode font: {}", e),
        help: None,
    }
}

//! Markup-document rewriting (UI layouts and other XML).
//!
//! Elements reference media through a small set of attributes. The
//! document is streamed event by event; only elements whose reference
//! attributes actually change are re-encoded, everything else is written
//! back exactly as read.

use std::borrow::Cow;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::{base_name, DocumentError};

/// Attributes whose values are file references.
pub const REFERENCE_ATTRIBUTES: &[&str] = &["image", "hoverimage", "pressedimage", "source"];

/// Parse, rewrite and re-serialise a markup document.
///
/// The document must be well-formed: exactly one root element, every
/// element closed, no text outside the root, and only predefined or
/// numeric entity references.
pub fn rewrite_document(source: &[u8]) -> Result<(Vec<u8>, usize), DocumentError> {
    let mut reader = Reader::from_reader(source);
    let mut writer = Writer::new(Vec::with_capacity(source.len()));
    let mut buf = Vec::new();
    let mut structure = Structure::default();
    let mut changed = 0;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(element) => {
                structure.open()?;
                match rewrite_element(&element, &mut changed)? {
                    Some(rewritten) => writer.write_event(Event::Start(rewritten))?,
                    None => writer.write_event(Event::Start(element))?,
                }
            }
            Event::Empty(element) => {
                structure.empty()?;
                match rewrite_element(&element, &mut changed)? {
                    Some(rewritten) => writer.write_event(Event::Empty(rewritten))?,
                    None => writer.write_event(Event::Empty(element))?,
                }
            }
            Event::End(element) => {
                structure.close()?;
                writer.write_event(Event::End(element))?;
            }
            Event::Text(text) => {
                if structure.is_outside_root() {
                    if text.iter().any(|b| !b.is_ascii_whitespace()) {
                        return Err(malformed("text outside the root element"));
                    }
                } else {
                    unescape(&String::from_utf8_lossy(&text))?;
                }
                writer.write_event(Event::Text(text))?;
            }
            Event::GeneralRef(reference) => {
                if structure.is_outside_root() {
                    return Err(malformed("entity reference outside the root element"));
                }
                unescape(&format!("&{};", String::from_utf8_lossy(&reference)))?;
                writer.write_event(Event::GeneralRef(reference))?;
            }
            Event::CData(data) => {
                if structure.is_outside_root() {
                    return Err(malformed("CDATA outside the root element"));
                }
                writer.write_event(Event::CData(data))?;
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    structure.finish()?;
    Ok((writer.into_inner(), changed))
}

/// Element nesting seen so far.
#[derive(Debug, Default)]
struct Structure {
    depth: usize,
    roots: usize,
}

impl Structure {
    fn open(&mut self) -> Result<(), DocumentError> {
        self.enter()?;
        self.depth += 1;
        Ok(())
    }

    fn empty(&mut self) -> Result<(), DocumentError> {
        self.enter()
    }

    fn enter(&mut self) -> Result<(), DocumentError> {
        if self.depth == 0 {
            if self.roots > 0 {
                return Err(malformed("more than one root element"));
            }
            self.roots += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DocumentError> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| malformed("closing tag without an open element"))?;
        Ok(())
    }

    fn is_outside_root(&self) -> bool {
        self.depth == 0
    }

    fn finish(&self) -> Result<(), DocumentError> {
        if self.depth > 0 {
            return Err(malformed("unclosed element at end of document"));
        }
        if self.roots == 0 {
            return Err(malformed("no root element"));
        }
        Ok(())
    }
}

fn malformed(message: &str) -> DocumentError {
    DocumentError::Malformed(message.to_string())
}

/// Returns a re-encoded element when at least one reference changed.
fn rewrite_element<'a>(
    element: &BytesStart<'a>,
    changed: &mut usize,
) -> Result<Option<BytesStart<'a>>, DocumentError> {
    let mut attributes: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    let mut touched = 0;

    for attribute in element.attributes() {
        let attribute = attribute?;
        let key = attribute.key.as_ref().to_vec();
        let raw = attribute.value.into_owned();

        let value = if is_reference(&key) {
            match flatten_reference(&raw)? {
                Some(flat) => {
                    touched += 1;
                    flat
                }
                None => requote(&raw).into_owned(),
            }
        } else {
            unescape(&String::from_utf8_lossy(&raw))?;
            requote(&raw).into_owned()
        };

        attributes.push((key, value));
    }

    if touched == 0 {
        return Ok(None);
    }
    *changed += touched;

    let mut rewritten = element.clone();
    rewritten.clear_attributes();
    for (key, value) in &attributes {
        rewritten.push_attribute((key.as_slice(), value.as_slice()));
    }

    Ok(Some(rewritten))
}

fn is_reference(key: &[u8]) -> bool {
    REFERENCE_ATTRIBUTES
        .iter()
        .any(|name| name.as_bytes() == key)
}

/// Decode a raw attribute value, strip its directory part and re-escape it.
///
/// Returns `None` when the decoded value already has no directory part.
fn flatten_reference(raw: &[u8]) -> Result<Option<Vec<u8>>, DocumentError> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| malformed("reference attribute is not valid UTF-8"))?;
    let decoded = unescape(text)?;

    let flat = base_name(&decoded);
    if flat.len() == decoded.len() {
        return Ok(None);
    }

    Ok(Some(escape(flat).into_owned().into_bytes()))
}

/// Attributes are re-emitted double-quoted, so a bare `"` from a
/// single-quoted original must be escaped.
fn requote(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.contains(&b'"') {
        return Cow::Borrowed(raw);
    }

    let mut out = Vec::with_capacity(raw.len() + 8);
    for &b in raw {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

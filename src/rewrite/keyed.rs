//! Keyed-document rewriting (materials, shaders, meshes).
//!
//! These documents are JSON trees with no fixed schema. Every mapping
//! field named `filename` holds a path; nested mappings and sequences are
//! searched at any depth. Field order is kept when the tree is written back.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::base_name;

/// Field name that carries a file reference.
pub const REFERENCE_KEY: &str = "filename";

/// Parse, rewrite and re-serialise a keyed document.
pub fn rewrite_document(source: &[u8]) -> serde_json::Result<(Vec<u8>, usize)> {
    let mut document: Value = serde_json::from_slice(source)?;
    let changed = rewrite_references(&mut document);
    Ok((to_pretty_bytes(&document)?, changed))
}

/// Rewrite every `filename` field below `node`, returning how many changed.
///
/// Non-string `filename` values are left alone.
pub fn rewrite_references(node: &mut Value) -> usize {
    match node {
        Value::Object(fields) => fields
            .iter_mut()
            .map(|(key, value)| {
                let own = if key == REFERENCE_KEY {
                    flatten_reference(value) as usize
                } else {
                    0
                };
                own + rewrite_references(value)
            })
            .sum(),
        Value::Array(items) => items.iter_mut().map(rewrite_references).sum(),
        _ => 0,
    }
}

fn flatten_reference(value: &mut Value) -> bool {
    let Value::String(reference) = value else {
        return false;
    };

    let flat = base_name(reference);
    if flat.len() == reference.len() {
        return false;
    }

    *reference = flat.to_string();
    true
}

/// Serialise with four-space indentation.
pub fn to_pretty_bytes<T: Serialize + ?Sized>(document: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    document.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rewrite_top_level_filename() {
        let mut doc = json!({
            "name": "hero",
            "filename": "models/characters/hero.dae"
        });

        assert_eq!(rewrite_references(&mut doc), 1);
        assert_eq!(doc["filename"], "hero.dae");
        assert_eq!(doc["name"], "hero");
    }

    #[test]
    fn test_rewrite_textures_list() {
        let mut doc = json!({
            "name": "brick",
            "textures": [
                {"samplerName": "diffuse", "filename": "textures/brick/diffuse.ktx"},
                {"samplerName": "shadow", "filename": "shadowmap"}
            ]
        });

        assert_eq!(rewrite_references(&mut doc), 1);
        assert_eq!(doc["textures"][0]["filename"], "diffuse.ktx");
        assert_eq!(doc["textures"][1]["filename"], "shadowmap");
    }

    #[test]
    fn test_rewrite_nested_sequences_and_mappings() {
        let mut doc = json!({
            "lods": [
                [{"filename": "a/b/lod0.bin"}],
                [[{"inner": {"filename": "c/lod1.bin"}}]]
            ],
            "extra": {"deeper": {"filename": "/abs/d.bin"}}
        });

        assert_eq!(rewrite_references(&mut doc), 3);
        assert_eq!(doc["lods"][0][0]["filename"], "lod0.bin");
        assert_eq!(doc["lods"][1][0][0]["inner"]["filename"], "lod1.bin");
        assert_eq!(doc["extra"]["deeper"]["filename"], "d.bin");
    }

    #[test]
    fn test_other_keys_untouched() {
        let mut doc = json!({
            "fragmentShaderName": "shaders/basic.frag",
            "path": "a/b/c.png",
            "list": ["x/y.png", 3, null]
        });
        let before = doc.clone();

        assert_eq!(rewrite_references(&mut doc), 0);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_non_string_filename_untouched() {
        let mut doc = json!({
            "filename": {"filename": "nested/ref.png"},
            "other": {"filename": 7}
        });

        assert_eq!(rewrite_references(&mut doc), 1);
        assert_eq!(doc["filename"]["filename"], "ref.png");
        assert_eq!(doc["other"]["filename"], 7);
    }

    #[test]
    fn test_top_level_sequence() {
        let mut doc = json!([{"filename": "dir/one.png"}, "dir/two.png"]);

        assert_eq!(rewrite_references(&mut doc), 1);
        assert_eq!(doc, json!([{"filename": "one.png"}, "dir/two.png"]));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut doc = json!({"submeshes": [{"filename": "textures/skin/a.png"}]});
        rewrite_references(&mut doc);
        let once = doc.clone();

        assert_eq!(rewrite_references(&mut doc), 0);
        assert_eq!(doc, once);
    }

    #[test]
    fn test_rewrite_document_preserves_field_order() {
        let source = br#"{"zeta": 1, "filename": "a/b.png", "alpha": {"filename": "c.png"}}"#;
        let (bytes, changed) = rewrite_document(source).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(changed, 1);
        assert_eq!(
            text,
            "{\n    \"zeta\": 1,\n    \"filename\": \"b.png\",\n    \"alpha\": {\n        \"filename\": \"c.png\"\n    }\n}"
        );
    }

    #[test]
    fn test_rewrite_document_keeps_number_digits() {
        let source = br#"{"id": 123456789012345678901234567890, "weight": 0.1000000000000000055511151231257827, "filename": "a/b.bin"}"#;
        let (bytes, changed) = rewrite_document(source).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(changed, 1);
        assert_eq!(
            text,
            "{\n    \"id\": 123456789012345678901234567890,\n    \"weight\": 0.1000000000000000055511151231257827,\n    \"filename\": \"b.bin\"\n}"
        );
    }

    #[test]
    fn test_rewrite_document_rejects_malformed() {
        assert!(rewrite_document(b"{\"filename\": \"a.png\",").is_err());
        assert!(rewrite_document(b"").is_err());
    }
}

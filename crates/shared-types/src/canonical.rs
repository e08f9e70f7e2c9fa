//! # Canonical JSON
//!
//! Object keys sorted at every level, no insignificant whitespace, integers
//! in plain decimal. Key ordering is done here rather than left to the map
//! type of the JSON library, whose iteration order depends on its features.

use crate::hex_types::ObjectId;
use serde_json::Value;
use shared_crypto::blake2s_256;

/// Canonical bytes of a JSON value.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    write_value(value, &mut out);
    out
}

/// Object id of a JSON value: BLAKE2s-256 of its canonical bytes.
pub fn object_id(value: &Value) -> ObjectId {
    ObjectId::from_bytes(blake2s_256(&canonical_bytes(value)))
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out);
                out.push(b':');
                write_value(item, out);
            }
            out.push(b'}');
        }
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_at_every_level() {
        let value = json!({
            "zeta": 1,
            "alpha": {"right": true, "left": null},
            "T": "x"
        });
        assert_eq!(
            canonical_bytes(&value),
            br#"{"T":"x","alpha":{"left":null,"right":true},"zeta":1}"#.to_vec()
        );
    }

    #[test]
    fn test_arrays_keep_order() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonical_bytes(&value), b"[3,1,2]".to_vec());
    }

    #[test]
    fn test_large_integers_plain_decimal() {
        let value = json!({"value": 50_000_000_000_000u64});
        assert_eq!(canonical_bytes(&value), br#"{"value":50000000000000}"#.to_vec());
    }

    #[test]
    fn test_string_escaping() {
        let value = json!("a\"b\\c\nd\u{01}é");
        assert_eq!(
            canonical_bytes(&value),
            "\"a\\\"b\\\\c\\nd\\u0001é\"".as_bytes().to_vec()
        );
    }

    #[test]
    fn test_canonical_output_parses_back() {
        let value = json!({"b": [1, {"d": "e", "c": false}], "a": "q\"uote"});
        let bytes = canonical_bytes(&value);
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_object_id_ignores_input_key_order() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":2,"x":1}"#).unwrap();
        assert_eq!(object_id(&a), object_id(&b));
    }
}

//! Content signatures for staleness detection.
//!
//! A signature is the SHA-256 of the canonical JSON form of a value: object
//! keys sorted lexicographically at every level, no insignificant whitespace.
//! Key insertion order therefore never changes the digest.

use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use sha2::{Digest, Sha256};

use verity_types::FieldSet;

/// Signature of a field set.
#[must_use]
pub fn hash(fields: &FieldSet) -> String {
    let mut canonical = String::new();
    canonical.push('{');
    for (idx, (name, value)) in fields.iter().enumerate() {
        if idx > 0 {
            canonical.push(',');
        }
        push_json_string(&mut canonical, name);
        canonical.push(':');
        push_json_string(&mut canonical, value);
    }
    canonical.push('}');
    digest_hex(canonical.as_bytes())
}

/// Signature of an arbitrary JSON value.
#[must_use]
pub fn hash_value(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);
    digest_hex(canonical.as_bytes())
}

/// Whether `signature` is the current signature of `fields`.
#[must_use]
pub fn compare(signature: &str, fields: &FieldSet) -> bool {
    signature == hash(fields)
}

/// Cheap correlation token for UI bookkeeping.
///
/// Time-based hex prefix plus a random suffix. Not a content signature.
#[must_use]
pub fn unique_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    format!("{millis:x}{:08x}", rand::random::<u32>())
}

fn digest_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (idx, key) in keys.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                push_json_string(out, key);
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => push_json_string(out, s),
        other => out.push_str(&other.to_string()),
    }
}

fn push_json_string(out: &mut String, s: &str) {
    // Serializing a str cannot fail.
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}

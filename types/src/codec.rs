//! Value↔string codec for mirroring state into plain text fields.
//!
//! Lists are comma-joined; structured values are JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;

const LIST_SEPARATOR: char = ',';

#[must_use]
pub fn encode_list(values: &[String]) -> String {
    values.join(&LIST_SEPARATOR.to_string())
}

/// Split a comma-joined list. Blank entries are dropped.
#[must_use]
pub fn decode_list(raw: &str) -> Vec<String> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(raw)
}

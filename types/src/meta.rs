use serde::{Deserialize, Serialize};

use crate::{EntityKind, FieldSet};

/// The last accepted verdict of the remote service for an entity.
///
/// `hash` is the signature of the relevant data the verdict was computed for.
/// Meta is always replaced wholesale, never patched field by field, except
/// for marker codes appended by corrective actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub status: Vec<String>,
    pub predictions: Vec<FieldSet>,
    pub hash: String,
}

impl Meta {
    /// Meta for an entity that has never been validated.
    #[must_use]
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            status: Vec::new(),
            predictions: Vec::new(),
            hash: String::new(),
        }
    }

    #[must_use]
    pub fn has_status(&self, code: &str) -> bool {
        self.status.iter().any(|s| s == code)
    }

    #[must_use]
    pub fn has_any_status(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.has_status(code))
    }

    /// Append a status code unless it is already present.
    pub fn push_status(&mut self, code: &str) {
        if !self.has_status(code) {
            self.status.push(code.to_string());
        }
    }
}

/// Per-entity request shaping hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Other {
    /// Requested output format, e.g. `E164` or `INTERNATIONAL` for phones.
    pub data_format: Option<String>,
    /// Expected subtype, e.g. `mobile` or `fixed_line` for phones.
    pub data_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_status_is_idempotent() {
        let mut meta = Meta::empty(EntityKind::Address);
        meta.push_status("address_correct");
        meta.push_status("address_correct");
        assert_eq!(meta.status, vec!["address_correct".to_string()]);
    }

    #[test]
    fn meta_serializes_kind_as_type() {
        let meta = Meta::empty(EntityKind::Email);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "email");
    }
}

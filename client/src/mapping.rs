//! Translation between domain field names and the service's vocabulary.

use serde_json::{Map, Value};
use verity_types::FieldSet;
use verity_types::field::{BUILDING_NUMBER, COUNTRY_CODE, LOCALITY, POSTAL_CODE, STREET_NAME};

pub trait FieldMapping: Send + Sync {
    /// Wire name for a domain field.
    fn to_wire<'a>(&self, field: &'a str) -> &'a str;
    /// Domain name for a wire field.
    fn from_wire<'a>(&self, field: &'a str) -> &'a str;
}

/// `(domain, wire)` pairs that differ. Everything else passes through.
const DEFAULT_TABLE: &[(&str, &str)] = &[
    (COUNTRY_CODE, "country"),
    (POSTAL_CODE, "postCode"),
    (LOCALITY, "cityName"),
    (STREET_NAME, "street"),
    (BUILDING_NUMBER, "houseNumber"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFieldMapping;

impl FieldMapping for DefaultFieldMapping {
    fn to_wire<'a>(&self, field: &'a str) -> &'a str {
        DEFAULT_TABLE
            .iter()
            .find(|(domain, _)| *domain == field)
            .map_or(field, |(_, wire)| *wire)
    }

    fn from_wire<'a>(&self, field: &'a str) -> &'a str {
        DEFAULT_TABLE
            .iter()
            .find(|(_, wire)| *wire == field)
            .map_or(field, |(domain, _)| *domain)
    }
}

/// Domain fields as a wire params object.
pub fn to_wire_params(mapping: &dyn FieldMapping, data: &FieldSet) -> Map<String, Value> {
    data.iter()
        .map(|(name, value)| {
            (
                mapping.to_wire(name).to_string(),
                Value::String(value.to_string()),
            )
        })
        .collect()
}

/// Wire object as domain fields. Scalars are stringified, nulls and nested
/// values are dropped.
pub fn from_wire_object(mapping: &dyn FieldMapping, object: &Map<String, Value>) -> FieldSet {
    object
        .iter()
        .filter_map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((mapping.from_wire(name).to_string(), value))
        })
        .collect()
}

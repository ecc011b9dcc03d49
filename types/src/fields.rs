use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A name→value mapping of form fields.
///
/// Entries are kept sorted by name, so two sets with the same content compare
/// equal and serialize identically no matter the insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<String, String>);

impl FieldSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value of `name`, or `""` when absent.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Trimmed value of `name`, or `""` when absent.
    #[must_use]
    pub fn trimmed(&self, name: &str) -> &str {
        self.value(name).trim()
    }

    #[must_use]
    pub fn is_blank(&self, name: &str) -> bool {
        self.trimmed(name).is_empty()
    }

    /// Insert or replace a value. Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every entry of `other` into `self`, replacing existing values.
    pub fn merge(&mut self, other: &FieldSet) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Subset of `self` restricted to `names`. Absent names stay absent.
    #[must_use]
    pub fn project(&self, names: &[&str]) -> FieldSet {
        names
            .iter()
            .filter_map(|name| self.0.get_key_value(*name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Like [`FieldSet::project`], but absent names are filled with `""`.
    #[must_use]
    pub fn project_filled(&self, names: &[&str]) -> FieldSet {
        names
            .iter()
            .map(|name| ((*name).to_string(), self.value(name).to_string()))
            .collect()
    }

    /// Whether any of `names` is present in this set.
    #[must_use]
    pub fn intersects(&self, names: &[String]) -> bool {
        names.iter().any(|name| self.0.contains_key(name))
    }

    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for FieldSet {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for FieldSet {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_does_not_matter() {
        let a = FieldSet::from([("b", "2"), ("a", "1")]);
        let b = FieldSet::from([("a", "1"), ("b", "2")]);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn project_keeps_only_present_names() {
        let set = FieldSet::from([("a", "1"), ("b", "2"), ("c", "3")]);
        let projected = set.project(&["a", "c", "missing"]);
        assert_eq!(projected, FieldSet::from([("a", "1"), ("c", "3")]));
    }

    #[test]
    fn project_filled_adds_blank_values() {
        let set = FieldSet::from([("a", "1")]);
        let projected = set.project_filled(&["a", "b"]);
        assert_eq!(projected.get("b"), Some(""));
    }

    #[test]
    fn trimmed_and_blank() {
        let set = FieldSet::from([("a", "  x "), ("b", "   ")]);
        assert_eq!(set.trimmed("a"), "x");
        assert!(set.is_blank("b"));
        assert!(set.is_blank("missing"));
    }
}

//! Flat records: ordered path → text mappings produced by flattening.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An insertion-ordered mapping from slash-separated XML path to leaf text.
///
/// Writing an existing key replaces its value and keeps the key at its
/// original position (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord(IndexMap<String, Option<String>>);

/// Flat record scoped to one `DettaglioLinee` element.
pub type LineItem = FlatRecord;

/// One output row of the result table.
pub type InvoiceRow = FlatRecord;

impl FlatRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, overwriting any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    /// Text value at `key`; `None` when the key is absent or null.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Whether `key` is present, null or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether `key` is present with a null value.
    pub fn is_null(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(None))
    }

    /// Copy every entry of `other` into `self`; `other` wins on collision.
    pub fn merge(&mut self, other: &FlatRecord) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Consuming variant of [`merge`](Self::merge).
    pub fn merged(mut self, other: &FlatRecord) -> Self {
        self.merge(other);
        self
    }

    /// A record with the same keys, every value null.
    pub fn nulled(&self) -> Self {
        Self(self.0.keys().map(|k| (k.clone(), None)).collect())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

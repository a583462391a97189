//! Metadata value model.
//!
//! Front matter values are dynamically shaped, so they are modelled as a
//! tagged enum. Objects keep insertion order because key order is visible
//! in the serialized block and must survive merges.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Number;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<MetadataValue>),
    Object(MetadataMap),
}

impl MetadataValue {
    /// Whether the value carries content.
    ///
    /// Null, blank strings, empty arrays and empty objects are not meaningful.
    /// Every number (including `0`) and every boolean (including `false`) is.
    pub fn is_meaningful(&self) -> bool {
        match self {
            MetadataValue::Null => false,
            MetadataValue::Bool(_) => true,
            MetadataValue::Number(_) => true,
            MetadataValue::String(s) => !s.trim().is_empty(),
            MetadataValue::Array(items) => !items.is_empty(),
            MetadataValue::Object(map) => !map.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Build a number value from a float. Non-finite input becomes `Null`.
    pub fn from_f64(value: f64) -> Self {
        Number::from_f64(value)
            .map(MetadataValue::Number)
            .unwrap_or(MetadataValue::Null)
    }
}

/// Free-function form of [`MetadataValue::is_meaningful`] that also treats a
/// missing value as not meaningful.
pub fn is_meaningful(value: Option<&MetadataValue>) -> bool {
    value.is_some_and(MetadataValue::is_meaningful)
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Number(value.into())
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::from_f64(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(values: Vec<T>) -> Self {
        MetadataValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<MetadataMap> for MetadataValue {
    fn from(map: MetadataMap) -> Self {
        MetadataValue::Object(map)
    }
}

impl From<serde_json::Value> for MetadataValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MetadataValue::Null,
            serde_json::Value::Bool(b) => MetadataValue::Bool(b),
            serde_json::Value::Number(n) => MetadataValue::Number(n),
            serde_json::Value::String(s) => MetadataValue::String(s),
            serde_json::Value::Array(items) => {
                MetadataValue::Array(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => MetadataValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, MetadataValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataValue::Null => serializer.serialize_unit(),
            MetadataValue::Bool(b) => serializer.serialize_bool(*b),
            MetadataValue::Number(n) => n.serialize(serializer),
            MetadataValue::String(s) => serializer.serialize_str(s),
            MetadataValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            MetadataValue::Object(map) => map.serialize(serializer),
        }
    }
}

/// Insertion-ordered string-keyed map of metadata values.
///
/// Lookups are linear; front matter blocks hold tens of keys at most.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMap {
    entries: Vec<(String, MetadataValue)>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or replace a value. A replaced key keeps its original position.
    ///
    /// Returns the previous value, if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MetadataMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for MetadataMap {
    type Item = (String, MetadataValue);
    type IntoIter = std::vec::IntoIter<(String, MetadataValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for MetadataMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Build a [`MetadataMap`] from `key => value` pairs.
///
/// ```
/// use elo_core::metadata_map;
///
/// let map = metadata_map! { "title" => "Madrid", "rating" => 5 };
/// assert_eq!(map.len(), 2);
/// ```
#[macro_export]
macro_rules! metadata_map {
    () => { $crate::value::MetadataMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::MetadataMap::new();
        $( map.insert($key, $value); )+
        map
    }};
}

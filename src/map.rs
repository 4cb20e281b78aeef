//! Ordered map type for document maps.
//!
//! This module provides [`DocMap`], a wrapper around [`IndexMap`] that keeps insertion order
//! for iteration. Order is what the codecs walk when they write a map, but it carries no
//! meaning for equality: two maps holding the same entries compare equal whatever their
//! order.
//!
//! ## Examples
//!
//! ```rust
//! use datacodec::{DocMap, Value};
//!
//! let mut map = DocMap::new();
//! map.insert("name", Value::from("Alice"));
//! map.insert("age", Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::Value;
use indexmap::IndexMap;
use serde::de::{self, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// An ordered map of string keys to document values.
///
/// # Examples
///
/// ```rust
/// use datacodec::{DocMap, Value};
///
/// let mut map = DocMap::new();
/// map.insert("first", Value::from(1));
/// map.insert("second", Value::from(2));
///
/// // Iteration maintains insertion order
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DocMap(IndexMap<String, Value>);

impl DocMap {
    #[must_use]
    pub fn new() -> Self {
        DocMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        DocMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the value is overwritten in place (the key
    /// keeps its original position) and the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use datacodec::{DocMap, Value};
    ///
    /// let mut map = DocMap::new();
    /// assert!(map.insert("key", Value::from(42)).is_none());
    /// assert_eq!(map.insert("key", Value::from(43)), Some(Value::from(42)));
    /// ```
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns the entries sorted by key.
    pub(crate) fn sorted_entries(&self) -> Vec<(&String, &Value)> {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl Default for DocMap {
    fn default() -> Self {
        Self::new()
    }
}

impl From<HashMap<String, Value>> for DocMap {
    fn from(map: HashMap<String, Value>) -> Self {
        DocMap(map.into_iter().collect())
    }
}

impl From<DocMap> for HashMap<String, Value> {
    fn from(map: DocMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for DocMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DocMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for DocMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        DocMap(IndexMap::from_iter(iter))
    }
}

impl Serialize for DocMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DocMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocMapVisitor;

        impl<'de> Visitor<'de> for DocMapVisitor {
            type Value = DocMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map with string keys")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut map = DocMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(DocMapVisitor)
    }
}

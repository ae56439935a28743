//! Ordered map types.
//!
//! - [`ObjectMap`]: string-keyed record fields, the payload of objects, error
//!   properties and class instances.
//! - [`ValueMap`]: an associative container whose keys can be any
//!   [`RichValue`], the payload of `Map` values.
//!
//! Both keep insertion order, which is also the order entries are written to
//! the wire and the order rows are addressed by position.
//!
//! ## Examples
//!
//! ```rust
//! use serde_richjson::{ObjectMap, ValueMap, RichValue};
//!
//! let mut fields = ObjectMap::new();
//! fields.insert("name".to_string(), RichValue::from("Alice"));
//! assert_eq!(fields.get("name").and_then(|v| v.as_str()), Some("Alice"));
//!
//! let mut map = ValueMap::new();
//! map.insert(RichValue::from(1), RichValue::from("one"));
//! map.insert(RichValue::from(1.0), RichValue::from("uno"));
//! assert_eq!(map.len(), 1);
//! ```

use crate::value::ValueKey;
use crate::RichValue;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of string keys to rich values.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{ObjectMap, RichValue};
///
/// let mut map = ObjectMap::new();
/// map.insert("first".to_string(), RichValue::from(1));
/// map.insert("second".to_string(), RichValue::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectMap(IndexMap<String, RichValue>);

impl ObjectMap {
    #[must_use]
    pub fn new() -> Self {
        ObjectMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ObjectMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and the
    /// key keeps its position.
    pub fn insert(&mut self, key: String, value: RichValue) -> Option<RichValue> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RichValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RichValue> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<RichValue> {
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

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, RichValue> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, RichValue> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, RichValue> {
        self.0.iter()
    }
}

impl From<HashMap<String, RichValue>> for ObjectMap {
    fn from(map: HashMap<String, RichValue>) -> Self {
        ObjectMap(map.into_iter().collect())
    }
}

impl IntoIterator for ObjectMap {
    type Item = (String, RichValue);
    type IntoIter = indexmap::map::IntoIter<String, RichValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectMap {
    type Item = (&'a String, &'a RichValue);
    type IntoIter = indexmap::map::Iter<'a, String, RichValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, RichValue)> for ObjectMap {
    fn from_iter<T: IntoIterator<Item = (String, RichValue)>>(iter: T) -> Self {
        ObjectMap(IndexMap::from_iter(iter))
    }
}

/// An insertion-ordered associative container with arbitrary keys.
///
/// Keys are compared like JavaScript `Map` keys: primitives by value (with
/// `NaN` equal to itself and `0` equal to `-0`), reference values and symbols
/// by identity.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{rich, ValueMap, RichValue};
///
/// let key = rich!({ "id": 1 });
/// let mut map = ValueMap::new();
/// map.insert(key.clone(), RichValue::from("v"));
///
/// assert_eq!(map.get(&key).and_then(|v| v.as_str()), Some("v"));
/// // a structurally equal but distinct object is a different key
/// assert!(map.get(&rich!({ "id": 1 })).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueMap(IndexMap<ValueKey, (RichValue, RichValue)>);

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        ValueMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ValueMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts an entry; an existing key keeps its position and stored key.
    pub fn insert(&mut self, key: RichValue, value: RichValue) -> Option<RichValue> {
        match self.0.get_mut(&ValueKey::of(&key)) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.0.insert(ValueKey::of(&key), (key, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &RichValue) -> Option<&RichValue> {
        self.0.get(&ValueKey::of(key)).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &RichValue) -> bool {
        self.0.contains_key(&ValueKey::of(key))
    }

    pub fn remove(&mut self, key: &RichValue) -> Option<RichValue> {
        self.0.shift_remove(&ValueKey::of(key)).map(|(_, v)| v)
    }

    /// The row at `index`, in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&RichValue, &RichValue)> {
        self.0.get_index(index).map(|(_, (k, v))| (k, v))
    }

    /// Replaces `old` with `new` as a key, carrying the value over.
    ///
    /// The new key takes the old key's position, in amortized O(1). When `new`
    /// is already present elsewhere, that entry receives the value and `old`
    /// is removed, shifting the later rows. Returns `false` if `old` is not a
    /// key of this map.
    pub fn replace_key(&mut self, old: &RichValue, new: RichValue) -> bool {
        let old_key = ValueKey::of(old);
        let new_key = ValueKey::of(&new);
        let Some(index) = self.0.get_index_of(&old_key) else {
            return false;
        };

        if old_key == new_key {
            if let Some((_, entry)) = self.0.get_index_mut(index) {
                entry.0 = new;
            }
            return true;
        }

        if self.0.contains_key(&new_key) {
            let Some((_, (_, value))) = self.0.shift_remove_index(index) else {
                return false;
            };
            if let Some(existing) = self.0.get_mut(&new_key) {
                existing.1 = value;
            }
            return true;
        }

        let Some((_, (_, value))) = self.0.swap_remove_index(index) else {
            return false;
        };
        let (last, _) = self.0.insert_full(new_key, (new, value));
        self.0.swap_indices(index, last);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RichValue> {
        self.0.values().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &RichValue> {
        self.0.values().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RichValue, &RichValue)> {
        self.0.values().map(|(k, v)| (k, v))
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl FromIterator<(RichValue, RichValue)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (RichValue, RichValue)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_map_remove_keeps_order() {
        let mut map: ObjectMap = [("a", 1), ("b", 2), ("c", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), RichValue::from(v)))
            .collect();
        map.remove("b");
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_value_map_nan_key() {
        let mut map = ValueMap::new();
        map.insert(RichValue::from(f64::NAN), RichValue::from(1));
        assert_eq!(map.get(&RichValue::from(f64::NAN)), Some(&RichValue::from(1)));
    }

    #[test]
    fn test_replace_key_keeps_position() {
        let mut map: ValueMap = (0..3)
            .map(|i| (RichValue::from(i), RichValue::from(i * 10)))
            .collect();
        assert!(map.replace_key(&RichValue::from(1), RichValue::from("one")));

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![RichValue::from(0), RichValue::from("one"), RichValue::from(2)]
        );
        assert_eq!(map.get(&RichValue::from("one")), Some(&RichValue::from(10)));
        assert!(!map.contains_key(&RichValue::from(1)));

        assert!(map.replace_key(&RichValue::from(2), RichValue::from("two")));
        assert!(map.replace_key(&RichValue::from(0), RichValue::from("zero")));
        let rows: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            rows,
            vec![
                (RichValue::from("zero"), RichValue::from(0)),
                (RichValue::from("one"), RichValue::from(10)),
                (RichValue::from("two"), RichValue::from(20)),
            ]
        );
    }

    #[test]
    fn test_replace_key_onto_existing_key() {
        let mut map: ValueMap = (0..2)
            .map(|i| (RichValue::from(i), RichValue::from(i)))
            .collect();
        assert!(map.replace_key(&RichValue::from(0), RichValue::from(1)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&RichValue::from(1)), Some(&RichValue::from(0)));
    }

    #[test]
    fn test_replace_missing_key() {
        let mut map = ValueMap::new();
        assert!(!map.replace_key(&RichValue::from(0), RichValue::from(1)));
    }
}

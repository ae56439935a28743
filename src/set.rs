//! Unique-element collections.

use crate::value::ValueKey;
use crate::RichValue;
use indexmap::IndexMap;

/// An insertion-ordered set of rich values.
///
/// Membership follows JavaScript `Set` semantics: primitives by value (with
/// `NaN` equal to itself and `0` equal to `-0`), reference values and symbols
/// by identity.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{ValueSet, RichValue};
///
/// let mut set = ValueSet::new();
/// assert!(set.insert(RichValue::from(1)));
/// assert!(set.insert(RichValue::from(f64::NAN)));
/// assert!(!set.insert(RichValue::from(f64::NAN)));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueSet(IndexMap<ValueKey, RichValue>);

impl ValueSet {
    #[must_use]
    pub fn new() -> Self {
        ValueSet(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ValueSet(IndexMap::with_capacity(capacity))
    }

    /// Adds a value; returns `false` if an equal element was already present.
    pub fn insert(&mut self, value: RichValue) -> bool {
        let key = ValueKey::of(&value);
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value);
        true
    }

    #[must_use]
    pub fn contains(&self, value: &RichValue) -> bool {
        self.0.contains_key(&ValueKey::of(value))
    }

    /// Removes a value, preserving the order of the remaining elements.
    pub fn remove(&mut self, value: &RichValue) -> bool {
        self.0.shift_remove(&ValueKey::of(value)).is_some()
    }

    /// The element at `index`, in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&RichValue> {
        self.0.get_index(index).map(|(_, v)| v)
    }

    /// Replaces `old` by `new` at the same position, in amortized O(1).
    ///
    /// If `new` is already an element elsewhere, `old` is simply removed; that
    /// path shifts the later elements. Returns `false` if `old` is not an
    /// element.
    pub fn replace(&mut self, old: &RichValue, new: RichValue) -> bool {
        let old_key = ValueKey::of(old);
        let new_key = ValueKey::of(&new);
        let Some(index) = self.0.get_index_of(&old_key) else {
            return false;
        };

        if old_key == new_key {
            if let Some((_, slot)) = self.0.get_index_mut(index) {
                *slot = new;
            }
            return true;
        }

        if self.0.contains_key(&new_key) {
            self.0.shift_remove_index(index);
            return true;
        }

        // the last element fills the hole; swapping the appended entry back
        // restores the original order
        self.0.swap_remove_index(index);
        let (last, _) = self.0.insert_full(new_key, new);
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

    pub fn iter(&self) -> indexmap::map::Values<'_, ValueKey, RichValue> {
        self.0.values()
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl FromIterator<RichValue> for ValueSet {
    fn from_iter<T: IntoIterator<Item = RichValue>>(iter: T) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl IntoIterator for ValueSet {
    type Item = RichValue;
    type IntoIter = indexmap::map::IntoValues<ValueKey, RichValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

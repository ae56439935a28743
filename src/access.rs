//! Reading and writing values at a [`Path`] inside a value tree.
//!
//! Arrays are addressed by index, objects (and error and instance fields) by
//! key. Sets and maps have no native index, so an [`Accessor`] snapshots their
//! iteration order the first time it touches them and keeps addressing the
//! snapshot for the rest of the session: replacing the element at position
//! `k` never shifts what position `j` refers to.
//!
//! A map is addressed in two steps: the row position, then `0` for the key or
//! `1` for the value.
//!
//! ```rust
//! use serde_richjson::access::Accessor;
//! use serde_richjson::path::Path;
//! use serde_richjson::RichValue;
//!
//! let set = RichValue::set([10, 20, 30].map(RichValue::from));
//! let mut accessor = Accessor::new();
//!
//! let set = accessor
//!     .set_deep(set, &Path::root().child(1), |v| Ok(RichValue::from(v.as_i64().unwrap() * 2)))
//!     .unwrap();
//! let third = accessor.get_deep(&set, &Path::root().child(2)).unwrap();
//! assert_eq!(third, RichValue::from(30));
//! ```

use crate::path::{check_safe, Path, PathKey};
use crate::value::Shared;
use crate::{Error, Result, RichValue, ValueMap, ValueSet};
use std::collections::HashMap;
use std::rc::Rc;

/// A snapshot keeps its collection alive so the address stays unique.
struct Snapshot<T> {
    _owner: Shared<T>,
    items: Vec<RichValue>,
}

/// One access session with its set and map snapshots.
#[derive(Default)]
pub struct Accessor {
    sets: HashMap<usize, Snapshot<ValueSet>>,
    map_keys: HashMap<usize, Snapshot<ValueMap>>,
}

/// Which half of a map row a path addresses.
enum Side {
    Key,
    Value,
}

impl Accessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::PrototypePollution`] for unsafe paths, [`Error::NotFound`] for
    /// missing segments and [`Error::IndexOutOfBounds`] past a snapshot.
    pub fn get_deep(&mut self, root: &RichValue, path: &Path) -> Result<RichValue> {
        check_safe(path)?;
        let keys = path.keys();
        let mut current = root.clone();
        let mut i = 0;
        while i < keys.len() {
            let (next, used) = self.step(&current, &keys[i..], path)?;
            current = next;
            i += used;
        }
        Ok(current)
    }

    /// Replaces the value at `path` with `mapper(current)`.
    ///
    /// Containers along the path are mutated in place; the (possibly new) root
    /// is returned. With an empty path the result of `mapper(root)` is the new
    /// root.
    ///
    /// # Errors
    ///
    /// As [`Accessor::get_deep`], plus whatever `mapper` returns. Unsafe paths
    /// are rejected before anything is read or changed.
    pub fn set_deep<F>(&mut self, root: RichValue, path: &Path, mapper: F) -> Result<RichValue>
    where
        F: FnOnce(RichValue) -> Result<RichValue>,
    {
        check_safe(path)?;
        if path.is_empty() {
            return mapper(root);
        }
        self.set_in(&root, path.keys(), path, mapper)?;
        Ok(root)
    }

    /// Follows one address starting at `rest[0]`; returns the node reached and
    /// how many segments were consumed.
    fn step(&mut self, node: &RichValue, rest: &[PathKey], full: &Path) -> Result<(RichValue, usize)> {
        let key = &rest[0];
        let found = match node {
            RichValue::Array(items) => index(key).and_then(|i| items.borrow().get(i).cloned()),
            RichValue::Object(map) => map.borrow().get(&key.to_string()).cloned(),
            RichValue::Error(error) => {
                let error = error.borrow();
                match key.to_string().as_str() {
                    "name" => Some(RichValue::String(error.name.clone())),
                    "message" => Some(RichValue::String(error.message.clone())),
                    other => error.props.get(other).cloned(),
                }
            }
            RichValue::Instance(instance) => instance.borrow().fields.get(&key.to_string()).cloned(),
            RichValue::TypedArray(array) => {
                index(key).and_then(|i| array.borrow().get(i)).map(RichValue::Number)
            }
            RichValue::Set(set) => {
                let position = position(key, full)?;
                return Ok((self.set_element(set, position, full)?, 1));
            }
            RichValue::Map(map) => {
                let (row, side) = row_address(rest, full)?;
                let map_key = self.map_key(map, row, full)?;
                let value = match side {
                    Side::Key => map_key,
                    Side::Value => map
                        .borrow()
                        .get(&map_key)
                        .cloned()
                        .ok_or_else(|| Error::not_found(full.to_string()))?,
                };
                return Ok((value, 2));
            }
            _ => None,
        };
        found
            .map(|value| (value, 1))
            .ok_or_else(|| Error::not_found(full.to_string()))
    }

    fn set_in<F>(&mut self, node: &RichValue, rest: &[PathKey], full: &Path, mapper: F) -> Result<()>
    where
        F: FnOnce(RichValue) -> Result<RichValue>,
    {
        let not_found = || Error::not_found(full.to_string());
        let key = &rest[0];
        let last = rest.len() == 1;

        match node {
            RichValue::Array(items) => {
                let i = index(key).ok_or_else(not_found)?;
                let current = items.borrow().get(i).cloned().ok_or_else(not_found)?;
                if last {
                    let new = mapper(current)?;
                    items.borrow_mut()[i] = new;
                    Ok(())
                } else {
                    self.set_in(&current, &rest[1..], full, mapper)
                }
            }
            RichValue::Object(map) => {
                let key = key.to_string();
                let current = map.borrow().get(&key).cloned().ok_or_else(not_found)?;
                if last {
                    let new = mapper(current)?;
                    map.borrow_mut().insert(key, new);
                    Ok(())
                } else {
                    self.set_in(&current, &rest[1..], full, mapper)
                }
            }
            RichValue::Instance(instance) => {
                let key = key.to_string();
                let current = instance
                    .borrow()
                    .fields
                    .get(&key)
                    .cloned()
                    .ok_or_else(not_found)?;
                if last {
                    let new = mapper(current)?;
                    instance.borrow_mut().fields.insert(key, new);
                    Ok(())
                } else {
                    self.set_in(&current, &rest[1..], full, mapper)
                }
            }
            RichValue::Error(_) => {
                let (current, _) = self.step(node, rest, full)?;
                if !last {
                    return self.set_in(&current, &rest[1..], full, mapper);
                }
                let new = mapper(current)?;
                let RichValue::Error(error) = node else {
                    return Err(not_found());
                };
                let mut error = error.borrow_mut();
                match key.to_string().as_str() {
                    "name" | "message" => {
                        let text = new.as_str().map(str::to_string).ok_or_else(|| {
                            Error::type_mismatch(full.to_string(), "string", new.type_name())
                        })?;
                        if key.is("name") {
                            error.name = text;
                        } else {
                            error.message = text;
                        }
                    }
                    other => {
                        error.props.insert(other.to_string(), new);
                    }
                }
                Ok(())
            }
            RichValue::TypedArray(array) => {
                let i = index(key).ok_or_else(not_found)?;
                let current = array.borrow().get(i).ok_or_else(not_found)?;
                if !last {
                    return Err(not_found());
                }
                let new = mapper(RichValue::Number(current))?;
                let stored = new
                    .as_number()
                    .map_or(false, |n| array.borrow_mut().set(i, n));
                if stored {
                    Ok(())
                } else {
                    let expected = array.borrow().kind().name();
                    Err(Error::type_mismatch(full.to_string(), expected, new.type_name()))
                }
            }
            RichValue::Set(set) => {
                let position = position(key, full)?;
                let current = self.set_element(set, position, full)?;
                if !last {
                    return self.set_in(&current, &rest[1..], full, mapper);
                }
                let new = mapper(current.clone())?;
                set.borrow_mut().replace(&current, new.clone());
                if let Some(snapshot) = self.sets.get_mut(&address(set)) {
                    snapshot.items[position] = new;
                }
                Ok(())
            }
            RichValue::Map(map) => {
                let (row, side) = row_address(rest, full)?;
                let map_key = self.map_key(map, row, full)?;
                let rest = &rest[2..];
                match side {
                    Side::Key if rest.is_empty() => {
                        let new = mapper(map_key.clone())?;
                        map.borrow_mut().replace_key(&map_key, new.clone());
                        if let Some(snapshot) = self.map_keys.get_mut(&address(map)) {
                            snapshot.items[row] = new;
                        }
                        Ok(())
                    }
                    Side::Key => self.set_in(&map_key, rest, full, mapper),
                    Side::Value => {
                        let current = map.borrow().get(&map_key).cloned().ok_or_else(not_found)?;
                        if rest.is_empty() {
                            let new = mapper(current)?;
                            map.borrow_mut().insert(map_key, new);
                            Ok(())
                        } else {
                            self.set_in(&current, rest, full, mapper)
                        }
                    }
                }
            }
            _ => Err(not_found()),
        }
    }

    fn set_element(&mut self, set: &Shared<ValueSet>, position: usize, full: &Path) -> Result<RichValue> {
        let snapshot = self.sets.entry(address(set)).or_insert_with(|| Snapshot {
            _owner: Rc::clone(set),
            items: set.borrow().iter().cloned().collect(),
        });
        snapshot
            .items
            .get(position)
            .cloned()
            .ok_or_else(|| Error::index_out_of_bounds(full.to_string(), position, snapshot.items.len()))
    }

    fn map_key(&mut self, map: &Shared<ValueMap>, row: usize, full: &Path) -> Result<RichValue> {
        let snapshot = self.map_keys.entry(address(map)).or_insert_with(|| Snapshot {
            _owner: Rc::clone(map),
            items: map.borrow().keys().cloned().collect(),
        });
        snapshot
            .items
            .get(row)
            .cloned()
            .ok_or_else(|| Error::index_out_of_bounds(full.to_string(), row, snapshot.items.len()))
    }
}

fn address<T>(shared: &Shared<T>) -> usize {
    Rc::as_ptr(shared) as *const () as usize
}

fn index(key: &PathKey) -> Option<usize> {
    key.as_index()
}

fn position(key: &PathKey, full: &Path) -> Result<usize> {
    key.as_index().ok_or_else(|| Error::not_found(full.to_string()))
}

fn row_address(rest: &[PathKey], full: &Path) -> Result<(usize, Side)> {
    let row = position(&rest[0], full)?;
    match rest.get(1).and_then(PathKey::as_index) {
        Some(0) => Ok((row, Side::Key)),
        Some(1) => Ok((row, Side::Value)),
        _ => Err(Error::not_found(full.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse;
    use crate::{rich, ErrorValue, ObjectMap};

    fn numbers(value: &RichValue) -> Vec<i64> {
        value
            .as_set()
            .unwrap()
            .borrow()
            .iter()
            .filter_map(RichValue::as_i64)
            .collect()
    }

    fn double(v: RichValue) -> Result<RichValue> {
        Ok(RichValue::from(v.as_i64().unwrap_or_default() * 2))
    }

    #[test]
    fn test_array_and_object_addressing() {
        let root = rich!({ "a": [1, { "b": 2 }] });
        let mut accessor = Accessor::new();
        assert_eq!(accessor.get_deep(&root, &parse("a.1.b").unwrap()).unwrap(), RichValue::from(2));

        let root = accessor.set_deep(root, &parse("a.0").unwrap(), double).unwrap();
        assert_eq!(accessor.get_deep(&root, &parse("a.0").unwrap()).unwrap(), RichValue::from(2));
    }

    #[test]
    fn test_set_positions_are_stable() {
        let root = RichValue::set([10, 20, 30].map(RichValue::from));
        let mut accessor = Accessor::new();
        let root = accessor.set_deep(root, &parse("1").unwrap(), double).unwrap();
        assert_eq!(numbers(&root), vec![10, 40, 30]);

        let root = accessor
            .set_deep(root, &parse("2").unwrap(), |v| {
                assert_eq!(v, RichValue::from(30));
                Ok(RichValue::from(31))
            })
            .unwrap();
        assert_eq!(numbers(&root), vec![10, 40, 31]);
    }

    #[test]
    fn test_set_index_out_of_bounds() {
        let root = RichValue::set([RichValue::from(1)]);
        let mut accessor = Accessor::new();
        let err = accessor.get_deep(&root, &parse("3").unwrap()).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: 3, len: 1, .. }));
    }

    #[test]
    fn test_map_key_replacement_carries_value() {
        let root = RichValue::map([
            (RichValue::from("a"), RichValue::from(1)),
            (RichValue::from("b"), RichValue::from(2)),
        ]);
        let mut accessor = Accessor::new();
        let root = accessor
            .set_deep(root, &parse("0.0").unwrap(), |_| Ok(RichValue::from("z")))
            .unwrap();
        let root = accessor.set_deep(root, &parse("1.1").unwrap(), double).unwrap();

        let map = root.as_map().unwrap().borrow();
        let rows: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            rows,
            vec![
                (RichValue::from("z"), RichValue::from(1)),
                (RichValue::from("b"), RichValue::from(4)),
            ]
        );
        drop(map);
        assert_eq!(
            accessor.get_deep(&root, &parse("0.0").unwrap()).unwrap(),
            RichValue::from("z")
        );
    }

    #[test]
    fn test_map_requires_discriminator() {
        let root = RichValue::map([(RichValue::from(1), RichValue::from(2))]);
        let mut accessor = Accessor::new();
        assert!(matches!(
            accessor.get_deep(&root, &parse("0").unwrap()),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            accessor.get_deep(&root, &parse("0.2").unwrap()),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_pollution_rejected_before_mutation() {
        let root = rich!({ "a": 1 });
        let mut accessor = Accessor::new();
        let mut called = false;
        let err = accessor
            .set_deep(root.clone(), &parse("__proto__.a").unwrap(), |v| {
                called = true;
                Ok(v)
            })
            .unwrap_err();
        assert!(matches!(err, Error::PrototypePollution { .. }));
        assert!(!called);
        assert_eq!(root, rich!({ "a": 1 }));
    }

    #[test]
    fn test_missing_segment() {
        let root = rich!({ "a": 1 });
        let mut accessor = Accessor::new();
        assert!(matches!(
            accessor.get_deep(&root, &parse("b").unwrap()),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            accessor.set_deep(root, &parse("a.b").unwrap(), Ok),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_error_fields() {
        let mut props = ObjectMap::new();
        props.insert("code".to_string(), RichValue::from(1));
        let root = RichValue::error(ErrorValue {
            name: "TypeError".into(),
            message: "bad".into(),
            props,
        });
        let mut accessor = Accessor::new();
        assert_eq!(
            accessor.get_deep(&root, &parse("name").unwrap()).unwrap(),
            RichValue::from("TypeError")
        );
        let root = accessor.set_deep(root, &parse("code").unwrap(), double).unwrap();
        assert_eq!(
            accessor.get_deep(&root, &parse("code").unwrap()).unwrap(),
            RichValue::from(2)
        );
    }

    #[test]
    fn test_empty_path_maps_root() {
        let mut accessor = Accessor::new();
        let root = accessor.set_deep(RichValue::from(4), &Path::root(), double).unwrap();
        assert_eq!(root, RichValue::from(8));
    }
}

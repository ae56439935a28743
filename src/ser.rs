//! Conversion of `serde` data into [`RichValue`].
//!
//! [`ValueSerializer`] lets any `T: Serialize` enter the rich value world and
//! picks the richest faithful representation for each `serde` data model type:
//!
//! | serde type                          | rich value                         |
//! |-------------------------------------|------------------------------------|
//! | integers within `i64`               | `Number::Integer`                  |
//! | `u64`, `i128`, `u128` beyond `i64`  | `BigInt`                           |
//! | floats                              | `Number` (keeps `NaN`, `±Inf`, `-0`) |
//! | bytes                               | `Uint8Array`                       |
//! | unit, `None`                        | `Null`                             |
//! | sequences, tuples                   | `Array`                            |
//! | maps with string keys, structs      | `Object`                           |
//! | maps with other keys                | `Map`                              |
//! | enum variants with data             | `{ "Variant": data }`              |
//!
//! ```rust
//! use serde_richjson::{to_value, RichValue};
//! use std::collections::BTreeMap;
//!
//! let bytes = to_value(&serde_bytes_like()).unwrap();
//! assert!(matches!(bytes, RichValue::TypedArray(_)));
//!
//! let mut by_id = BTreeMap::new();
//! by_id.insert(1u32, "one");
//! assert!(to_value(&by_id).unwrap().is_map());
//!
//! # struct Bytes;
//! # impl serde::Serialize for Bytes {
//! #     fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
//! #         s.serialize_bytes(&[1, 2, 3])
//! #     }
//! # }
//! # fn serde_bytes_like() -> Bytes { Bytes }
//! ```

use crate::{Error, Number, ObjectMap, Result, RichValue, TypedArray, ValueMap};
use num_bigint::BigInt;
use serde::{ser, Serialize};

/// Serializer whose output is a [`RichValue`].
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<RichValue>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    entries: Vec<(RichValue, RichValue)>,
    current_key: Option<RichValue>,
    variant: Option<&'static str>,
}

/// Wraps `value` as `{ variant: value }`.
fn tagged(variant: &'static str, value: RichValue) -> RichValue {
    let mut object = ObjectMap::with_capacity(1);
    object.insert(variant.to_string(), value);
    RichValue::object(object)
}

fn integer(v: i128) -> RichValue {
    match i64::try_from(v) {
        Ok(i) => RichValue::Number(Number::Integer(i)),
        Err(_) => RichValue::BigInt(BigInt::from(v)),
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = RichValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<RichValue> {
        Ok(RichValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<RichValue> {
        Ok(RichValue::Number(Number::Integer(v as i64)))
    }

    fn serialize_i16(self, v: i16) -> Result<RichValue> {
        Ok(RichValue::Number(Number::Integer(v as i64)))
    }

    fn serialize_i32(self, v: i32) -> Result<RichValue> {
        Ok(RichValue::Number(Number::Integer(v as i64)))
    }

    fn serialize_i64(self, v: i64) -> Result<RichValue> {
        Ok(RichValue::Number(Number::Integer(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<RichValue> {
        Ok(integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<RichValue> {
        Ok(RichValue::Number(Number::Integer(v as i64)))
    }

    fn serialize_u16(self, v: u16) -> Result<RichValue> {
        Ok(RichValue::Number(Number::Integer(v as i64)))
    }

    fn serialize_u32(self, v: u32) -> Result<RichValue> {
        Ok(RichValue::Number(Number::Integer(v as i64)))
    }

    fn serialize_u64(self, v: u64) -> Result<RichValue> {
        Ok(integer(v as i128))
    }

    fn serialize_u128(self, v: u128) -> Result<RichValue> {
        match i64::try_from(v) {
            Ok(i) => Ok(RichValue::Number(Number::Integer(i))),
            Err(_) => Ok(RichValue::BigInt(BigInt::from(v))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<RichValue> {
        Ok(RichValue::Number(Number::from_f64(v as f64)))
    }

    fn serialize_f64(self, v: f64) -> Result<RichValue> {
        Ok(RichValue::Number(Number::from_f64(v)))
    }

    fn serialize_char(self, v: char) -> Result<RichValue> {
        Ok(RichValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<RichValue> {
        Ok(RichValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<RichValue> {
        Ok(RichValue::typed_array(TypedArray::Uint8(v.to_vec())))
    }

    fn serialize_none(self) -> Result<RichValue> {
        Ok(RichValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<RichValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<RichValue> {
        Ok(RichValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<RichValue> {
        Ok(RichValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<RichValue> {
        Ok(RichValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<RichValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<RichValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> RichValue {
        let array = RichValue::array(self.vec);
        match self.variant {
            Some(variant) => tagged(variant, array),
            None => array,
        }
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            entries: Vec::new(),
            current_key: None,
            variant,
        }
    }

    /// An object when every key is a string, a map otherwise.
    fn finish(self) -> RichValue {
        let value = if self.entries.iter().all(|(k, _)| k.is_string()) {
            let object: ObjectMap = self
                .entries
                .into_iter()
                .filter_map(|(k, v)| match k {
                    RichValue::String(k) => Some((k, v)),
                    _ => None,
                })
                .collect();
            RichValue::object(object)
        } else {
            let map: ValueMap = self.entries.into_iter().collect();
            RichValue::Map(crate::value::shared(map))
        };
        match self.variant {
            Some(variant) => tagged(variant, value),
            None => value,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = RichValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<RichValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = RichValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<RichValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = RichValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<RichValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = RichValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<RichValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = RichValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(to_value(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.entries.push((key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<RichValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = RichValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.entries.push((RichValue::from(key), to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<RichValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = RichValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.entries.push((RichValue::from(key), to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<RichValue> {
        Ok(self.finish())
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<RichValue> {
    value.serialize(ValueSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    enum Shape {
        Unit,
        Circle(f64),
        Rect(u32, u32),
        Named { w: u32 },
    }

    #[test]
    fn test_wide_integers_become_bigint() {
        assert_eq!(to_value(&7u64).unwrap(), RichValue::from(7));
        assert_eq!(
            to_value(&u64::MAX).unwrap(),
            RichValue::BigInt(BigInt::from(u64::MAX))
        );
        assert_eq!(
            to_value(&i128::MIN).unwrap(),
            RichValue::BigInt(BigInt::from(i128::MIN))
        );
        assert_eq!(to_value(&-5i128).unwrap(), RichValue::from(-5));
    }

    #[test]
    fn test_special_floats_kept() {
        assert_eq!(to_value(&f64::NAN).unwrap(), RichValue::Number(Number::NaN));
        assert_eq!(
            to_value(&f32::NEG_INFINITY).unwrap(),
            RichValue::Number(Number::NegativeInfinity)
        );
        assert_eq!(to_value(&-0.0f64).unwrap(), RichValue::Number(Number::Float(-0.0)));
    }

    #[test]
    fn test_enum_variants() {
        assert_eq!(to_value(&Shape::Unit).unwrap(), rich!("Unit"));
        assert_eq!(to_value(&Shape::Circle(1.5)).unwrap(), rich!({ "Circle": 1.5 }));
        assert_eq!(to_value(&Shape::Rect(1, 2)).unwrap(), rich!({ "Rect": [1, 2] }));
        assert_eq!(
            to_value(&Shape::Named { w: 3 }).unwrap(),
            rich!({ "Named": { "w": 3 } })
        );
    }

    #[test]
    fn test_non_string_keys_make_a_map() {
        let mut by_id = BTreeMap::new();
        by_id.insert(2u8, "b");
        by_id.insert(1u8, "a");
        let value = to_value(&by_id).unwrap();
        let map = value.as_map().unwrap().borrow();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&RichValue::from(1)), Some(&RichValue::from("a")));

        let mut by_name = BTreeMap::new();
        by_name.insert("k", 1);
        assert!(to_value(&by_name).unwrap().is_object());
    }

    #[test]
    fn test_option_and_unit() {
        assert_eq!(to_value(&None::<u8>).unwrap(), RichValue::Null);
        assert_eq!(to_value(&Some(3u8)).unwrap(), RichValue::from(3));
        assert_eq!(to_value(&()).unwrap(), RichValue::Null);
    }
}

//! Conversion of [`RichValue`] into `serde` data.
//!
//! [`ValueDeserializer`] drives any `T: Deserialize` from a rich value. It is
//! self-describing, so it mostly goes through `deserialize_any`:
//!
//! - `undefined` and `null` visit unit, or `None` for options
//! - big integers visit the narrowest of `i64`, `u64`, `i128` and `u128`
//!   that holds them, and fall back to their decimal string
//! - dates and regular expressions visit their string forms
//! - sets and typed arrays visit sequences; maps visit their entries with the
//!   original keys
//! - errors visit `name`, `message` and their extra properties
//!
//! Reference values are moved out of their handle when it is the last one and
//! cloned otherwise.
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_richjson::{from_value, rich, RichValue};
//! use std::collections::BTreeSet;
//!
//! let ids: BTreeSet<u32> = from_value(RichValue::set([3, 1, 2].map(RichValue::from))).unwrap();
//! assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
//!
//! #[derive(Deserialize)]
//! struct Page { title: String, views: Option<u64> }
//!
//! let page: Page = from_value(rich!({ "title": "Home", "views": (RichValue::Undefined) })).unwrap();
//! assert_eq!(page.title, "Home");
//! assert!(page.views.is_none());
//! ```

use crate::value::Shared;
use crate::{Error, Number, Result, RichValue, TypedArray};
use chrono::SecondsFormat;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::de;
use serde::forward_to_deserialize_any;
use std::rc::Rc;

/// Moves the value out of its handle, or clones it if the handle is shared.
fn take<T: Clone>(handle: Shared<T>) -> T {
    Rc::try_unwrap(handle)
        .map(|cell| cell.into_inner())
        .unwrap_or_else(|handle| handle.borrow().clone())
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<RichValue>,
}

impl SeqDeserializer {
    fn new(vec: Vec<RichValue>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(RichValue, RichValue)>,
    value: Option<RichValue>,
}

impl MapDeserializer {
    fn new(entries: Vec<(RichValue, RichValue)>) -> Self {
        MapDeserializer {
            iter: entries.into_iter(),
            value: None,
        }
    }

    fn from_fields<I: IntoIterator<Item = (String, RichValue)>>(fields: I) -> Self {
        Self::new(
            fields
                .into_iter()
                .map(|(k, v)| (RichValue::String(k), v))
                .collect(),
        )
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<RichValue>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(RichValue::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<RichValue>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(RichValue::Null) | Some(RichValue::Undefined) | None => Ok(()),
            Some(other) => Err(Error::custom(format!(
                "expected unit variant, found {}",
                other.type_name()
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(RichValue::Array(items)) => visitor.visit_seq(SeqDeserializer::new(take(items))),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(RichValue::Object(map)) => visitor.visit_map(MapDeserializer::from_fields(take(map))),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

/// Deserializer reading from an owned [`RichValue`].
pub struct ValueDeserializer {
    value: RichValue,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: RichValue) -> Self {
        ValueDeserializer { value }
    }
}

fn visit_bigint<'de, V: de::Visitor<'de>>(bi: BigInt, visitor: V) -> Result<V::Value> {
    if let Some(i) = bi.to_i64() {
        visitor.visit_i64(i)
    } else if let Some(u) = bi.to_u64() {
        visitor.visit_u64(u)
    } else if let Some(i) = bi.to_i128() {
        visitor.visit_i128(i)
    } else if let Some(u) = bi.to_u128() {
        visitor.visit_u128(u)
    } else {
        visitor.visit_string(bi.to_string())
    }
}

fn visit_number<'de, V: de::Visitor<'de>>(n: Number, visitor: V) -> Result<V::Value> {
    match n {
        Number::Integer(i) => visitor.visit_i64(i),
        other => visitor.visit_f64(other.as_f64()),
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            RichValue::Undefined | RichValue::Null => visitor.visit_unit(),
            RichValue::Bool(b) => visitor.visit_bool(b),
            RichValue::Number(n) => visit_number(n, visitor),
            RichValue::String(s) => visitor.visit_string(s),
            RichValue::BigInt(bi) => visit_bigint(bi, visitor),
            RichValue::Date(dt) => {
                visitor.visit_string(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            RichValue::RegExp(re) => visitor.visit_string(re.to_string()),
            RichValue::Symbol(sym) => match sym.description() {
                Some(description) => visitor.visit_string(description.to_string()),
                None => visitor.visit_unit(),
            },
            RichValue::Array(items) => visitor.visit_seq(SeqDeserializer::new(take(items))),
            RichValue::Object(map) => visitor.visit_map(MapDeserializer::from_fields(take(map))),
            RichValue::Set(set) => {
                visitor.visit_seq(SeqDeserializer::new(take(set).into_iter().collect()))
            }
            RichValue::Map(map) => {
                let entries = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                visitor.visit_map(MapDeserializer::new(entries))
            }
            RichValue::Error(error) => {
                let error = take(error);
                let fields = [
                    ("name".to_string(), RichValue::String(error.name)),
                    ("message".to_string(), RichValue::String(error.message)),
                ]
                .into_iter()
                .chain(error.props);
                visitor.visit_map(MapDeserializer::from_fields(fields))
            }
            RichValue::Instance(instance) => {
                visitor.visit_map(MapDeserializer::from_fields(take(instance).fields))
            }
            RichValue::TypedArray(array) => {
                let items = array
                    .borrow()
                    .to_numbers()
                    .into_iter()
                    .map(RichValue::Number)
                    .collect();
                visitor.visit_seq(SeqDeserializer::new(items))
            }
            RichValue::Extension(ext) => Err(Error::unsupported_type(&format!(
                "extension value {:?}",
                ext
            ))),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            RichValue::Undefined | RichValue::Null => visitor.visit_none(),
            value => visitor.visit_some(ValueDeserializer::new(value)),
        }
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            RichValue::TypedArray(array) => match take(array) {
                TypedArray::Uint8(bytes) | TypedArray::Uint8Clamped(bytes) => {
                    visitor.visit_byte_buf(bytes)
                }
                other => ValueDeserializer::new(RichValue::typed_array(other)).deserialize_any(visitor),
            },
            value => ValueDeserializer::new(value).deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            RichValue::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            RichValue::Object(map) => {
                let mut fields = take(map).into_iter();
                match (fields.next(), fields.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    _ => Err(Error::custom("expected an object with a single variant key")),
                }
            }
            other => Err(Error::custom(format!(
                "expected enum, found {}",
                other.type_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

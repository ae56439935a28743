//! Fixed-width numeric arrays.
//!
//! A [`TypedArray`] travels as a plain array of numbers tagged with its
//! [`TypedArrayKind`]. Decoding checks that every number fits the element
//! type; a value that would be wrapped or truncated is rejected instead.

use crate::Number;
use std::fmt;

/// Element type of a [`TypedArray`], named as on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl TypedArrayKind {
    pub const ALL: [TypedArrayKind; 9] = [
        TypedArrayKind::Int8,
        TypedArrayKind::Uint8,
        TypedArrayKind::Uint8Clamped,
        TypedArrayKind::Int16,
        TypedArrayKind::Uint16,
        TypedArrayKind::Int32,
        TypedArrayKind::Uint32,
        TypedArrayKind::Float32,
        TypedArrayKind::Float64,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TypedArrayKind::Int8 => "Int8Array",
            TypedArrayKind::Uint8 => "Uint8Array",
            TypedArrayKind::Uint8Clamped => "Uint8ClampedArray",
            TypedArrayKind::Int16 => "Int16Array",
            TypedArrayKind::Uint16 => "Uint16Array",
            TypedArrayKind::Int32 => "Int32Array",
            TypedArrayKind::Uint32 => "Uint32Array",
            TypedArrayKind::Float32 => "Float32Array",
            TypedArrayKind::Float64 => "Float64Array",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for TypedArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-width numeric array.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{Number, TypedArray, TypedArrayKind};
///
/// let bytes = TypedArray::Uint8(vec![1, 2, 255]);
/// assert_eq!(bytes.kind(), TypedArrayKind::Uint8);
///
/// let numbers = bytes.to_numbers();
/// assert_eq!(TypedArray::from_numbers(TypedArrayKind::Uint8, &numbers), Some(bytes));
///
/// // 256 does not fit a byte
/// assert!(TypedArray::from_numbers(TypedArrayKind::Uint8, &[Number::Integer(256)]).is_none());
/// ```
#[derive(Clone, Debug)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Uint8Clamped(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! each_variant {
    ($array:expr, $items:ident => $body:expr) => {
        match $array {
            TypedArray::Int8($items) => $body,
            TypedArray::Uint8($items) => $body,
            TypedArray::Uint8Clamped($items) => $body,
            TypedArray::Int16($items) => $body,
            TypedArray::Uint16($items) => $body,
            TypedArray::Int32($items) => $body,
            TypedArray::Uint32($items) => $body,
            TypedArray::Float32($items) => $body,
            TypedArray::Float64($items) => $body,
        }
    };
}

fn integers<T: TryFrom<i64>>(numbers: &[Number]) -> Option<Vec<T>> {
    numbers
        .iter()
        .map(|n| n.as_i64().and_then(|i| T::try_from(i).ok()))
        .collect()
}

impl TypedArray {
    #[must_use]
    pub fn kind(&self) -> TypedArrayKind {
        match self {
            TypedArray::Int8(_) => TypedArrayKind::Int8,
            TypedArray::Uint8(_) => TypedArrayKind::Uint8,
            TypedArray::Uint8Clamped(_) => TypedArrayKind::Uint8Clamped,
            TypedArray::Int16(_) => TypedArrayKind::Int16,
            TypedArray::Uint16(_) => TypedArrayKind::Uint16,
            TypedArray::Int32(_) => TypedArrayKind::Int32,
            TypedArray::Uint32(_) => TypedArrayKind::Uint32,
            TypedArray::Float32(_) => TypedArrayKind::Float32,
            TypedArray::Float64(_) => TypedArrayKind::Float64,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        each_variant!(self, items => items.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index` as a [`Number`].
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Number> {
        each_variant!(self, items => items.get(index).map(|&x| Number::from(x)))
    }

    /// Overwrites the element at `index`; fails if `value` does not fit.
    pub fn set(&mut self, index: usize, value: &Number) -> bool {
        if index >= self.len() {
            return false;
        }
        let Some(single) = TypedArray::from_numbers(self.kind(), std::slice::from_ref(value)) else {
            return false;
        };
        match (self, single) {
            (TypedArray::Int8(items), TypedArray::Int8(v)) => items[index] = v[0],
            (TypedArray::Uint8(items), TypedArray::Uint8(v)) => items[index] = v[0],
            (TypedArray::Uint8Clamped(items), TypedArray::Uint8Clamped(v)) => items[index] = v[0],
            (TypedArray::Int16(items), TypedArray::Int16(v)) => items[index] = v[0],
            (TypedArray::Uint16(items), TypedArray::Uint16(v)) => items[index] = v[0],
            (TypedArray::Int32(items), TypedArray::Int32(v)) => items[index] = v[0],
            (TypedArray::Uint32(items), TypedArray::Uint32(v)) => items[index] = v[0],
            (TypedArray::Float32(items), TypedArray::Float32(v)) => items[index] = v[0],
            (TypedArray::Float64(items), TypedArray::Float64(v)) => items[index] = v[0],
            _ => return false,
        }
        true
    }

    /// All elements as [`Number`]s, in order.
    #[must_use]
    pub fn to_numbers(&self) -> Vec<Number> {
        each_variant!(self, items => items.iter().map(|&x| Number::from(x)).collect())
    }

    /// Builds an array of `kind` from `numbers`.
    ///
    /// Integer kinds accept only integral values in range; float kinds accept
    /// any number, including the special values.
    #[must_use]
    pub fn from_numbers(kind: TypedArrayKind, numbers: &[Number]) -> Option<Self> {
        Some(match kind {
            TypedArrayKind::Int8 => TypedArray::Int8(integers(numbers)?),
            TypedArrayKind::Uint8 => TypedArray::Uint8(integers(numbers)?),
            TypedArrayKind::Uint8Clamped => TypedArray::Uint8Clamped(integers(numbers)?),
            TypedArrayKind::Int16 => TypedArray::Int16(integers(numbers)?),
            TypedArrayKind::Uint16 => TypedArray::Uint16(integers(numbers)?),
            TypedArrayKind::Int32 => TypedArray::Int32(integers(numbers)?),
            TypedArrayKind::Uint32 => TypedArray::Uint32(integers(numbers)?),
            TypedArrayKind::Float32 => {
                TypedArray::Float32(numbers.iter().map(|n| n.as_f64() as f32).collect())
            }
            TypedArrayKind::Float64 => {
                TypedArray::Float64(numbers.iter().map(Number::as_f64).collect())
            }
        })
    }
}

impl PartialEq for TypedArray {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.to_numbers() == other.to_numbers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in TypedArrayKind::ALL {
            assert_eq!(TypedArrayKind::from_name(kind.name()), Some(kind));
        }
        assert!(TypedArrayKind::from_name("BigInt64Array").is_none());
    }

    #[test]
    fn test_float_arrays_keep_special_values() {
        let array = TypedArray::Float64(vec![1.5, f64::NAN, f64::NEG_INFINITY, -0.0]);
        let numbers = array.to_numbers();
        assert_eq!(numbers[1], Number::NaN);
        assert_eq!(
            TypedArray::from_numbers(TypedArrayKind::Float64, &numbers),
            Some(array)
        );
    }

    #[test]
    fn test_integer_arrays_reject_fractions() {
        assert!(TypedArray::from_numbers(TypedArrayKind::Int32, &[Number::Float(1.5)]).is_none());
        assert!(TypedArray::from_numbers(TypedArrayKind::Int8, &[Number::Integer(-129)]).is_none());
        assert!(TypedArray::from_numbers(TypedArrayKind::Uint16, &[Number::NaN]).is_none());
    }

    #[test]
    fn test_set_element() {
        let mut array = TypedArray::Int16(vec![1, 2, 3]);
        assert!(array.set(1, &Number::Integer(-7)));
        assert_eq!(array.get(1), Some(Number::Integer(-7)));
        assert!(!array.set(1, &Number::Integer(40_000)));
        assert!(!array.set(3, &Number::Integer(0)));
    }
}

//! Dynamic representation of rich values.
//!
//! [`RichValue`] is the superset of JSON this crate round-trips: besides the
//! JSON primitives, arrays and objects it can hold `undefined`, big integers,
//! dates, regular expressions, symbols, sets, maps with arbitrary keys, errors,
//! instances of registered classes, typed arrays and user-defined extensions.
//!
//! ## Values and references
//!
//! Arrays, objects, sets, maps, errors, instances and typed arrays are
//! *reference* values: they live behind a [`Shared`] handle
//! (`Rc<RefCell<T>>`). Cloning a `RichValue` clones the handle, so the same
//! object can sit in several places of a tree and keeps its identity through a
//! serialization round trip.
//!
//! ```rust
//! use serde_richjson::{rich, RichValue};
//!
//! let shared = rich!({ "id": 1 });
//! let root = rich!({ "a": (shared.clone()), "b": (shared.clone()) });
//!
//! let back = serde_richjson::deserialize(serde_richjson::serialize(&root).unwrap()).unwrap();
//! let obj = back.as_object().unwrap().borrow();
//! assert!(obj.get("a").unwrap().same_reference(obj.get("b").unwrap()));
//! ```
//!
//! Everything else (primitives, big integers, dates, regular expressions) is
//! compared and copied by value.
//!
//! ## Number semantics
//!
//! [`Number`] equality follows `Object.is`: `NaN` equals `NaN`, `0` and `-0`
//! differ, and `Integer(1)` equals `Float(1.0)`.

use crate::registry::Class;
use crate::{Error, ObjectMap, Result, TypedArray, ValueMap, ValueSet};
use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

/// A mutable, reference-counted slot holding a reference value.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps `value` in a fresh [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// A dynamically-typed rich value.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{RichValue, Number};
///
/// let undefined = RichValue::Undefined;
/// let nan = RichValue::Number(Number::NaN);
/// let set = RichValue::set([RichValue::from(1), RichValue::from(2)]);
///
/// assert!(undefined.is_undefined());
/// assert_eq!(nan, RichValue::from(f64::NAN));
/// assert!(set.is_reference());
/// ```
#[derive(Clone, Debug, Default)]
pub enum RichValue {
    Undefined,
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    BigInt(BigInt),
    Date(DateTime<Utc>),
    RegExp(RegExp),
    Symbol(Symbol),
    Array(Shared<Vec<RichValue>>),
    Object(Shared<ObjectMap>),
    Set(Shared<ValueSet>),
    Map(Shared<ValueMap>),
    Error(Shared<ErrorValue>),
    Instance(Shared<Instance>),
    TypedArray(Shared<TypedArray>),
    Extension(Rc<dyn Extension>),
}

/// Convenience alias.
pub type Value = RichValue;

/// A numeric value: an integer, a float, or one of the special IEEE values.
///
/// Negative zero is represented as `Float(-0.0)`.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::Number;
///
/// assert!(Number::Integer(42).is_integer());
/// assert!(Number::NaN.is_special());
/// assert!(Number::Float(-0.0).is_special());
/// assert_eq!(Number::from_f64(f64::INFINITY), Number::Infinity);
/// ```
#[derive(Clone, Debug)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    /// Builds a number from a float, mapping non-finite values to their variants.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns `true` for the values plain JSON cannot carry:
    /// `NaN`, `Infinity`, `-Infinity` and `-0`.
    #[inline]
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.special_name().is_some()
    }

    /// The wire spelling of a special value, if this is one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_richjson::Number;
    ///
    /// assert_eq!(Number::NegativeInfinity.special_name(), Some("-Infinity"));
    /// assert_eq!(Number::Float(-0.0).special_name(), Some("-0"));
    /// assert_eq!(Number::Float(0.0).special_name(), None);
    /// ```
    #[must_use]
    pub fn special_name(&self) -> Option<&'static str> {
        match self {
            Number::NaN => Some("NaN"),
            Number::Infinity => Some("Infinity"),
            Number::NegativeInfinity => Some("-Infinity"),
            Number::Integer(_) => None,
            Number::Float(f) if f.is_nan() => Some("NaN"),
            Number::Float(f) if *f == f64::INFINITY => Some("Infinity"),
            Number::Float(f) if *f == f64::NEG_INFINITY => Some("-Infinity"),
            Number::Float(f) if *f == 0.0 && f.is_sign_negative() => Some("-0"),
            Number::Float(_) => None,
        }
    }

    /// Inverse of [`Number::special_name`].
    #[must_use]
    pub fn from_special_name(name: &str) -> Option<Self> {
        match name {
            "NaN" => Some(Number::NaN),
            "Infinity" => Some(Number::Infinity),
            "-Infinity" => Some(Number::NegativeInfinity),
            "-0" => Some(Number::Float(-0.0)),
            _ => None,
        }
    }

    /// Converts this number to an `i64` if it is integral and in range.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }

    /// The plain JSON number for a non-special value.
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Number> {
        match self {
            Number::Integer(i) => Some(serde_json::Number::from(*i)),
            Number::Float(f) if !self.is_special() => serde_json::Number::from_f64(*f),
            _ => None,
        }
    }

    pub(crate) fn from_json(n: &serde_json::Number) -> Self {
        match n.as_i64() {
            Some(i) => Number::Integer(i),
            None => Number::from_f64(n.as_f64().unwrap_or(f64::NAN)),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        if let (Number::Integer(a), Number::Integer(b)) = (self, other) {
            return a == b;
        }
        let (a, b) = (self.as_f64(), other.as_f64());
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        a == b && a.is_sign_negative() == b.is_sign_negative()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.special_name() {
            Some(name) => f.write_str(name),
            None => match self {
                Number::Integer(i) => write!(f, "{}", i),
                Number::Float(fl) => write!(f, "{}", fl),
                _ => Ok(()),
            },
        }
    }
}

macro_rules! number_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(value: $t) -> Self {
                    Number::Integer(value as i64)
                }
            }
        )*
    };
}

number_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::from_f64(value as f64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
    }
}

/// A regular expression kept as its source and flags.
///
/// Patterns are carried, not compiled.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegExp {
    pub source: String,
    pub flags: String,
}

impl RegExp {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        RegExp {
            source: source.into(),
            flags: flags.into(),
        }
    }

    /// Parses the `/source/flags` literal form.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_richjson::RegExp;
    ///
    /// let re = RegExp::parse("/a\\/b/gi").unwrap();
    /// assert_eq!(re.source, "a\\/b");
    /// assert_eq!(re.flags, "gi");
    /// assert!(RegExp::parse("abc").is_none());
    /// ```
    #[must_use]
    pub fn parse(literal: &str) -> Option<Self> {
        let body = literal.strip_prefix('/')?;
        let end = body.rfind('/')?;
        Some(RegExp::new(&body[..end], &body[end + 1..]))
    }
}

impl fmt::Display for RegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// A unique symbolic token.
///
/// Two symbols are equal only if they are the same token; the description is
/// informational. Symbols are serializable only once registered.
#[derive(Clone)]
pub struct Symbol(Arc<Option<String>>);

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        Symbol(Arc::new(Some(description.into())))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Symbol(Arc::new(None))
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

/// An error-like value: a name, a message and any extra properties.
///
/// Only properties on the error allow-list survive serialization.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub props: ObjectMap,
}

impl ErrorValue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorValue {
            name: name.into(),
            message: message.into(),
            props: ObjectMap::new(),
        }
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: RichValue) -> Self {
        self.props.insert(key.into(), value);
        self
    }
}

/// An instance of a registered [`Class`].
#[derive(Clone)]
pub struct Instance {
    pub class: Arc<Class>,
    pub fields: ObjectMap,
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.class, &other.class) && self.fields == other.fields
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.class.name())
            .field("fields", &self.fields)
            .finish()
    }
}

/// A user-defined value that only a custom transformer knows how to encode.
///
/// Implemented for every `'static` type with `Debug` and `PartialEq`.
pub trait Extension: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Extension) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq> Extension for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Extension) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

impl RichValue {
    /// Creates an array value.
    pub fn array(items: Vec<RichValue>) -> Self {
        RichValue::Array(shared(items))
    }

    /// Creates an object value.
    pub fn object(map: ObjectMap) -> Self {
        RichValue::Object(shared(map))
    }

    /// Creates a set value; duplicate elements are dropped.
    pub fn set<I: IntoIterator<Item = RichValue>>(items: I) -> Self {
        RichValue::Set(shared(items.into_iter().collect()))
    }

    /// Creates a map value from key/value pairs.
    pub fn map<I: IntoIterator<Item = (RichValue, RichValue)>>(entries: I) -> Self {
        RichValue::Map(shared(entries.into_iter().collect()))
    }

    pub fn error(error: ErrorValue) -> Self {
        RichValue::Error(shared(error))
    }

    pub fn typed_array(array: TypedArray) -> Self {
        RichValue::TypedArray(shared(array))
    }

    /// Creates an instance of `class` holding `fields`.
    pub fn instance(class: &Arc<Class>, fields: ObjectMap) -> Self {
        RichValue::Instance(shared(Instance {
            class: Arc::clone(class),
            fields,
        }))
    }

    /// Wraps a user-defined value.
    pub fn extension<T: Extension>(value: T) -> Self {
        RichValue::Extension(Rc::new(value))
    }

    /// Address identifying a reference value, `None` for value types.
    ///
    /// The address is only meaningful while the value is alive.
    #[must_use]
    pub fn identity(&self) -> Option<usize> {
        let address = match self {
            RichValue::Array(rc) => Rc::as_ptr(rc) as *const () as usize,
            RichValue::Object(rc) => Rc::as_ptr(rc) as *const () as usize,
            RichValue::Set(rc) => Rc::as_ptr(rc) as *const () as usize,
            RichValue::Map(rc) => Rc::as_ptr(rc) as *const () as usize,
            RichValue::Error(rc) => Rc::as_ptr(rc) as *const () as usize,
            RichValue::Instance(rc) => Rc::as_ptr(rc) as *const () as usize,
            RichValue::TypedArray(rc) => Rc::as_ptr(rc) as *const () as usize,
            _ => return None,
        };
        Some(address)
    }

    #[inline]
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.identity().is_some()
    }

    /// Returns `true` if both values are the same reference.
    #[must_use]
    pub fn same_reference(&self, other: &RichValue) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Short name of the value's kind, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            RichValue::Undefined => "undefined",
            RichValue::Null => "null",
            RichValue::Bool(_) => "boolean",
            RichValue::Number(_) => "number",
            RichValue::String(_) => "string",
            RichValue::BigInt(_) => "bigint",
            RichValue::Date(_) => "Date",
            RichValue::RegExp(_) => "RegExp",
            RichValue::Symbol(_) => "symbol",
            RichValue::Array(_) => "array",
            RichValue::Object(_) => "object",
            RichValue::Set(_) => "Set",
            RichValue::Map(_) => "Map",
            RichValue::Error(_) => "Error",
            RichValue::Instance(_) => "class instance",
            RichValue::TypedArray(_) => "typed array",
            RichValue::Extension(_) => "extension",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, RichValue::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, RichValue::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, RichValue::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, RichValue::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, RichValue::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, RichValue::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, RichValue::Set(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, RichValue::Map(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RichValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RichValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            RichValue::Number(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Shared<Vec<RichValue>>> {
        match self {
            RichValue::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Shared<ObjectMap>> {
        match self {
            RichValue::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_set(&self) -> Option<&Shared<ValueSet>> {
        match self {
            RichValue::Set(set) => Some(set),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Shared<ValueMap>> {
        match self {
            RichValue::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            RichValue::Date(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            RichValue::BigInt(bi) => Some(bi),
            _ => None,
        }
    }

    /// Downcasts an extension value to its concrete type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            RichValue::Extension(ext) => ext.as_ref().as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Builds a value from plain JSON. Every container gets a fresh handle.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => RichValue::Null,
            serde_json::Value::Bool(b) => RichValue::Bool(b),
            serde_json::Value::Number(n) => RichValue::Number(Number::from_json(&n)),
            serde_json::Value::String(s) => RichValue::String(s),
            serde_json::Value::Array(items) => {
                RichValue::array(items.into_iter().map(RichValue::from_json).collect())
            }
            serde_json::Value::Object(map) => RichValue::object(
                map.into_iter()
                    .map(|(k, v)| (k, RichValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts a plain value back into JSON.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedType`] if the tree holds anything JSON
    /// cannot carry without annotations.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            RichValue::Null => Ok(serde_json::Value::Null),
            RichValue::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            RichValue::Number(n) => n
                .to_json()
                .map(serde_json::Value::Number)
                .ok_or_else(|| Error::unsupported_type(&format!("{} in plain JSON", n))),
            RichValue::String(s) => Ok(serde_json::Value::String(s.clone())),
            RichValue::Array(items) => items
                .borrow()
                .iter()
                .map(RichValue::to_json)
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
            RichValue::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map.borrow().iter() {
                    out.insert(k.clone(), v.to_json()?);
                }
                Ok(serde_json::Value::Object(out))
            }
            other => Err(Error::unsupported_type(&format!(
                "{} in plain JSON",
                other.type_name()
            ))),
        }
    }
}

impl PartialEq for RichValue {
    fn eq(&self, other: &Self) -> bool {
        use RichValue::*;
        match (self, other) {
            (Undefined, Undefined) | (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (BigInt(a), BigInt(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (RegExp(a), RegExp(b)) => a == b,
            (Symbol(a), Symbol(b)) => a == b,
            (Array(a), Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Object(a), Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Set(a), Set(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Map(a), Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Error(a), Error(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Instance(a), Instance(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (TypedArray(a), TypedArray(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Extension(a), Extension(b)) => Rc::ptr_eq(a, b) || a.dyn_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Display for RichValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RichValue::Undefined => write!(f, "undefined"),
            RichValue::Null => write!(f, "null"),
            RichValue::Bool(b) => write!(f, "{}", b),
            RichValue::Number(n) => write!(f, "{}", n),
            RichValue::String(s) => write!(f, "{:?}", s),
            RichValue::BigInt(bi) => write!(f, "{}n", bi),
            RichValue::Date(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            RichValue::RegExp(re) => write!(f, "{}", re),
            RichValue::Symbol(s) => write!(f, "{:?}", s),
            RichValue::Array(items) => {
                write!(
                    f,
                    "[{}]",
                    items
                        .borrow()
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
            RichValue::Object(map) => write!(f, "{{object({})}}", map.borrow().len()),
            RichValue::Set(set) => write!(f, "Set({})", set.borrow().len()),
            RichValue::Map(map) => write!(f, "Map({})", map.borrow().len()),
            RichValue::Error(err) => {
                let err = err.borrow();
                write!(f, "{}: {}", err.name, err.message)
            }
            RichValue::Instance(inst) => write!(f, "{} {{..}}", inst.borrow().class.name()),
            RichValue::TypedArray(arr) => {
                let arr = arr.borrow();
                write!(f, "{}({})", arr.kind().name(), arr.len())
            }
            RichValue::Extension(ext) => write!(f, "{:?}", ext),
        }
    }
}

impl TryFrom<RichValue> for i64 {
    type Error = crate::Error;

    fn try_from(value: RichValue) -> crate::Result<Self> {
        value.as_i64().ok_or_else(|| {
            crate::Error::custom(format!("expected integer, found {}", value.type_name()))
        })
    }
}

impl TryFrom<RichValue> for f64 {
    type Error = crate::Error;

    fn try_from(value: RichValue) -> crate::Result<Self> {
        value.as_f64().ok_or_else(|| {
            crate::Error::custom(format!("expected number, found {}", value.type_name()))
        })
    }
}

impl TryFrom<RichValue> for bool {
    type Error = crate::Error;

    fn try_from(value: RichValue) -> crate::Result<Self> {
        value.as_bool().ok_or_else(|| {
            crate::Error::custom(format!("expected bool, found {}", value.type_name()))
        })
    }
}

impl TryFrom<RichValue> for String {
    type Error = crate::Error;

    fn try_from(value: RichValue) -> crate::Result<Self> {
        match value {
            RichValue::String(s) => Ok(s),
            other => Err(crate::Error::custom(format!(
                "expected string, found {}",
                other.type_name()
            ))),
        }
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RichValue {
                fn from(value: $t) -> Self {
                    RichValue::Number(Number::from(value))
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

impl From<bool> for RichValue {
    fn from(value: bool) -> Self {
        RichValue::Bool(value)
    }
}

impl From<Number> for RichValue {
    fn from(value: Number) -> Self {
        RichValue::Number(value)
    }
}

impl From<String> for RichValue {
    fn from(value: String) -> Self {
        RichValue::String(value)
    }
}

impl From<&str> for RichValue {
    fn from(value: &str) -> Self {
        RichValue::String(value.to_string())
    }
}

impl From<BigInt> for RichValue {
    fn from(value: BigInt) -> Self {
        RichValue::BigInt(value)
    }
}

impl From<DateTime<Utc>> for RichValue {
    fn from(value: DateTime<Utc>) -> Self {
        RichValue::Date(value)
    }
}

impl From<RegExp> for RichValue {
    fn from(value: RegExp) -> Self {
        RichValue::RegExp(value)
    }
}

impl From<Symbol> for RichValue {
    fn from(value: Symbol) -> Self {
        RichValue::Symbol(value)
    }
}

impl From<Vec<RichValue>> for RichValue {
    fn from(value: Vec<RichValue>) -> Self {
        RichValue::array(value)
    }
}

impl From<ObjectMap> for RichValue {
    fn from(value: ObjectMap) -> Self {
        RichValue::object(value)
    }
}

impl From<ValueSet> for RichValue {
    fn from(value: ValueSet) -> Self {
        RichValue::Set(shared(value))
    }
}

impl From<ValueMap> for RichValue {
    fn from(value: ValueMap) -> Self {
        RichValue::Map(shared(value))
    }
}

impl From<ErrorValue> for RichValue {
    fn from(value: ErrorValue) -> Self {
        RichValue::error(value)
    }
}

impl From<TypedArray> for RichValue {
    fn from(value: TypedArray) -> Self {
        RichValue::typed_array(value)
    }
}

/// Hashable identity of a value as a set element or map key.
///
/// Primitives compare by value with `SameValueZero` semantics (`NaN` equals
/// `NaN`, `0` equals `-0`); reference values and symbols compare by address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    String(String),
    BigInt(BigInt),
    Date(DateTime<Utc>),
    RegExp(RegExp),
    Address(usize),
}

impl ValueKey {
    pub fn of(value: &RichValue) -> Self {
        match value {
            RichValue::Undefined => ValueKey::Undefined,
            RichValue::Null => ValueKey::Null,
            RichValue::Bool(b) => ValueKey::Bool(*b),
            RichValue::Number(n) => match n.as_i64() {
                Some(i) => ValueKey::Int(i),
                None if n.as_f64().is_nan() => ValueKey::Float(f64::NAN.to_bits()),
                None => ValueKey::Float(n.as_f64().to_bits()),
            },
            RichValue::String(s) => ValueKey::String(s.clone()),
            RichValue::BigInt(bi) => ValueKey::BigInt(bi.clone()),
            RichValue::Date(dt) => ValueKey::Date(*dt),
            RichValue::RegExp(re) => ValueKey::RegExp(re.clone()),
            RichValue::Symbol(s) => ValueKey::Address(s.address()),
            RichValue::Extension(ext) => ValueKey::Address(Rc::as_ptr(ext) as *const () as usize),
            reference => ValueKey::Address(reference.identity().unwrap_or_default()),
        }
    }
}

//! # serde_richjson
//!
//! Round-trip values that plain JSON cannot express through plain JSON.
//!
//! ## What does it do?
//!
//! JSON knows null, booleans, numbers, strings, arrays and objects. Real data
//! also has dates, big integers, `NaN`, sets, maps with non-string keys,
//! `undefined`, errors, class instances and objects shared between several
//! places. `serde_richjson` turns such a value into a pair:
//!
//! - `json`: the plain JSON projection of the value
//! - `meta`: a compact side channel recording, per path, how to restore what
//!   the projection lost, and which paths hold the same reference
//!
//! and turns the pair back into the original value.
//!
//! ## Key Features
//!
//! - **Lossless**: `NaN`, `Infinity`, `-Infinity` and `-0` stay distinct;
//!   dates keep millisecond precision; big integers keep every digit
//! - **Identity preserving**: a value reachable through several paths is
//!   restored as one shared reference
//! - **Compact**: annotation paths are prefix-compressed, so metadata grows with
//!   the number of special values, not with the size of the tree
//! - **Extensible**: register classes, symbols and custom transformers on a
//!   [`RichJson`] context
//! - **Safe**: cycles are rejected, prototype-chain paths are refused, and no
//!   partial result ever escapes an error
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serde_richjson = "0.1"
//! ```
//!
//! ### Serializing rich values
//!
//! ```rust
//! use serde_richjson::{rich, RichValue};
//! use serde_json::json;
//!
//! let value = rich!({
//!     "missing": (RichValue::Undefined),
//!     "ratio": (f64::NAN),
//!     "tags": (RichValue::set(["a", "b"].map(RichValue::from))),
//! });
//!
//! let out = serde_richjson::serialize(&value).unwrap();
//! assert_eq!(out.json, json!({ "missing": null, "ratio": "NaN", "tags": ["a", "b"] }));
//!
//! let back = serde_richjson::deserialize(out).unwrap();
//! assert_eq!(back, value);
//! ```
//!
//! ### JSON text
//!
//! ```rust
//! use serde_richjson::{from_str, to_string, RichValue};
//! use num_bigint::BigInt;
//!
//! let big = RichValue::BigInt(BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap());
//! let text = to_string(&big).unwrap();
//! assert_eq!(text, r#"{"json":"123456789012345678901234567890","meta":{"values":["bigint"],"v":1}}"#);
//! assert_eq!(from_str(&text).unwrap(), big);
//! ```
//!
//! ### Shared references
//!
//! ```rust
//! use serde_richjson::rich;
//!
//! let shared = rich!({ "id": 1 });
//! let root = rich!({ "x": (shared.clone()), "y": (shared) });
//!
//! let text = serde_richjson::to_string(&root).unwrap();
//! assert!(text.contains(r#""referentialEqualities":{"x":["y"]}"#));
//!
//! let back = serde_richjson::from_str(&text).unwrap();
//! let obj = back.as_object().unwrap().borrow();
//! assert!(obj.get("x").unwrap().same_reference(obj.get("y").unwrap()));
//! ```
//!
//! ### Typed Rust values
//!
//! [`to_value`] and [`from_value`] bridge any `serde` type to and from
//! [`RichValue`]:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_richjson::{from_value, to_value};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Account { id: u128, owner: String }
//!
//! let account = Account { id: u128::MAX, owner: "Ada".into() };
//! let value = to_value(&account).unwrap();
//! let back: Account = from_value(value).unwrap();
//! assert_eq!(back, account);
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Cyclic values fail with [`Error::CircularReference`] instead of overflowing
//!   the stack
//! - Paths through `__proto__` or `constructor.prototype` fail with
//!   [`Error::PrototypePollution`] before anything is touched
//!
//! ## Format
//!
//! The wire format is documented in the [`format`] module.

pub mod access;
pub mod annotation;
pub mod de;
pub mod equality;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod options;
pub mod path;
pub mod payload;
pub mod registry;
pub mod ser;
pub mod set;
pub mod transform;
pub mod typed_array;
pub mod value;
pub mod walker;

pub use de::ValueDeserializer;
pub use equality::ReferentialEqualities;
pub use error::{Error, Result};
pub use map::{ObjectMap, ValueMap};
pub use options::{Options, PathSyntax, RegistrationPolicy};
pub use payload::{Meta, Serialized, FORMAT_VERSION};
pub use registry::{Class, CustomTransformer, FnTransformer, Registries, Registry};
pub use ser::ValueSerializer;
pub use set::ValueSet;
pub use transform::{SimpleTag, Tag};
pub use typed_array::{TypedArray, TypedArrayKind};
pub use value::{ErrorValue, Extension, Number, RegExp, RichValue, Shared, Symbol, Value};

use access::Accessor;
use annotation::AnnotationNode;
use path::Path;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::sync::Arc;
use transform::Rules;
use walker::Walker;

/// A codec: options plus the class, symbol and transformer registries.
///
/// Each context is independent; registrations never leak between contexts.
/// A context is `Send + Sync` and can be shared behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{Options, RichJson, RichValue, Symbol};
///
/// let codec = RichJson::with_options(Options::pretty());
/// let token = Symbol::new("session");
/// codec.register_symbol(&token, None).unwrap();
///
/// let text = codec.stringify(&RichValue::Symbol(token.clone())).unwrap();
/// assert_eq!(codec.parse(&text).unwrap(), RichValue::Symbol(token));
/// ```
#[derive(Debug, Default)]
pub struct RichJson {
    options: Options,
    registries: Registries,
}

impl RichJson {
    /// Creates a context with default options and empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: Options) -> Self {
        RichJson {
            registries: Registries::new(options.registration_policy),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Registers a class under its own name.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousRegistration`] if another class already holds the name
    /// and the policy is [`RegistrationPolicy::Reject`].
    pub fn register_class(&self, class: &Arc<Class>) -> Result<()> {
        self.registries.classes.register(Arc::clone(class), None)?;
        Ok(())
    }

    /// Registers a class under an explicit identifier.
    pub fn register_class_as(&self, class: &Arc<Class>, identifier: &str) -> Result<()> {
        self.registries
            .classes
            .register(Arc::clone(class), Some(identifier))?;
        Ok(())
    }

    /// Registers a symbol, by default under its description.
    pub fn register_symbol(&self, symbol: &Symbol, identifier: Option<&str>) -> Result<()> {
        self.registries.symbols.register(symbol.clone(), identifier)?;
        Ok(())
    }

    /// Registers a custom transformer under its name.
    ///
    /// Transformers are consulted in registration order.
    pub fn register_custom(&self, transformer: Arc<dyn CustomTransformer>) -> Result<()> {
        self.registries.transformers.register(transformer, None)?;
        Ok(())
    }

    /// Keeps the named extra properties when serializing error values.
    pub fn allow_error_props<I, S>(&self, props: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registries.allow_error_props(props);
    }

    /// Converts `value` into plain JSON plus annotations.
    ///
    /// # Errors
    ///
    /// [`Error::CircularReference`] for cyclic values and
    /// [`Error::UnsupportedType`] for values no rule can encode.
    pub fn serialize(&self, value: &RichValue) -> Result<Serialized> {
        let mut walker = Walker::new(Rules::new(&self.registries), self.options.dedupe);
        let walked = walker.walk(value, &Path::root())?;

        let values = walked.annotation.map(AnnotationNode::compress);
        let equalities =
            ReferentialEqualities::from_identities(walker.into_identities(), self.options.dedupe);

        tracing::debug!(
            tags = values.as_ref().map_or(0, AnnotationNode::tag_count),
            aliases = equalities.alias_count(),
            "serialized rich value"
        );

        Ok(Serialized {
            json: walked.json,
            meta: Meta::new(values, equalities),
        })
    }

    /// Rebuilds the rich value described by `payload`.
    ///
    /// Tags are applied children first; shared references are restored last.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAnnotation`] for unregistered identifiers,
    /// [`Error::TypeMismatch`] when a tag does not fit its value, and the path
    /// errors of the [`access`] module.
    pub fn deserialize(&self, payload: Serialized) -> Result<RichValue> {
        let Serialized { json, meta } = payload;
        let mut root = RichValue::from_json(json);
        let Some(meta) = meta else {
            return Ok(root);
        };

        let syntax = self.options.path_syntax;
        let rules = Rules::new(&self.registries);
        let mut accessor = Accessor::new();

        if let Some(values) = meta.values {
            let entries = values.decompress(syntax)?.entries(syntax)?;
            tracing::debug!(tags = entries.len(), "applying annotations");
            for (path, tag) in entries {
                tracing::trace!(path = %path, tag = %tag, "applying annotation");
                root = accessor.set_deep(root, &path, |value| rules.decode(&tag, value, &path))?;
            }
        }

        if let Some(equalities) = meta.referential_equalities {
            tracing::debug!(aliases = equalities.alias_count(), "restoring shared references");
            root = equalities.apply(root, &mut accessor, syntax)?;
        }

        Ok(root)
    }

    /// Rebuilds a rich value from an envelope given as JSON.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPayload`] if `json` is not a `{json, meta}` envelope,
    /// otherwise as [`RichJson::deserialize`].
    pub fn deserialize_json(&self, json: serde_json::Value) -> Result<RichValue> {
        self.deserialize(Serialized::from_json(json)?)
    }

    /// Serializes `value` to JSON text, pretty-printed if the options ask for it.
    pub fn stringify(&self, value: &RichValue) -> Result<String> {
        let envelope = self.serialize(value)?.to_json();
        let text = if self.options.pretty {
            serde_json::to_string_pretty(&envelope)?
        } else {
            serde_json::to_string(&envelope)?
        };
        Ok(text)
    }

    /// Parses JSON text produced by [`RichJson::stringify`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPayload`] for malformed JSON text or envelopes.
    pub fn parse(&self, text: &str) -> Result<RichValue> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        self.deserialize_json(json)
    }
}

/// Serializes a rich value with a default context.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{serialize, RichValue};
/// use serde_json::json;
///
/// let out = serialize(&RichValue::Undefined).unwrap();
/// assert_eq!(out.json, json!(null));
/// assert!(out.meta.is_some());
/// ```
///
/// # Errors
///
/// As [`RichJson::serialize`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize(value: &RichValue) -> Result<Serialized> {
    RichJson::new().serialize(value)
}

/// Deserializes a payload with a default context.
///
/// # Errors
///
/// As [`RichJson::deserialize`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn deserialize(payload: Serialized) -> Result<RichValue> {
    RichJson::new().deserialize(payload)
}

/// Serializes a rich value to compact JSON text.
///
/// # Errors
///
/// As [`RichJson::serialize`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(value: &RichValue) -> Result<String> {
    RichJson::new().stringify(value)
}

/// Serializes a rich value to pretty-printed JSON text.
///
/// # Errors
///
/// As [`RichJson::serialize`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty(value: &RichValue) -> Result<String> {
    RichJson::with_options(Options::pretty()).stringify(value)
}

/// Writes a rich value as JSON text to `writer`.
///
/// # Errors
///
/// As [`RichJson::serialize`], or [`Error::Custom`] if writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W: io::Write>(mut writer: W, value: &RichValue) -> Result<()> {
    let text = to_string(value)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::custom(format!("write failed: {}", e)))
}

/// Parses JSON text into a rich value with a default context.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{from_str, RichValue};
///
/// let value = from_str(r#"{"json":null,"meta":{"values":["undefined"],"v":1}}"#).unwrap();
/// assert_eq!(value, RichValue::Undefined);
///
/// // envelopes without meta are plain JSON
/// let value = from_str(r#"{"json":[1,2]}"#).unwrap();
/// assert_eq!(value, serde_richjson::rich!([1, 2]));
/// ```
///
/// # Errors
///
/// As [`RichJson::parse`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(s: &str) -> Result<RichValue> {
    RichJson::new().parse(s)
}

/// Parses UTF-8 JSON bytes into a rich value.
///
/// # Errors
///
/// [`Error::InvalidPayload`] for invalid UTF-8, otherwise as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(v: &[u8]) -> Result<RichValue> {
    let s = std::str::from_utf8(v).map_err(Error::invalid_payload)?;
    from_str(s)
}

/// Reads JSON text from `reader` and parses it into a rich value.
///
/// # Errors
///
/// [`Error::Custom`] if reading fails, otherwise as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R: io::Read>(mut reader: R) -> Result<RichValue> {
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::custom(format!("read failed: {}", e)))?;
    from_str(&string)
}

/// Converts any `T: Serialize` to a [`RichValue`].
///
/// Integers beyond `i64` become [`RichValue::BigInt`], byte strings become
/// `Uint8Array`s, and maps with non-string keys become [`RichValue::Map`].
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` implementation fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<RichValue>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Converts a [`RichValue`] into any `T: Deserialize`.
///
/// # Errors
///
/// Returns an error if the value's shape does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: RichValue) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

//! The rule set that turns rich values into plain ones and back.
//!
//! Encoding tries the composite rules first (registered classes, registered
//! symbols, typed arrays, custom transformers) and then the simple ones; the
//! first match wins. A matching rule yields a [`Tag`] and an [`Encoded`]
//! output that the walker keeps descending into.

use crate::path::Path;
use crate::registry::Registries;
use crate::typed_array::{TypedArray, TypedArrayKind};
use crate::value::{shared, Instance};
use crate::{Error, ErrorValue, Number, RegExp, Result, RichValue, ValueMap, ValueSet};
use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use std::fmt;

/// Tags without a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimpleTag {
    Undefined,
    BigInt,
    Date,
    Error,
    RegExp,
    Set,
    Map,
    Number,
}

impl SimpleTag {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SimpleTag::Undefined => "undefined",
            SimpleTag::BigInt => "bigint",
            SimpleTag::Date => "Date",
            SimpleTag::Error => "Error",
            SimpleTag::RegExp => "regexp",
            SimpleTag::Set => "set",
            SimpleTag::Map => "map",
            SimpleTag::Number => "number",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "undefined" => SimpleTag::Undefined,
            "bigint" => SimpleTag::BigInt,
            "Date" => SimpleTag::Date,
            "Error" => SimpleTag::Error,
            "regexp" => SimpleTag::RegExp,
            "set" => SimpleTag::Set,
            "map" => SimpleTag::Map,
            "number" => SimpleTag::Number,
            _ => return None,
        })
    }
}

/// How to reverse the transformation applied at one path.
///
/// On the wire a simple tag is a bare string and a parameterized tag is a
/// `[kind, parameter]` pair.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{SimpleTag, Tag};
/// use serde_json::json;
///
/// assert_eq!(Tag::Simple(SimpleTag::Set).to_json(), json!("set"));
/// assert_eq!(Tag::Class("Point".into()).to_json(), json!(["class", "Point"]));
/// assert_eq!(Tag::from_json(&json!(["custom", "decimal"]), "").unwrap(), Tag::Custom("decimal".into()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Simple(SimpleTag),
    Class(String),
    Symbol(String),
    TypedArray(String),
    Custom(String),
}

impl Tag {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value::{Array, String as Str};
        match self {
            Tag::Simple(tag) => Str(tag.name().to_string()),
            Tag::Class(id) => Array(vec![Str("class".into()), Str(id.clone())]),
            Tag::Symbol(id) => Array(vec![Str("symbol".into()), Str(id.clone())]),
            Tag::TypedArray(kind) => Array(vec![Str("typed-array".into()), Str(kind.clone())]),
            Tag::Custom(name) => Array(vec![Str("custom".into()), Str(name.clone())]),
        }
    }

    /// Reads a tag found at the stringified path `at`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAnnotation`] for a well-formed but unknown tag,
    /// [`Error::InvalidPayload`] for anything that is not a tag at all.
    pub fn from_json(json: &serde_json::Value, at: &str) -> Result<Self> {
        match json {
            serde_json::Value::String(name) => SimpleTag::from_name(name)
                .map(Tag::Simple)
                .ok_or_else(|| Error::unknown_annotation(at, name.as_str())),
            serde_json::Value::Array(pair) => match pair.as_slice() {
                [serde_json::Value::String(kind), serde_json::Value::String(param)] => {
                    let param = param.clone();
                    match kind.as_str() {
                        "class" => Ok(Tag::Class(param)),
                        "symbol" => Ok(Tag::Symbol(param)),
                        "typed-array" => Ok(Tag::TypedArray(param)),
                        "custom" => Ok(Tag::Custom(param)),
                        _ => Err(Error::unknown_annotation(at, format!("{}:{}", kind, param))),
                    }
                }
                _ => Err(Error::invalid_payload(format!(
                    "malformed tag {} at path '{}'",
                    json, at
                ))),
            },
            other => Err(Error::invalid_payload(format!(
                "malformed tag {} at path '{}'",
                other, at
            ))),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Simple(tag) => f.write_str(tag.name()),
            Tag::Class(id) => write!(f, "class:{}", id),
            Tag::Symbol(id) => write!(f, "symbol:{}", id),
            Tag::TypedArray(kind) => write!(f, "typed-array:{}", kind),
            Tag::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// The output of a rule, before its children are walked.
#[derive(Debug)]
pub enum Encoded {
    /// Finished plain JSON; nothing left to walk.
    Leaf(serde_json::Value),
    /// Elements walked at `path.i`.
    Seq(Vec<RichValue>),
    /// Set members walked at `path.i`. Members are never replaced by a
    /// placeholder: two placeholders would collapse into one member on decode.
    Members(Vec<RichValue>),
    /// Fields walked at `path.key`.
    Record(Vec<(String, RichValue)>),
    /// Map rows, keys walked at `path.i.0` and values at `path.i.1`.
    Rows(Vec<(RichValue, RichValue)>),
}

#[derive(Debug)]
pub struct Transformed {
    pub tag: Option<Tag>,
    pub output: Encoded,
}

impl Transformed {
    fn plain(output: Encoded) -> Self {
        Transformed { tag: None, output }
    }

    fn tagged(tag: Tag, output: Encoded) -> Self {
        Transformed {
            tag: Some(tag),
            output,
        }
    }
}

/// The rule set bound to one codec's registries.
#[derive(Clone, Copy)]
pub struct Rules<'a> {
    registries: &'a Registries,
}

impl<'a> Rules<'a> {
    pub fn new(registries: &'a Registries) -> Self {
        Rules { registries }
    }

    /// Applies the first matching rule to `value`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`] for unregistered symbols and class instances
    /// and for extensions no transformer accepts.
    pub fn encode(&self, value: &RichValue) -> Result<Transformed> {
        if let Some(transformed) = self.encode_composite(value)? {
            return Ok(transformed);
        }
        self.encode_simple(value)
    }

    fn encode_composite(&self, value: &RichValue) -> Result<Option<Transformed>> {
        match value {
            RichValue::Instance(instance) => {
                let instance = instance.borrow();
                if let Some(id) = self.registries.classes.identifier_of(&instance.class) {
                    let fields = instance.class.visible_fields(&instance.fields);
                    return Ok(Some(Transformed::tagged(Tag::Class(id), Encoded::Record(fields))));
                }
            }
            RichValue::Symbol(symbol) => {
                if let Some(id) = self.registries.symbols.identifier_of(symbol) {
                    let json = serde_json::Value::String(id.clone());
                    return Ok(Some(Transformed::tagged(Tag::Symbol(id), Encoded::Leaf(json))));
                }
            }
            RichValue::TypedArray(array) => {
                let array = array.borrow();
                let items = array.to_numbers().into_iter().map(RichValue::Number).collect();
                let tag = Tag::TypedArray(array.kind().name().to_string());
                return Ok(Some(Transformed::tagged(tag, Encoded::Seq(items))));
            }
            _ => {}
        }

        match self.registries.find_applicable(value) {
            Some((name, transformer)) => {
                let json = transformer.serialize(value)?;
                Ok(Some(Transformed::tagged(Tag::Custom(name), Encoded::Leaf(json))))
            }
            None => Ok(None),
        }
    }

    fn encode_simple(&self, value: &RichValue) -> Result<Transformed> {
        use serde_json::Value as Json;

        let transformed = match value {
            RichValue::Undefined => {
                Transformed::tagged(Tag::Simple(SimpleTag::Undefined), Encoded::Leaf(Json::Null))
            }
            RichValue::Null => Transformed::plain(Encoded::Leaf(Json::Null)),
            RichValue::Bool(b) => Transformed::plain(Encoded::Leaf(Json::Bool(*b))),
            RichValue::String(s) => Transformed::plain(Encoded::Leaf(Json::String(s.clone()))),
            RichValue::Number(n) => match (n.special_name(), n.to_json()) {
                (Some(name), _) => Transformed::tagged(
                    Tag::Simple(SimpleTag::Number),
                    Encoded::Leaf(Json::String(name.to_string())),
                ),
                (None, Some(json)) => Transformed::plain(Encoded::Leaf(Json::Number(json))),
                (None, None) => return Err(Error::unsupported_type(&format!("number {}", n))),
            },
            RichValue::BigInt(bi) => Transformed::tagged(
                Tag::Simple(SimpleTag::BigInt),
                Encoded::Leaf(Json::String(bi.to_string())),
            ),
            RichValue::Date(dt) => Transformed::tagged(
                Tag::Simple(SimpleTag::Date),
                Encoded::Leaf(Json::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))),
            ),
            RichValue::RegExp(re) => Transformed::tagged(
                Tag::Simple(SimpleTag::RegExp),
                Encoded::Leaf(Json::String(re.to_string())),
            ),
            RichValue::Array(items) => Transformed::plain(Encoded::Seq(items.borrow().clone())),
            RichValue::Object(map) => Transformed::plain(Encoded::Record(
                map.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )),
            RichValue::Set(set) => Transformed::tagged(
                Tag::Simple(SimpleTag::Set),
                Encoded::Members(set.borrow().iter().cloned().collect()),
            ),
            RichValue::Map(map) => Transformed::tagged(
                Tag::Simple(SimpleTag::Map),
                Encoded::Rows(
                    map.borrow()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
            ),
            RichValue::Error(error) => {
                let error = error.borrow();
                let mut fields = vec![
                    ("name".to_string(), RichValue::String(error.name.clone())),
                    ("message".to_string(), RichValue::String(error.message.clone())),
                ];
                for prop in self.registries.error_props() {
                    if let Some(v) = error.props.get(&prop) {
                        fields.push((prop, v.clone()));
                    }
                }
                Transformed::tagged(Tag::Simple(SimpleTag::Error), Encoded::Record(fields))
            }
            RichValue::Symbol(symbol) => {
                return Err(Error::unsupported_type(&format!(
                    "{:?} is not registered",
                    symbol
                )))
            }
            RichValue::Instance(instance) => {
                return Err(Error::unsupported_type(&format!(
                    "class '{}' is not registered",
                    instance.borrow().class.name()
                )))
            }
            RichValue::TypedArray(_) | RichValue::Extension(_) => {
                return Err(Error::unsupported_type(&format!(
                    "no transformer accepts {}",
                    value
                )))
            }
        };
        Ok(transformed)
    }

    /// Reverses the rule recorded as `tag` on `value`, found at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAnnotation`] when the tag's identifier is not
    /// registered, [`Error::TypeMismatch`] when `value` has the wrong shape.
    pub fn decode(&self, tag: &Tag, value: RichValue, path: &Path) -> Result<RichValue> {
        let at = || path.to_string();
        let mismatch = |expected: &str, found: &RichValue| {
            Error::type_mismatch(path.to_string(), expected, found.type_name())
        };

        match tag {
            Tag::Simple(SimpleTag::Undefined) => Ok(RichValue::Undefined),
            Tag::Simple(SimpleTag::BigInt) => match &value {
                RichValue::String(s) => s
                    .parse::<BigInt>()
                    .map(RichValue::BigInt)
                    .map_err(|_| mismatch("decimal integer string", &value)),
                RichValue::Number(n) => n
                    .as_i64()
                    .map(|i| RichValue::BigInt(BigInt::from(i)))
                    .ok_or_else(|| mismatch("integer", &value)),
                _ => Err(mismatch("string", &value)),
            },
            Tag::Simple(SimpleTag::Date) => match &value {
                RichValue::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|dt| RichValue::Date(dt.with_timezone(&Utc)))
                    .map_err(|_| mismatch("ISO-8601 timestamp", &value)),
                _ => Err(mismatch("string", &value)),
            },
            Tag::Simple(SimpleTag::RegExp) => match &value {
                RichValue::String(s) => RegExp::parse(s)
                    .map(RichValue::RegExp)
                    .ok_or_else(|| mismatch("/source/flags literal", &value)),
                _ => Err(mismatch("string", &value)),
            },
            Tag::Simple(SimpleTag::Number) => match &value {
                RichValue::String(s) => Number::from_special_name(s)
                    .map(RichValue::Number)
                    .ok_or_else(|| mismatch("NaN, Infinity, -Infinity or -0", &value)),
                RichValue::Number(_) => Ok(value),
                _ => Err(mismatch("string", &value)),
            },
            Tag::Simple(SimpleTag::Set) => match &value {
                RichValue::Array(items) => {
                    let set: ValueSet = items.borrow().iter().cloned().collect();
                    Ok(RichValue::Set(shared(set)))
                }
                _ => Err(mismatch("array", &value)),
            },
            Tag::Simple(SimpleTag::Map) => match &value {
                RichValue::Array(rows) => {
                    let mut map = ValueMap::with_capacity(rows.borrow().len());
                    for row in rows.borrow().iter() {
                        let (key, val) = match row {
                            RichValue::Array(pair) => match pair.borrow().as_slice() {
                                [k, v] => (k.clone(), v.clone()),
                                _ => return Err(mismatch("[key, value] row", row)),
                            },
                            _ => return Err(mismatch("[key, value] row", row)),
                        };
                        map.insert(key, val);
                    }
                    Ok(RichValue::Map(shared(map)))
                }
                _ => Err(mismatch("array", &value)),
            },
            Tag::Simple(SimpleTag::Error) => match &value {
                RichValue::Object(fields) => {
                    let mut props = fields.borrow().clone();
                    let name = props.remove("name");
                    let message = props.remove("message");
                    Ok(RichValue::error(ErrorValue {
                        name: name
                            .as_ref()
                            .and_then(RichValue::as_str)
                            .unwrap_or("Error")
                            .to_string(),
                        message: message
                            .as_ref()
                            .and_then(RichValue::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        props,
                    }))
                }
                _ => Err(mismatch("object", &value)),
            },
            Tag::Class(id) => {
                let class = self
                    .registries
                    .classes
                    .lookup(id)
                    .ok_or_else(|| Error::unknown_annotation(at(), format!("class:{}", id)))?;
                let fields = match &value {
                    RichValue::Object(fields) => fields.borrow().clone(),
                    _ => return Err(mismatch("object", &value)),
                };
                let fields = class.construct(fields)?;
                Ok(RichValue::Instance(shared(Instance { class, fields })))
            }
            Tag::Symbol(id) => self
                .registries
                .symbols
                .lookup(id)
                .map(RichValue::Symbol)
                .ok_or_else(|| Error::unknown_annotation(at(), format!("symbol:{}", id))),
            Tag::TypedArray(kind_name) => {
                let kind = TypedArrayKind::from_name(kind_name).ok_or_else(|| {
                    Error::unknown_annotation(at(), format!("typed-array:{}", kind_name))
                })?;
                let numbers = match &value {
                    RichValue::Array(items) => items
                        .borrow()
                        .iter()
                        .map(|item| item.as_number().cloned())
                        .collect::<Option<Vec<_>>>(),
                    _ => None,
                };
                numbers
                    .and_then(|numbers| TypedArray::from_numbers(kind, &numbers))
                    .map(RichValue::typed_array)
                    .ok_or_else(|| mismatch(kind.name(), &value))
            }
            Tag::Custom(name) => {
                let transformer = self
                    .registries
                    .transformers
                    .lookup(name)
                    .ok_or_else(|| Error::unknown_annotation(at(), format!("custom:{}", name)))?;
                transformer.deserialize(value.to_json()?)
            }
        }
    }
}

impl fmt::Debug for Rules<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rules").finish_non_exhaustive()
    }
}

//! Identifier tables for classes, symbols and custom transformers.
//!
//! Values that the wire format cannot describe on its own are registered
//! under an identifier; the identifier is written into the annotation and
//! looked up again when decoding.
//!
//! All tables are safe to share between threads: lookups take a read lock,
//! registrations take the write lock, so an entry becomes visible at once.
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_richjson::{Class, ObjectMap, RichJson, RichValue};
//!
//! let point = Arc::new(Class::new("Point"));
//! let codec = RichJson::new();
//! codec.register_class(&point).unwrap();
//!
//! let mut fields = ObjectMap::new();
//! fields.insert("x".to_string(), RichValue::from(1));
//! let value = RichValue::instance(&point, fields);
//!
//! let text = codec.stringify(&value).unwrap();
//! assert!(text.contains(r#"["class","Point"]"#));
//! assert_eq!(codec.parse(&text).unwrap(), value);
//! ```

use crate::options::RegistrationPolicy;
use crate::value::Symbol;
use crate::{Error, ObjectMap, Result, RichValue};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds the fields of a decoded instance from the fields on the wire.
pub type Factory = Arc<dyn Fn(ObjectMap) -> Result<ObjectMap> + Send + Sync>;

/// A registered class: a name, an optional field allow-list and a factory.
///
/// Decoding an instance calls the factory with the decoded fields; the
/// default factory keeps them unchanged.
#[derive(Clone)]
pub struct Class {
    name: String,
    allow_props: Option<Vec<String>>,
    factory: Option<Factory>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Class {
            name: name.into(),
            allow_props: None,
            factory: None,
        }
    }

    /// Restricts serialization to the listed fields.
    #[must_use]
    pub fn with_allow_props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_props = Some(props.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the function that rebuilds an instance's fields on decode.
    #[must_use]
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(ObjectMap) -> Result<ObjectMap> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn allow_props(&self) -> Option<&[String]> {
        self.allow_props.as_deref()
    }

    /// The fields written to the wire for an instance of this class.
    pub(crate) fn visible_fields(&self, fields: &ObjectMap) -> Vec<(String, RichValue)> {
        match &self.allow_props {
            Some(allowed) => allowed
                .iter()
                .filter_map(|key| fields.get(key).map(|v| (key.clone(), v.clone())))
                .collect(),
            None => fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    pub(crate) fn construct(&self, fields: ObjectMap) -> Result<ObjectMap> {
        match &self.factory {
            Some(factory) => factory(fields),
            None => Ok(fields),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("allow_props", &self.allow_props)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

/// A user-supplied encoder for values no built-in rule handles.
///
/// Transformers are tried in registration order; the first one whose
/// [`is_applicable`](CustomTransformer::is_applicable) accepts a value wins,
/// even over built-in rules for sets, maps and the like.
pub trait CustomTransformer: Send + Sync {
    /// Default identifier used when registering.
    fn name(&self) -> &str;

    fn is_applicable(&self, value: &RichValue) -> bool;

    /// Encodes `value` as plain JSON.
    fn serialize(&self, value: &RichValue) -> Result<serde_json::Value>;

    /// Rebuilds a value from the plain JSON produced by `serialize`.
    fn deserialize(&self, json: serde_json::Value) -> Result<RichValue>;
}

/// A [`CustomTransformer`] assembled from closures.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{FnTransformer, RichJson, RichValue};
/// use std::sync::Arc;
///
/// #[derive(Debug, PartialEq)]
/// struct Celsius(f64);
///
/// let codec = RichJson::new();
/// codec
///     .register_custom(Arc::new(FnTransformer::new(
///         "celsius",
///         |v| v.downcast_ref::<Celsius>().is_some(),
///         |v| Ok(serde_json::json!(v.downcast_ref::<Celsius>().map(|c| c.0))),
///         |json| Ok(RichValue::extension(Celsius(json.as_f64().unwrap_or_default()))),
///     )))
///     .unwrap();
///
/// let text = codec.stringify(&RichValue::extension(Celsius(21.5))).unwrap();
/// assert_eq!(codec.parse(&text).unwrap(), RichValue::extension(Celsius(21.5)));
/// ```
pub struct FnTransformer<A, S, D> {
    name: String,
    applicable: A,
    ser: S,
    de: D,
}

impl<A, S, D> FnTransformer<A, S, D>
where
    A: Fn(&RichValue) -> bool + Send + Sync,
    S: Fn(&RichValue) -> Result<serde_json::Value> + Send + Sync,
    D: Fn(serde_json::Value) -> Result<RichValue> + Send + Sync,
{
    pub fn new(name: impl Into<String>, applicable: A, ser: S, de: D) -> Self {
        FnTransformer {
            name: name.into(),
            applicable,
            ser,
            de,
        }
    }
}

impl<A, S, D> CustomTransformer for FnTransformer<A, S, D>
where
    A: Fn(&RichValue) -> bool + Send + Sync,
    S: Fn(&RichValue) -> Result<serde_json::Value> + Send + Sync,
    D: Fn(serde_json::Value) -> Result<RichValue> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_applicable(&self, value: &RichValue) -> bool {
        (self.applicable)(value)
    }

    fn serialize(&self, value: &RichValue) -> Result<serde_json::Value> {
        (self.ser)(value)
    }

    fn deserialize(&self, json: serde_json::Value) -> Result<RichValue> {
        (self.de)(json)
    }
}

/// Something that can be stored in a [`Registry`].
pub trait Registrable: Clone {
    /// Identifier used when none is given at registration.
    fn default_identifier(&self) -> String;

    /// Address identifying this exact value.
    fn address(&self) -> usize;
}

impl Registrable for Arc<Class> {
    fn default_identifier(&self) -> String {
        self.name.clone()
    }

    fn address(&self) -> usize {
        Arc::as_ptr(self) as usize
    }
}

impl Registrable for Symbol {
    fn default_identifier(&self) -> String {
        self.description().unwrap_or_default().to_string()
    }

    fn address(&self) -> usize {
        Symbol::address(self)
    }
}

impl Registrable for Arc<dyn CustomTransformer> {
    fn default_identifier(&self) -> String {
        self.name().to_string()
    }

    fn address(&self) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }
}

struct Entries<T> {
    by_identifier: IndexMap<String, T>,
    by_address: HashMap<usize, String>,
}

/// A bidirectional identifier/value table.
pub struct Registry<T> {
    kind: &'static str,
    policy: RegistrationPolicy,
    entries: RwLock<Entries<T>>,
}

impl<T: Registrable> Registry<T> {
    pub fn new(kind: &'static str, policy: RegistrationPolicy) -> Self {
        Registry {
            kind,
            policy,
            entries: RwLock::new(Entries {
                by_identifier: IndexMap::new(),
                by_address: HashMap::new(),
            }),
        }
    }

    /// Registers `value`, returning the identifier it is known under.
    ///
    /// Registering a value that is already present is a no-op and returns
    /// its existing identifier.
    ///
    /// # Errors
    ///
    /// [`Error::AmbiguousRegistration`] if another value holds the identifier
    /// and the policy is [`RegistrationPolicy::Reject`].
    pub fn register(&self, value: T, identifier: Option<&str>) -> Result<String> {
        let mut entries = self.entries.write();
        let address = value.address();
        if let Some(existing) = entries.by_address.get(&address) {
            return Ok(existing.clone());
        }

        let identifier = identifier
            .map(str::to_string)
            .unwrap_or_else(|| value.default_identifier());

        if let Some(previous) = entries.by_identifier.get(&identifier) {
            match self.policy {
                RegistrationPolicy::Reject => return Err(Error::ambiguous(identifier)),
                RegistrationPolicy::WarnAndOverwrite => {
                    tracing::warn!(
                        kind = self.kind,
                        identifier = %identifier,
                        "overwriting registration with a different value"
                    );
                    let previous = previous.address();
                    entries.by_address.remove(&previous);
                }
            }
        }

        entries.by_address.insert(address, identifier.clone());
        entries.by_identifier.insert(identifier.clone(), value);
        tracing::debug!(kind = self.kind, identifier = %identifier, "registered");
        Ok(identifier)
    }

    #[must_use]
    pub fn lookup(&self, identifier: &str) -> Option<T> {
        self.entries.read().by_identifier.get(identifier).cloned()
    }

    #[must_use]
    pub fn identifier_of(&self, value: &T) -> Option<String> {
        self.entries.read().by_address.get(&value.address()).cloned()
    }

    /// The first value in registration order accepted by `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<(String, T)> {
        self.entries
            .read()
            .by_identifier
            .iter()
            .find(|(_, value)| predicate(value))
            .map(|(id, value)| (id.clone(), value.clone()))
    }

    /// Removes `value`; returns `false` if it was not registered.
    pub fn unregister(&self, value: &T) -> bool {
        let mut entries = self.entries.write();
        match entries.by_address.remove(&value.address()) {
            Some(identifier) => {
                entries.by_identifier.shift_remove(&identifier);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().by_identifier.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("identifiers", &entries.by_identifier.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Every table a codec consults.
#[derive(Debug)]
pub struct Registries {
    pub classes: Registry<Arc<Class>>,
    pub symbols: Registry<Symbol>,
    pub transformers: Registry<Arc<dyn CustomTransformer>>,
    error_props: RwLock<IndexSet<String>>,
}

impl Registries {
    pub fn new(policy: RegistrationPolicy) -> Self {
        Registries {
            classes: Registry::new("class", policy),
            symbols: Registry::new("symbol", policy),
            transformers: Registry::new("custom", policy),
            error_props: RwLock::new(IndexSet::new()),
        }
    }

    /// Adds names to the extra error properties kept on serialization.
    pub fn allow_error_props<I, S>(&self, props: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_props
            .write()
            .extend(props.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn error_props(&self) -> Vec<String> {
        self.error_props.read().iter().cloned().collect()
    }

    /// The first custom transformer accepting `value`, with its identifier.
    pub fn find_applicable(
        &self,
        value: &RichValue,
    ) -> Option<(String, Arc<dyn CustomTransformer>)> {
        self.transformers.find(|t| t.is_applicable(value))
    }
}

impl Default for Registries {
    fn default() -> Self {
        Registries::new(RegistrationPolicy::default())
    }
}

//! The `{json, meta}` envelope produced by serialization.

use crate::annotation::AnnotationNode;
use crate::equality::ReferentialEqualities;
use crate::{Error, Result};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// Version written to `meta.v`.
pub const FORMAT_VERSION: u64 = 1;

/// Side-channel information needed to rebuild the rich value.
#[derive(Clone, Debug, PartialEq)]
pub struct Meta {
    /// Compressed annotation tree; absent when no tag was produced.
    pub values: Option<AnnotationNode>,
    pub referential_equalities: Option<ReferentialEqualities>,
    pub version: u64,
}

impl Meta {
    /// Bundles annotations and equalities; `None` if both are empty.
    #[must_use]
    pub fn new(values: Option<AnnotationNode>, equalities: ReferentialEqualities) -> Option<Self> {
        let referential_equalities = (!equalities.is_empty()).then_some(equalities);
        if values.is_none() && referential_equalities.is_none() {
            return None;
        }
        Some(Meta {
            values,
            referential_equalities,
            version: FORMAT_VERSION,
        })
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        if let Some(values) = &self.values {
            out.insert("values".to_string(), values.to_json());
        }
        if let Some(equalities) = self.referential_equalities.as_ref().and_then(ReferentialEqualities::to_json) {
            out.insert("referentialEqualities".to_string(), equalities);
        }
        out.insert("v".to_string(), serde_json::Value::from(self.version));
        serde_json::Value::Object(out)
    }

    /// Reads `meta` from its wire form.
    ///
    /// A missing `v` is read as the current version.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPayload`] for a malformed object or another version;
    /// [`Error::UnknownAnnotation`] for unknown tags.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::invalid_payload("'meta' must be an object"))?;

        let version = match object.get("v") {
            None => FORMAT_VERSION,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| Error::invalid_payload("'meta.v' must be an integer"))?,
        };
        if version != FORMAT_VERSION {
            return Err(Error::invalid_payload(format!(
                "unsupported annotation format version {}",
                version
            )));
        }

        let values = match object.get("values") {
            None | Some(serde_json::Value::Null) => None,
            Some(values) => Some(AnnotationNode::from_json(values)?),
        };
        let referential_equalities = match object.get("referentialEqualities") {
            None | Some(serde_json::Value::Null) => None,
            Some(eq) => Some(ReferentialEqualities::from_json(eq)?),
        };

        Ok(Meta {
            values,
            referential_equalities,
            version,
        })
    }
}

/// A serialized value: plain JSON plus the metadata to restore it.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::{RichValue, Serialized};
/// use serde_json::json;
///
/// let out = serde_richjson::serialize(&RichValue::from(f64::NAN)).unwrap();
/// assert_eq!(out.to_json(), json!({ "json": "NaN", "meta": { "values": ["number"], "v": 1 } }));
///
/// let back = Serialized::from_json(out.to_json()).unwrap();
/// assert_eq!(back, out);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Serialized {
    pub json: serde_json::Value,
    pub meta: Option<Meta>,
}

impl Serialized {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        out.insert("json".to_string(), self.json.clone());
        if let Some(meta) = &self.meta {
            out.insert("meta".to_string(), meta.to_json());
        }
        serde_json::Value::Object(out)
    }

    /// Reads an envelope.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPayload`] unless `json` is an object with a `json` key
    /// and at most a `meta` key besides.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(mut object) = json else {
            return Err(Error::invalid_payload("expected an object with 'json' and 'meta'"));
        };
        if let Some(key) = object.keys().find(|k| *k != "json" && *k != "meta") {
            return Err(Error::invalid_payload(format!("unexpected key '{}'", key)));
        }
        let plain = object
            .remove("json")
            .ok_or_else(|| Error::invalid_payload("missing 'json'"))?;
        let meta = match object.remove("meta") {
            None | Some(serde_json::Value::Null) => None,
            Some(meta) => Some(Meta::from_json(&meta)?),
        };
        Ok(Serialized { json: plain, meta })
    }
}

impl Serialize for Serialized {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Serialized {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Serialized::from_json(json).map_err(serde::de::Error::custom)
    }
}

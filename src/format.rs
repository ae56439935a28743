//! Rich JSON wire format
//!
//! This module documents the `{json, meta}` format produced by
//! [`RichJson::serialize`](crate::RichJson::serialize) and accepted by
//! [`RichJson::deserialize`](crate::RichJson::deserialize).
//!
//! # Overview
//!
//! A serialized value is a JSON object with one required and one optional key:
//!
//! ```json
//! {
//!   "json": <plain JSON projection>,
//!   "meta": {
//!     "values": <annotation tree>,
//!     "referentialEqualities": <alias groups>,
//!     "v": 1
//!   }
//! }
//! ```
//!
//! `meta` is omitted entirely when the value is plain JSON. Inside `meta`,
//! `values` and `referentialEqualities` are each omitted when empty. Any other
//! key on the envelope is rejected.
//!
//! # Tags
//!
//! A tag is either a bare string or a `[kind, identifier]` pair.
//!
//! | Tag | Value | `json` projection |
//! |-----|-------|-------------------|
//! | `"undefined"` | `undefined` | `null` |
//! | `"number"` | `NaN`, `Infinity`, `-Infinity`, `-0` | `"NaN"`, `"Infinity"`, `"-Infinity"`, `"-0"` |
//! | `"bigint"` | big integer | decimal string, e.g. `"123456789012345678901234567890"` |
//! | `"Date"` | date | ISO-8601 with milliseconds, e.g. `"2020-01-01T00:00:00.000Z"` |
//! | `"regexp"` | regular expression | `"/source/flags"` |
//! | `"set"` | set | array of elements in insertion order |
//! | `"map"` | map | array of `[key, value]` rows in insertion order |
//! | `"Error"` | error | object with `name`, `message` and allow-listed props |
//! | `["class", id]` | instance of a registered class | object of its visible fields |
//! | `["symbol", id]` | registered symbol | the identifier string |
//! | `["typed-array", kind]` | typed array | array of numbers |
//! | `["custom", name]` | value claimed by a custom transformer | whatever the transformer returns |
//!
//! Typed array kinds are `Int8Array`, `Uint8Array`, `Uint8ClampedArray`,
//! `Int16Array`, `Uint16Array`, `Int32Array`, `Uint32Array`, `Float32Array`
//! and `Float64Array`.
//!
//! # Paths
//!
//! A path is a list of keys joined by `.`. Inside a key, `\` is written `\\`
//! and `.` is written `\.`; no other escape exists. Positions inside arrays,
//! sets, maps and typed arrays are decimal indices; inside a map row `0` is the
//! key and `1` the value.
//!
//! ```text
//! a.b          key "b" of key "a"
//! a\.b         the single key "a.b"
//! m.2.0        key of the third row of map "m"
//! ```
//!
//! Every path string has at least one key: `""` is the single empty key and
//! `a.` is key `""` of key `a`. The root has no string form; it is addressed
//! by the shapes of `values` and `referentialEqualities` instead.
//!
//! A `__proto__` segment, or a `constructor` segment directly followed by
//! `prototype`, is refused on read, whatever the value it would walk through.
//!
//! # Annotation tree
//!
//! `values` mirrors the shape of `json` but only along branches that carry a
//! tag:
//!
//! - a leaf is `[tag]`
//! - a node whose own value is tagged is `[tag, {child: node, ...}]`
//! - a node whose own value is untagged is `{child: node, ...}`
//! - when the root itself is tagged, `values` is `[tag]` or `[tag, {...}]`
//!
//! Chains of untagged single-child nodes collapse into one escaped path key:
//!
//! ```json
//! { "a.b.c": ["undefined"] }
//! ```
//!
//! instead of
//!
//! ```json
//! { "a": { "b": { "c": ["undefined"] } } }
//! ```
//!
//! On read, tags are applied children first, so a set or map is rebuilt from
//! already decoded elements.
//!
//! # Referential equalities
//!
//! Every reference reached through more than one path is recorded once:
//!
//! - an object `{representative: [alias, ...]}` for references below the root
//! - an array `[alias, ...]` when the root itself is shared
//! - `[[alias, ...], {representative: [...]}]` when both happen
//!
//! The representative is the shortest path (ties go to the first discovered).
//! With [`Options::dedupe`](crate::Options::dedupe) every alias is written as
//! `null` and the first discovered path is the representative. Set members and
//! map keys are the exception: they are written in full, since two `null`
//! members would merge into one.
//!
//! On read, aliases are filled shallowest first, so an alias nested inside
//! another alias resolves through the outer, already shared handle.
//!
//! On read, equalities are applied after all tags, so each alias receives the
//! very same handle as its fully decoded representative.
//!
//! # Example
//!
//! ```rust
//! use serde_richjson::{rich, RichValue};
//! use serde_json::json;
//!
//! let shared = RichValue::set([RichValue::from(1)]);
//! let value = rich!({ "a": (shared.clone()), "b": { "c": (shared), "d": (RichValue::Undefined) } });
//!
//! let out = serde_richjson::serialize(&value).unwrap();
//! assert_eq!(
//!     out.to_json(),
//!     json!({
//!         "json": { "a": [1], "b": { "c": [1], "d": null } },
//!         "meta": {
//!             "values": { "a": ["set"], "b": { "c": ["set"], "d": ["undefined"] } },
//!             "referentialEqualities": { "a": ["b.c"] },
//!             "v": 1
//!         }
//!     })
//! );
//! ```
//!
//! # Limitations
//!
//! - **Cycles**: a value nested inside itself cannot be serialized
//! - **Symbols and classes**: only registered ones survive; identifiers must
//!   be registered on the reading side as well
//! - **Error props**: only names on the allow-list are kept
//! - **Versions**: only `v: 1` is understood; a missing `v` is read as `1`

//! Depth-first conversion of a rich value into plain JSON plus annotations.
//!
//! The walker applies the [`Rules`] to every node, keeps descending into the
//! rule output, and records the path of every reference it meets. A reference
//! met a second time outside its own ancestry reuses the finished result (or a
//! `null` placeholder in dedupe mode); a reference met inside its own ancestry
//! is a cycle and aborts the walk.
//!
//! Set members and map keys never get a placeholder. They are deduplicated on
//! decode, so two `null`s would merge into one entry before the aliases could
//! restore them.

use crate::annotation::AnnotationNode;
use crate::path::{escape_key, Path};
use crate::transform::{Encoded, Rules};
use crate::{Error, Result, RichValue};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// The result of walking one subtree.
#[derive(Clone, Debug)]
pub struct Walked {
    pub json: serde_json::Value,
    pub annotation: Option<AnnotationNode>,
}

/// Every path at which each reference was visited, in discovery order.
pub type Identities = IndexMap<usize, Vec<Path>>;

/// Per-call walk state.
pub struct Walker<'a> {
    rules: Rules<'a>,
    dedupe: bool,
    identities: Identities,
    ancestors: HashSet<usize>,
    finished: HashMap<usize, Walked>,
}

impl<'a> Walker<'a> {
    pub fn new(rules: Rules<'a>, dedupe: bool) -> Self {
        Walker {
            rules,
            dedupe,
            identities: IndexMap::new(),
            ancestors: HashSet::new(),
            finished: HashMap::new(),
        }
    }

    /// Walks `value`, found at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::CircularReference`] if a reference contains itself, or any
    /// error raised by the rules.
    pub fn walk(&mut self, value: &RichValue, path: &Path) -> Result<Walked> {
        self.visit(value, path, self.dedupe)
    }

    /// Walks a set member or map key: a repeat is written out in full.
    fn walk_keyed(&mut self, value: &RichValue, path: &Path) -> Result<Walked> {
        self.visit(value, path, false)
    }

    fn visit(&mut self, value: &RichValue, path: &Path, placeholder: bool) -> Result<Walked> {
        let Some(address) = value.identity() else {
            let transformed = self.rules.encode(value)?;
            let (json, children) = self.walk_output(transformed.output, path)?;
            return Ok(Walked {
                json,
                annotation: AnnotationNode::from_parts(transformed.tag, children),
            });
        };

        if self.ancestors.contains(&address) {
            return Err(Error::circular(path.to_string()));
        }

        self.identities.entry(address).or_default().push(path.clone());

        if let Some(done) = self.finished.get(&address) {
            if placeholder {
                return Ok(Walked {
                    json: serde_json::Value::Null,
                    annotation: None,
                });
            }
            return Ok(done.clone());
        }

        let transformed = self.rules.encode(value)?;

        self.ancestors.insert(address);
        let result = self.walk_output(transformed.output, path);
        self.ancestors.remove(&address);
        let (json, children) = result?;

        let walked = Walked {
            json,
            annotation: AnnotationNode::from_parts(transformed.tag, children),
        };
        self.finished.insert(address, walked.clone());
        Ok(walked)
    }

    fn walk_output(
        &mut self,
        output: Encoded,
        path: &Path,
    ) -> Result<(serde_json::Value, IndexMap<String, AnnotationNode>)> {
        let mut annotations = IndexMap::new();

        let json = match output {
            Encoded::Leaf(json) => json,
            Encoded::Seq(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let walked = self.walk(item, &path.child(i))?;
                    if let Some(annotation) = walked.annotation {
                        annotations.insert(i.to_string(), annotation);
                    }
                    out.push(walked.json);
                }
                serde_json::Value::Array(out)
            }
            Encoded::Members(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let walked = self.walk_keyed(item, &path.child(i))?;
                    if let Some(annotation) = walked.annotation {
                        annotations.insert(i.to_string(), annotation);
                    }
                    out.push(walked.json);
                }
                serde_json::Value::Array(out)
            }
            Encoded::Record(fields) => {
                let mut out = serde_json::Map::with_capacity(fields.len());
                for (key, item) in &fields {
                    let walked = self.walk(item, &path.child(key.as_str()))?;
                    if let Some(annotation) = walked.annotation {
                        annotations.insert(escape_key(key), annotation);
                    }
                    out.insert(key.clone(), walked.json);
                }
                serde_json::Value::Object(out)
            }
            Encoded::Rows(rows) => {
                let mut out = Vec::with_capacity(rows.len());
                for (i, (key, value)) in rows.iter().enumerate() {
                    let row = path.child(i);
                    let walked_key = self.walk_keyed(key, &row.child(0))?;
                    let walked_value = self.walk(value, &row.child(1))?;

                    let mut cells = IndexMap::new();
                    if let Some(annotation) = walked_key.annotation {
                        cells.insert("0".to_string(), annotation);
                    }
                    if let Some(annotation) = walked_value.annotation {
                        cells.insert("1".to_string(), annotation);
                    }
                    if let Some(annotation) = AnnotationNode::from_parts(None, cells) {
                        annotations.insert(i.to_string(), annotation);
                    }
                    out.push(serde_json::Value::Array(vec![walked_key.json, walked_value.json]));
                }
                serde_json::Value::Array(out)
            }
        };

        Ok((json, annotations))
    }

    /// Hands over the identity map once the walk is done.
    #[must_use]
    pub fn into_identities(self) -> Identities {
        self.identities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registries;
    use crate::{rich, ObjectMap};
    use serde_json::json;

    fn walk(value: &RichValue, dedupe: bool) -> Result<(Walked, Identities)> {
        let registries = Registries::default();
        let mut walker = Walker::new(Rules::new(&registries), dedupe);
        let walked = walker.walk(value, &Path::root())?;
        Ok((walked, walker.into_identities()))
    }

    #[test]
    fn test_plain_tree_has_no_annotation() {
        let (walked, _) = walk(&rich!({ "a": [1, "x", null] }), false).unwrap();
        assert_eq!(walked.json, json!({ "a": [1, "x", null] }));
        assert!(walked.annotation.is_none());
    }

    #[test]
    fn test_nested_set_with_nan() {
        let set = RichValue::set([
            RichValue::from(1),
            RichValue::from(f64::NAN),
            RichValue::from(2),
        ]);
        let (walked, _) = walk(&set, false).unwrap();
        assert_eq!(walked.json, json!([1, "NaN", 2]));
        assert_eq!(
            walked.annotation.unwrap().to_json(),
            json!(["set", { "1": ["number"] }])
        );
    }

    #[test]
    fn test_identities_record_every_path() {
        let shared = rich!({ "id": 1 });
        let root = rich!({ "x": (shared.clone()), "y": (shared.clone()) });
        let (walked, identities) = walk(&root, false).unwrap();
        assert_eq!(walked.json, json!({ "x": { "id": 1 }, "y": { "id": 1 } }));

        let paths = &identities[&shared.identity().unwrap()];
        let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(paths, vec!["x", "y"]);
    }

    #[test]
    fn test_dedupe_emits_placeholder() {
        let shared = rich!([1, 2]);
        let root = rich!([(shared.clone()), (shared.clone())]);
        let (walked, _) = walk(&root, true).unwrap();
        assert_eq!(walked.json, json!([[1, 2], null]));
    }

    #[test]
    fn test_dedupe_writes_set_members_and_map_keys_in_full() {
        let a = rich!({ "id": 1 });
        let b = rich!({ "id": 2 });
        let root = rich!({
            "a": (a.clone()),
            "b": (b.clone()),
            "s": (RichValue::set([a.clone(), b.clone()])),
            "m": (RichValue::map([(a.clone(), b.clone())])),
        });
        let (walked, identities) = walk(&root, true).unwrap();
        assert_eq!(walked.json["s"], json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(walked.json["m"], json!([[{ "id": 1 }, null]]));

        let paths: Vec<String> = identities[&a.identity().unwrap()]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(paths, vec!["a", "s.0", "m.0.0"]);
    }

    #[test]
    fn test_cycle_rejected() {
        let root = RichValue::object(ObjectMap::new());
        if let RichValue::Object(map) = &root {
            map.borrow_mut().insert("me".to_string(), root.clone());
        }
        let err = walk(&root, false).unwrap_err();
        assert!(matches!(err, Error::CircularReference { ref path } if path == "me"));

        // break the cycle so the test does not leak
        if let RichValue::Object(map) = &root {
            map.borrow_mut().remove("me");
        }
    }

    #[test]
    fn test_map_rows_annotated_per_cell() {
        let when = chrono::DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let map = RichValue::map([(RichValue::Date(when), RichValue::Undefined)]);
        let (walked, _) = walk(&rich!({ "m": (map) }), false).unwrap();
        assert_eq!(
            walked.json,
            json!({ "m": [["2020-01-01T00:00:00.000Z", null]] })
        );
        assert_eq!(
            walked.annotation.unwrap().compress().to_json(),
            json!({ "m": ["map", { "0": { "0": ["Date"], "1": ["undefined"] } }] })
        );
    }
}

//! Referential equalities: which paths must end up holding the same reference.
//!
//! For every reference seen at two or more paths the shortest path is the
//! representative and the others are its aliases. On decode the
//! representative is read after all tags have been applied and the very same
//! handle is written to each alias.

use crate::access::Accessor;
use crate::path::{self, Path};
use crate::walker::Identities;
use crate::{Error, PathSyntax, Result, RichValue};
use indexmap::IndexMap;

/// Alias groups keyed by their representative's stringified path.
///
/// # Examples
///
/// ```rust
/// use serde_richjson::ReferentialEqualities;
/// use serde_json::json;
///
/// let eq = ReferentialEqualities::from_json(&json!({ "x": ["y", "z.0"] })).unwrap();
/// assert_eq!(eq.keyed["x"], vec!["y", "z.0"]);
/// assert_eq!(eq.to_json(), Some(json!({ "x": ["y", "z.0"] })));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferentialEqualities {
    /// Aliases of the root value itself.
    pub root: Vec<String>,
    pub keyed: IndexMap<String, Vec<String>>,
}

impl ReferentialEqualities {
    /// Builds the alias groups from a walker's identity map.
    ///
    /// In dedupe mode only the first visit carries the full encoding, so the
    /// discovery order decides the representative; otherwise the shortest path
    /// wins, ties going to the earlier discovery.
    #[must_use]
    pub fn from_identities(identities: Identities, dedupe: bool) -> Self {
        let mut equalities = ReferentialEqualities::default();
        for (_, mut paths) in identities {
            if paths.len() < 2 {
                continue;
            }
            if !dedupe {
                paths.sort_by_key(Path::len);
            }
            let representative = paths.remove(0);
            let aliases: Vec<String> = paths.iter().map(path::stringify).collect();
            // `[""]` stringifies like the root; only the segment count tells them apart
            if representative.is_empty() {
                equalities.root.extend(aliases);
            } else {
                equalities.keyed.insert(path::stringify(&representative), aliases);
            }
        }
        equalities
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.keyed.is_empty()
    }

    /// Number of alias paths.
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.root.len() + self.keyed.values().map(Vec::len).sum::<usize>()
    }

    /// The wire form, `None` when there is nothing to record.
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Value> {
        let keyed = || {
            serde_json::Value::Object(
                self.keyed
                    .iter()
                    .map(|(rep, aliases)| (rep.clone(), string_array(aliases)))
                    .collect(),
            )
        };
        match (self.root.is_empty(), self.keyed.is_empty()) {
            (true, true) => None,
            (true, false) => Some(keyed()),
            (false, true) => Some(string_array(&self.root)),
            (false, false) => Some(serde_json::Value::Array(vec![
                string_array(&self.root),
                keyed(),
            ])),
        }
    }

    /// Reads the wire form.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPayload`] for any other shape.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(_) => Ok(ReferentialEqualities {
                root: Vec::new(),
                keyed: keyed_from_json(json)?,
            }),
            serde_json::Value::Array(items) => match items.as_slice() {
                [root @ serde_json::Value::Array(_), keyed] => Ok(ReferentialEqualities {
                    root: strings(root)?,
                    keyed: keyed_from_json(keyed)?,
                }),
                _ => Ok(ReferentialEqualities {
                    root: strings(json)?,
                    keyed: IndexMap::new(),
                }),
            },
            _ => Err(malformed()),
        }
    }

    /// Points every alias at its representative's handle.
    ///
    /// Must run after every tag has been applied, so that the representative
    /// is already fully decoded. Aliases are written shallowest first: an
    /// alias that sits inside another alias (or inside the path to a
    /// representative) is only resolved once the outer handle is in place.
    pub fn apply(&self, mut root: RichValue, accessor: &mut Accessor, syntax: PathSyntax) -> Result<RichValue> {
        let mut assignments: Vec<(Option<Path>, Path)> = Vec::with_capacity(self.alias_count());
        for alias in &self.root {
            assignments.push((None, path::parse_with(alias, syntax)?));
        }
        for (representative, aliases) in &self.keyed {
            let representative = path::parse_with(representative, syntax)?;
            for alias in aliases {
                assignments.push((Some(representative.clone()), path::parse_with(alias, syntax)?));
            }
        }
        assignments.sort_by_key(|(_, alias)| alias.len());

        for (representative, alias) in assignments {
            let target = match &representative {
                Some(representative) => accessor.get_deep(&root, representative)?,
                None => root.clone(),
            };
            root = accessor.set_deep(root, &alias, |_| Ok(target))?;
        }
        Ok(root)
    }
}

fn malformed() -> Error {
    Error::invalid_payload("malformed referentialEqualities")
}

fn string_array(items: &[String]) -> serde_json::Value {
    serde_json::Value::Array(items.iter().cloned().map(serde_json::Value::String).collect())
}

fn strings(json: &serde_json::Value) -> Result<Vec<String>> {
    json.as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(malformed))
        .collect()
}

fn keyed_from_json(json: &serde_json::Value) -> Result<IndexMap<String, Vec<String>>> {
    json.as_object()
        .ok_or_else(malformed)?
        .iter()
        .map(|(rep, aliases)| Ok((rep.clone(), strings(aliases)?)))
        .collect()
}

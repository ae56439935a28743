//! The annotation tree: every `(path, tag)` pair of one serialization.
//!
//! Nodes are either a [`AnnotationNode::Leaf`] carrying a tag, or an
//! [`AnnotationNode::Inner`] with an optional own tag and children keyed by
//! escaped path segments. [`AnnotationNode::compress`] folds chains of untagged
//! single-child nodes into multi-segment edges, so the wire size tracks the
//! number of branching points rather than the nesting depth.
//!
//! ```rust
//! use serde_richjson::annotation::AnnotationTree;
//! use serde_richjson::path::Path;
//! use serde_richjson::{SimpleTag, Tag};
//! use serde_json::json;
//!
//! let mut tree = AnnotationTree::new();
//! let deep = Path::root().child("this").child("is").child("nested");
//! tree.insert(&deep, Tag::Simple(SimpleTag::Date));
//!
//! let node = tree.into_node().unwrap().compress();
//! assert_eq!(node.to_json(), json!({ "this.is.nested": ["Date"] }));
//! ```
//!
//! On the wire a leaf is `[tag]`, a tagged inner node is `[tag, {children}]`
//! and an untagged inner node is the bare `{children}` object.

use crate::path::{self, Path, PathKey};
use crate::transform::Tag;
use crate::{Error, PathSyntax, Result};
use indexmap::IndexMap;

/// One node of an annotation tree.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationNode {
    Leaf(Tag),
    Inner(Option<Tag>, IndexMap<String, AnnotationNode>),
}

impl AnnotationNode {
    /// Assembles a node from its own tag and its annotated children.
    ///
    /// Returns `None` when there is nothing to record.
    #[must_use]
    pub fn from_parts(tag: Option<Tag>, children: IndexMap<String, AnnotationNode>) -> Option<Self> {
        match (tag, children.is_empty()) {
            (None, true) => None,
            (Some(tag), true) => Some(AnnotationNode::Leaf(tag)),
            (tag, false) => Some(AnnotationNode::Inner(tag, children)),
        }
    }

    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        match self {
            AnnotationNode::Leaf(tag) => Some(tag),
            AnnotationNode::Inner(tag, _) => tag.as_ref(),
        }
    }

    #[must_use]
    pub fn children(&self) -> Option<&IndexMap<String, AnnotationNode>> {
        match self {
            AnnotationNode::Leaf(_) => None,
            AnnotationNode::Inner(_, children) => Some(children),
        }
    }

    /// Collapses every untagged child with exactly one grandchild into its
    /// parent's edge, bottom-up, until no such child is left.
    #[must_use]
    pub fn compress(self) -> Self {
        match self {
            AnnotationNode::Leaf(tag) => AnnotationNode::Leaf(tag),
            AnnotationNode::Inner(tag, children) => {
                let mut out = IndexMap::with_capacity(children.len());
                for (edge, child) in children {
                    match child.compress() {
                        AnnotationNode::Inner(None, grandchildren) if grandchildren.len() == 1 => {
                            for (grand_edge, grandchild) in grandchildren {
                                out.insert(format!("{}.{}", edge, grand_edge), grandchild);
                            }
                        }
                        compressed => {
                            out.insert(edge, compressed);
                        }
                    }
                }
                AnnotationNode::Inner(tag, out)
            }
        }
    }

    /// Splits multi-segment edges back into one node per segment.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPath`] if an edge is not a valid path under `syntax`.
    pub fn decompress(self, syntax: PathSyntax) -> Result<Self> {
        match self {
            AnnotationNode::Leaf(tag) => Ok(AnnotationNode::Leaf(tag)),
            AnnotationNode::Inner(tag, children) => {
                let mut out: IndexMap<String, AnnotationNode> = IndexMap::new();
                for (edge, child) in children {
                    let keys = path::parse_with(&edge, syntax)?;
                    let mut node = child.decompress(syntax)?;
                    let Some((first, rest)) = keys.keys().split_first() else {
                        return Err(Error::invalid_path(&edge, "empty edge"));
                    };
                    for key in rest.iter().rev() {
                        let mut wrapper = IndexMap::new();
                        wrapper.insert(escape(key), node);
                        node = AnnotationNode::Inner(None, wrapper);
                    }
                    let edge = escape(first);
                    match out.shift_remove(&edge) {
                        Some(existing) => {
                            out.insert(edge, merge(existing, node));
                        }
                        None => {
                            out.insert(edge, node);
                        }
                    }
                }
                Ok(AnnotationNode::Inner(tag, out))
            }
        }
    }

    /// Every `(path, tag)` pair, children before their parent.
    ///
    /// Edges may span several segments; they are parsed with `syntax`.
    pub fn entries(&self, syntax: PathSyntax) -> Result<Vec<(Path, Tag)>> {
        let mut out = Vec::new();
        self.collect(&Path::root(), syntax, &mut out)?;
        Ok(out)
    }

    fn collect(&self, origin: &Path, syntax: PathSyntax, out: &mut Vec<(Path, Tag)>) -> Result<()> {
        match self {
            AnnotationNode::Leaf(tag) => out.push((origin.clone(), tag.clone())),
            AnnotationNode::Inner(tag, children) => {
                for (edge, child) in children {
                    let at = origin.join(&path::parse_with(edge, syntax)?);
                    child.collect(&at, syntax, out)?;
                }
                if let Some(tag) = tag {
                    out.push((origin.clone(), tag.clone()));
                }
            }
        }
        Ok(())
    }

    /// Number of tags in this subtree.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        match self {
            AnnotationNode::Leaf(_) => 1,
            AnnotationNode::Inner(tag, children) => {
                usize::from(tag.is_some()) + children.values().map(Self::tag_count).sum::<usize>()
            }
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AnnotationNode::Leaf(tag) => serde_json::Value::Array(vec![tag.to_json()]),
            AnnotationNode::Inner(tag, children) => {
                let children = serde_json::Value::Object(
                    children
                        .iter()
                        .map(|(edge, child)| (edge.clone(), child.to_json()))
                        .collect(),
                );
                match tag {
                    Some(tag) => serde_json::Value::Array(vec![tag.to_json(), children]),
                    None => children,
                }
            }
        }
    }

    /// Reads a node from its wire form.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownAnnotation`] for unknown tags, [`Error::InvalidPayload`]
    /// for a shape that is not an annotation node.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Self::from_json_at(json, None)
    }

    /// `at` is the stringified location, `None` at the root.
    fn from_json_at(json: &serde_json::Value, at: Option<&str>) -> Result<Self> {
        let label = at.unwrap_or_default();
        match json {
            serde_json::Value::Array(items) => match items.as_slice() {
                [tag] => Ok(AnnotationNode::Leaf(Tag::from_json(tag, label)?)),
                [tag, serde_json::Value::Object(children)] => {
                    let tag = match tag {
                        serde_json::Value::Null => None,
                        tag => Some(Tag::from_json(tag, label)?),
                    };
                    Ok(AnnotationNode::Inner(tag, Self::children_from_json(children, at)?))
                }
                _ => Err(Error::invalid_payload(format!(
                    "malformed annotation node at path '{}'",
                    label
                ))),
            },
            serde_json::Value::Object(children) => Ok(AnnotationNode::Inner(
                None,
                Self::children_from_json(children, at)?,
            )),
            _ => Err(Error::invalid_payload(format!(
                "malformed annotation node at path '{}'",
                label
            ))),
        }
    }

    fn children_from_json(
        children: &serde_json::Map<String, serde_json::Value>,
        at: Option<&str>,
    ) -> Result<IndexMap<String, AnnotationNode>> {
        children
            .iter()
            .map(|(edge, child)| {
                let child_at = match at {
                    None => edge.clone(),
                    Some(at) => format!("{}.{}", at, edge),
                };
                Ok((edge.clone(), Self::from_json_at(child, Some(&child_at))?))
            })
            .collect()
    }
}

fn escape(key: &PathKey) -> String {
    path::escape_key(&key.to_string())
}

/// Combines two nodes found under the same edge.
fn merge(a: AnnotationNode, b: AnnotationNode) -> AnnotationNode {
    let (tag_a, children_a) = split(a);
    let (tag_b, children_b) = split(b);
    let mut children = children_a;
    for (edge, child) in children_b {
        let merged = match children.shift_remove(&edge) {
            Some(existing) => merge(existing, child),
            None => child,
        };
        children.insert(edge, merged);
    }
    AnnotationNode::from_parts(tag_b.or(tag_a), children)
        .unwrap_or(AnnotationNode::Inner(None, IndexMap::new()))
}

fn split(node: AnnotationNode) -> (Option<Tag>, IndexMap<String, AnnotationNode>) {
    match node {
        AnnotationNode::Leaf(tag) => (Some(tag), IndexMap::new()),
        AnnotationNode::Inner(tag, children) => (tag, children),
    }
}

/// Incremental builder: a trie of tags keyed by path segments.
#[derive(Clone, Debug, Default)]
pub struct AnnotationTree {
    root: Option<Tag>,
    children: IndexMap<String, AnnotationNode>,
}

impl AnnotationTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `tag` at `path`, replacing any tag already there.
    pub fn insert(&mut self, path: &Path, tag: Tag) {
        match path.keys().split_first() {
            None => self.root = Some(tag),
            Some((first, rest)) => {
                let edge = escape(first);
                let child = self
                    .children
                    .shift_remove(&edge)
                    .unwrap_or(AnnotationNode::Inner(None, IndexMap::new()));
                self.children.insert(edge, insert_into(child, rest, tag));
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.children.is_empty()
    }

    /// The finished (uncompressed) tree, `None` if nothing was inserted.
    #[must_use]
    pub fn into_node(self) -> Option<AnnotationNode> {
        AnnotationNode::from_parts(self.root, self.children)
    }
}

fn insert_into(node: AnnotationNode, keys: &[PathKey], tag: Tag) -> AnnotationNode {
    let (own, mut children) = split(node);
    match keys.split_first() {
        None if children.is_empty() => AnnotationNode::Leaf(tag),
        None => AnnotationNode::Inner(Some(tag), children),
        Some((first, rest)) => {
            let edge = escape(first);
            let child = children
                .shift_remove(&edge)
                .unwrap_or(AnnotationNode::Inner(None, IndexMap::new()));
            children.insert(edge, insert_into(child, rest, tag));
            AnnotationNode::Inner(own, children)
        }
    }
}

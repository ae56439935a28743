//! Property-based tests for the core round-trip guarantees
//!
//! Values are generated as a plain `Gen` tree first and only turned into
//! `RichValue`s inside each case, so strategies stay `Send` and shrink well.
//! `Gen::Shared(i)` stands for one handle out of a per-case pool, so the same
//! reference can show up at many positions, including set members and map
//! keys.

use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use proptest::prelude::*;
use serde_richjson::annotation::{AnnotationNode, AnnotationTree};
use serde_richjson::path::{self, Path};
use serde_richjson::{
    deserialize, serialize, ObjectMap, Options, PathSyntax, RichJson, RichValue, SimpleTag, Tag,
};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
enum Gen {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Big(i128),
    Date(i64),
    Array(Vec<Gen>),
    Object(Vec<(String, Gen)>),
    Set(Vec<Gen>),
    Map(Vec<(Gen, Gen)>),
    Shared(usize),
}

fn build(gen: &Gen, pool: &[RichValue]) -> RichValue {
    let all = |items: &[Gen]| items.iter().map(|g| build(g, pool)).collect::<Vec<_>>();
    match gen {
        Gen::Undefined => RichValue::Undefined,
        Gen::Null => RichValue::Null,
        Gen::Bool(b) => RichValue::Bool(*b),
        Gen::Int(i) => RichValue::from(*i),
        Gen::Float(f) => RichValue::from(*f),
        Gen::Str(s) => RichValue::from(s.as_str()),
        Gen::Big(i) => RichValue::BigInt(BigInt::from(*i)),
        Gen::Date(ms) => RichValue::Date(Utc.timestamp_millis_opt(*ms).unwrap()),
        Gen::Array(items) => RichValue::array(all(items)),
        Gen::Object(fields) => RichValue::object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), build(v, pool)))
                .collect::<ObjectMap>(),
        ),
        Gen::Set(items) => RichValue::set(all(items)),
        Gen::Map(entries) => {
            RichValue::map(entries.iter().map(|(k, v)| (build(k, pool), build(v, pool))))
        }
        Gen::Shared(i) if pool.is_empty() => RichValue::from(*i as i64),
        Gen::Shared(i) => pool[i % pool.len()].clone(),
    }
}

/// Builds the pool front to back; entry `i` may only hold entries before it,
/// so the handles never form a cycle.
fn build_pool(gens: &[Gen]) -> Vec<RichValue> {
    let mut pool = Vec::with_capacity(gens.len());
    for gen in gens {
        let handle = match build(gen, &pool) {
            value if value.is_reference() => value,
            value => RichValue::array(vec![value]),
        };
        pool.push(handle);
    }
    pool
}

/// Walks both trees side by side and checks that sharing is mirrored exactly:
/// two positions hold the same handle after the round trip iff they did before.
fn same_sharing(
    before: &RichValue,
    after: &RichValue,
    forward: &mut HashMap<usize, usize>,
    backward: &mut HashMap<usize, usize>,
) -> bool {
    let (Some(a), Some(b)) = (before.identity(), after.identity()) else {
        return before.identity().is_none() && after.identity().is_none();
    };
    match (forward.get(&a), backward.get(&b)) {
        (Some(&fa), Some(&fb)) => return fa == b && fb == a,
        (None, None) => {
            forward.insert(a, b);
            backward.insert(b, a);
        }
        _ => return false,
    }

    let pairs: Vec<(RichValue, RichValue)> = match (before, after) {
        (RichValue::Array(x), RichValue::Array(y)) => {
            x.borrow().iter().cloned().zip(y.borrow().iter().cloned()).collect()
        }
        (RichValue::Object(x), RichValue::Object(y)) => x
            .borrow()
            .values()
            .cloned()
            .zip(y.borrow().values().cloned())
            .collect(),
        (RichValue::Set(x), RichValue::Set(y)) => {
            x.borrow().iter().cloned().zip(y.borrow().iter().cloned()).collect()
        }
        (RichValue::Map(x), RichValue::Map(y)) => x
            .borrow()
            .iter()
            .zip(y.borrow().iter())
            .flat_map(|((ka, va), (kb, vb))| [(ka.clone(), kb.clone()), (va.clone(), vb.clone())])
            .collect(),
        _ => return false,
    };
    pairs
        .iter()
        .all(|(x, y)| same_sharing(x, y, forward, backward))
}

fn special_float() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        Just(-0.0),
        any::<f64>(),
    ]
}

fn leaf() -> impl Strategy<Value = Gen> {
    prop_oneof![
        Just(Gen::Undefined),
        Just(Gen::Null),
        any::<bool>().prop_map(Gen::Bool),
        any::<i64>().prop_map(Gen::Int),
        special_float().prop_map(Gen::Float),
        "[a-zA-Z0-9 .\\\\-]{0,8}".prop_map(Gen::Str),
        any::<i128>().prop_map(Gen::Big),
        (0i64..4_102_444_800_000).prop_map(Gen::Date),
    ]
}

fn tree(leaves: BoxedStrategy<Gen>) -> impl Strategy<Value = Gen> {
    leaves.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Gen::Array),
            prop::collection::vec((key(), inner.clone()), 0..6).prop_map(Gen::Object),
            prop::collection::vec(inner.clone(), 0..6).prop_map(Gen::Set),
            prop::collection::vec((inner.clone(), inner), 0..4).prop_map(Gen::Map),
        ]
    })
}

fn value() -> impl Strategy<Value = Gen> {
    tree(leaf().boxed())
}

/// A tree whose leaves are often pool handles, plus the pool itself.
fn shared_value() -> impl Strategy<Value = (Vec<Gen>, Gen)> {
    let leaves = || prop_oneof![2 => leaf(), 3 => (0usize..8).prop_map(Gen::Shared)].boxed();
    (prop::collection::vec(tree(leaves()), 1..5), tree(leaves()))
}

fn key() -> impl Strategy<Value = String> {
    "[a-z0-9.\\\\]{0,5}"
}

fn tag() -> impl Strategy<Value = Tag> {
    prop_oneof![
        Just(Tag::Simple(SimpleTag::Undefined)),
        Just(Tag::Simple(SimpleTag::Set)),
        Just(Tag::Simple(SimpleTag::Map)),
        Just(Tag::Simple(SimpleTag::Number)),
        "[A-Z][a-z]{0,5}".prop_map(Tag::Class),
    ]
}

proptest! {
    #[test]
    fn prop_value_roundtrip(gen in value()) {
        let value = build(&gen, &[]);
        let out = serialize(&value).unwrap();
        let back = deserialize(out).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn prop_shared_handles_survive((pool, gen) in shared_value()) {
        let pool = build_pool(&pool);
        let value = build(&gen, &pool);
        let back = deserialize(serialize(&value).unwrap()).unwrap();
        prop_assert_eq!(&back, &value);
        prop_assert!(same_sharing(&value, &back, &mut HashMap::new(), &mut HashMap::new()));
    }

    #[test]
    fn prop_dedupe_roundtrip((pool, gen) in shared_value()) {
        let codec = RichJson::with_options(Options::new().with_dedupe(true));
        let pool = build_pool(&pool);
        let value = build(&gen, &pool);
        let back = codec.parse(&codec.stringify(&value).unwrap()).unwrap();
        prop_assert_eq!(&back, &value);
        prop_assert!(same_sharing(&value, &back, &mut HashMap::new(), &mut HashMap::new()));
    }

    #[test]
    fn prop_path_roundtrip(keys in prop::collection::vec(key(), 1..6)) {
        let original: Path = keys.iter().map(String::as_str).collect();
        let text = path::stringify(&original);
        let parsed = path::parse(&text).unwrap();
        prop_assert_eq!(parsed.len(), keys.len());
        prop_assert_eq!(&parsed, &original);
    }

    #[test]
    fn prop_annotation_roundtrip(
        entries in prop::collection::vec((prop::collection::vec(key(), 0..4), tag()), 1..12)
    ) {
        let mut tree = AnnotationTree::new();
        let mut expected = BTreeMap::new();
        for (keys, tag) in &entries {
            let at: Path = keys.iter().map(String::as_str).collect();
            tree.insert(&at, tag.clone());
            expected.insert(keys.clone(), tag.to_string());
        }

        let wire = tree.into_node().unwrap().compress().to_json();
        let node = AnnotationNode::from_json(&wire)
            .unwrap()
            .decompress(PathSyntax::Strict)
            .unwrap();
        let found: BTreeMap<Vec<String>, String> = node
            .entries(PathSyntax::Strict)
            .unwrap()
            .into_iter()
            .map(|(at, tag)| (at.keys().iter().map(ToString::to_string).collect(), tag.to_string()))
            .collect();

        prop_assert_eq!(found, expected);
    }
}

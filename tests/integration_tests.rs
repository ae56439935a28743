use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_richjson::access::Accessor;
use serde_richjson::path::Path;
use serde_richjson::{
    deserialize, from_str, from_value, rich, serialize, to_string, to_value, Class, Error,
    ErrorValue, FnTransformer, Number, ObjectMap, Options, RegExp, RichJson, RichValue, Symbol,
    TypedArray,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn roundtrip(value: &RichValue) -> RichValue {
    let text = to_string(value).unwrap();
    println!("Serialized: {}", text);
    from_str(&text).unwrap()
}

#[test]
fn test_undefined_property() {
    let value = rich!({ "a": (RichValue::Undefined) });

    let out = serialize(&value).unwrap();
    assert_eq!(out.json, json!({ "a": null }));
    assert_eq!(
        out.to_json()["meta"],
        json!({ "values": { "a": ["undefined"] }, "v": 1 })
    );

    let back = deserialize(out).unwrap();
    let map = back.as_object().unwrap().borrow();
    assert!(map.get("a").unwrap().is_undefined());
}

#[test]
fn test_top_level_set_with_nan() {
    let value = RichValue::set([
        RichValue::from(1),
        RichValue::from(f64::NAN),
        RichValue::from(2),
    ]);

    let out = serialize(&value).unwrap();
    assert_eq!(out.json, json!([1, "NaN", 2]));
    assert_eq!(
        out.to_json()["meta"]["values"],
        json!(["set", { "1": ["number"] }])
    );

    let back = deserialize(out).unwrap();
    let set = back.as_set().unwrap().borrow();
    assert_eq!(set.len(), 3);
    assert!(set.contains(&RichValue::from(f64::NAN)));
    assert!(set.contains(&RichValue::from(2)));
}

#[test]
fn test_shared_object_restored_as_one_reference() {
    let obj = rich!({ "id": 1 });
    let value = rich!({ "x": (obj.clone()), "y": (obj) });

    let out = serialize(&value).unwrap();
    assert_eq!(
        out.to_json()["meta"],
        json!({ "referentialEqualities": { "x": ["y"] }, "v": 1 })
    );

    let back = deserialize(out).unwrap();
    let map = back.as_object().unwrap().borrow();
    let (x, y) = (map.get("x").unwrap(), map.get("y").unwrap());
    assert!(x.same_reference(y));

    // mutation through one alias is visible through the other
    x.as_object()
        .unwrap()
        .borrow_mut()
        .insert("id".to_string(), RichValue::from(2));
    assert_eq!(y.as_object().unwrap().borrow().get("id"), Some(&RichValue::from(2)));
}

#[test]
fn test_map_with_object_key() {
    let value = RichValue::map([(rich!({ "id": 1 }), RichValue::from("v"))]);

    let out = serialize(&value).unwrap();
    assert_eq!(out.json, json!([[{ "id": 1 }, "v"]]));
    assert_eq!(out.to_json()["meta"]["values"], json!(["map"]));

    let back = deserialize(out).unwrap();
    let map = back.as_map().unwrap().borrow();
    assert_eq!(map.len(), 1);
    let (key, val) = map.iter().next().unwrap();
    assert_eq!(key, &rich!({ "id": 1 }));
    assert_eq!(val, &RichValue::from("v"));
}

#[test]
fn test_set_positions_survive_mutation() {
    let set = RichValue::set([10, 20, 30].map(RichValue::from));
    let root = rich!({ "s": (set.clone()) });
    let mut accessor = Accessor::new();

    let second = Path::root().child("s").child(1);
    let root = accessor
        .set_deep(root, &second, |v| {
            let n = v.as_i64().unwrap();
            Ok(RichValue::from(n * 2))
        })
        .unwrap();

    let third = Path::root().child("s").child(2);
    let mut seen = None;
    let _root = accessor
        .set_deep(root, &third, |v| {
            seen = Some(v.clone());
            Ok(v)
        })
        .unwrap();
    assert_eq!(seen, Some(RichValue::from(30)));

    let items: Vec<RichValue> = set.as_set().unwrap().borrow().iter().cloned().collect();
    assert_eq!(items, vec![10, 40, 30].into_iter().map(RichValue::from).collect::<Vec<_>>());
}

#[test]
fn test_special_numbers_keep_their_kind() {
    for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0] {
        let value = RichValue::from(n);
        let back = roundtrip(&value);
        assert_eq!(back, value);
        let f = back.as_f64().unwrap();
        assert_eq!(f.is_nan(), n.is_nan());
        if !n.is_nan() {
            assert_eq!(f, n);
            assert_eq!(f.is_sign_negative(), n.is_sign_negative());
        }
    }

    // positive zero stays plain
    let out = serialize(&RichValue::from(0.0)).unwrap();
    assert!(out.meta.is_none());
}

#[test]
fn test_bigint_date_regexp_roundtrip() {
    let big = BigInt::parse_bytes(b"-98765432109876543210987654321", 10).unwrap();
    let when = Utc.timestamp_millis_opt(1_600_000_000_123).unwrap();
    let value = rich!({
        "big": (RichValue::BigInt(big)),
        "when": (RichValue::Date(when)),
        "pattern": (RichValue::RegExp(RegExp::new("^a+b$", "gi"))),
    });

    let out = serialize(&value).unwrap();
    assert_eq!(
        out.json,
        json!({
            "big": "-98765432109876543210987654321",
            "when": "2020-09-13T12:26:40.123Z",
            "pattern": "/^a+b$/gi",
        })
    );
    assert_eq!(
        out.to_json()["meta"]["values"],
        json!({ "big": ["bigint"], "when": ["Date"], "pattern": ["regexp"] })
    );
    assert_eq!(deserialize(out).unwrap(), value);
}

#[test]
fn test_nested_collections() {
    let inner = RichValue::set([RichValue::Undefined, RichValue::from(f64::INFINITY)]);
    let value = rich!({
        "deep": {
            "map": (RichValue::map([(RichValue::from(f64::NAN), inner)])),
        },
    });

    let out = serialize(&value).unwrap();
    assert_eq!(
        out.json,
        json!({ "deep": { "map": [["NaN", [null, "Infinity"]]] } })
    );
    assert_eq!(
        out.to_json()["meta"]["values"],
        json!({
            "deep.map": ["map", { "0": {
                "0": ["number"],
                "1": ["set", { "0": ["undefined"], "1": ["number"] }]
            } }]
        })
    );
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_keys_with_dots_are_escaped() {
    let value = rich!({ "a.b": { "c\\d": (RichValue::Undefined) } });
    let out = serialize(&value).unwrap();
    assert_eq!(
        out.to_json()["meta"]["values"],
        json!({ r"a\.b.c\\d": ["undefined"] })
    );
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_identity_inside_sets_and_maps() {
    let shared = rich!({ "id": 7 });
    let value = rich!({
        "set": (RichValue::set([shared.clone()])),
        "map": (RichValue::map([(RichValue::from("k"), shared.clone())])),
        "direct": (shared),
    });

    let back = roundtrip(&value);
    let root = back.as_object().unwrap().borrow();
    let direct = root.get("direct").unwrap();
    let in_set = root.get("set").unwrap().as_set().unwrap().borrow().get_index(0).cloned().unwrap();
    let in_map = root
        .get("map")
        .unwrap()
        .as_map()
        .unwrap()
        .borrow()
        .get(&RichValue::from("k"))
        .cloned()
        .unwrap();
    assert!(direct.same_reference(&in_set));
    assert!(direct.same_reference(&in_map));
}

#[test]
fn test_empty_key_is_an_ordinary_key() {
    let when = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
    let value = rich!({ "": (RichValue::Date(when)), "x": { "": (RichValue::Undefined) } });
    let out = serialize(&value).unwrap();
    assert_eq!(
        out.to_json()["meta"]["values"],
        json!({ "": ["Date"], "x.": ["undefined"] })
    );
    assert_eq!(roundtrip(&value), value);
}

#[test]
fn test_empty_key_shared_with_sibling() {
    let shared = rich!({ "id": 1 });
    let value = rich!({ "": (shared.clone()), "b": (shared) });
    let out = serialize(&value).unwrap();
    assert_eq!(
        out.to_json()["meta"]["referentialEqualities"],
        json!({ "": ["b"] })
    );

    let back = deserialize(out).unwrap();
    let root = back.as_object().unwrap().borrow();
    let b = root.get("b").unwrap();
    assert!(root.get("").unwrap().same_reference(b));
    assert!(!b.same_reference(&back));
}

#[test]
fn test_inner_reference_found_before_outer() {
    let inner = rich!({ "n": 1 });
    let outer = rich!({ "b": (inner.clone()) });
    let value = rich!({
        "z": (inner),
        "d": { "a": (outer.clone()) },
        "s": (outer),
    });
    let out = serialize(&value).unwrap();
    assert_eq!(
        out.to_json()["meta"]["referentialEqualities"],
        json!({ "z": ["d.a.b"], "s": ["d.a"] })
    );

    let back = deserialize(out).unwrap();
    let mut accessor = Accessor::new();
    let mut get = |p: &str| accessor.get_deep(&back, &serde_richjson::path::parse(p).unwrap()).unwrap();
    let z = get("z");
    assert!(z.same_reference(&get("s.b")));
    assert!(z.same_reference(&get("d.a.b")));
    assert!(get("s").same_reference(&get("d.a")));
}

#[test]
fn test_cycle_is_rejected() {
    let root = RichValue::array(vec![]);
    let child = rich!({ "parent": (root.clone()) });
    root.as_array().unwrap().borrow_mut().push(child.clone());

    let err = serialize(&root).unwrap_err();
    match err {
        Error::CircularReference { path } => assert_eq!(path, "0.parent"),
        other => panic!("unexpected error {:?}", other),
    }

    child.as_object().unwrap().borrow_mut().remove("parent");
}

#[test]
fn test_prototype_paths_rejected() {
    let result = from_str(r#"{"json":{"__proto__":null},"meta":{"values":{"__proto__":["undefined"]},"v":1}}"#);
    assert!(matches!(result, Err(Error::PrototypePollution { .. })));

    let result = from_str(
        r#"{"json":{"a":{}},"meta":{"referentialEqualities":{"a":["constructor.prototype"]},"v":1}}"#,
    );
    assert!(matches!(result, Err(Error::PrototypePollution { .. })));
}

#[test]
fn test_registered_class() {
    let point = Arc::new(Class::new("Point").with_allow_props(["x", "y"]));
    let codec = RichJson::new();
    codec.register_class(&point).unwrap();

    let fields: ObjectMap = [
        ("x".to_string(), RichValue::from(1)),
        ("y".to_string(), RichValue::from(2)),
        ("cache".to_string(), RichValue::from("skip")),
    ]
    .into_iter()
    .collect();
    let value = RichValue::instance(&point, fields);

    let out = codec.serialize(&value).unwrap();
    assert_eq!(out.json, json!({ "x": 1, "y": 2 }));
    assert_eq!(out.to_json()["meta"]["values"], json!([["class", "Point"]]));

    let back = codec.deserialize(out.clone()).unwrap();
    let visible: ObjectMap = [
        ("x".to_string(), RichValue::from(1)),
        ("y".to_string(), RichValue::from(2)),
    ]
    .into_iter()
    .collect();
    assert_eq!(back, RichValue::instance(&point, visible));

    // a context that does not know the class cannot decode it
    assert!(matches!(
        RichJson::new().deserialize(out),
        Err(Error::UnknownAnnotation { .. })
    ));
}

#[test]
fn test_class_factory_runs_on_decode() {
    let counter = Arc::new(Class::new("Counter").with_factory(|mut fields| {
        let count = fields.get("count").and_then(RichValue::as_i64).unwrap_or(0);
        fields.insert("double".to_string(), RichValue::from(count * 2));
        Ok(fields)
    }));
    let codec = RichJson::new();
    codec.register_class_as(&counter, "app.Counter").unwrap();

    let fields: ObjectMap = [("count".to_string(), RichValue::from(4))].into_iter().collect();
    let text = codec.stringify(&RichValue::instance(&counter, fields)).unwrap();
    assert!(text.contains(r#"["class","app.Counter"]"#));

    let back = codec.parse(&text).unwrap();
    match back {
        RichValue::Instance(instance) => {
            let instance = instance.borrow();
            assert_eq!(instance.class.name(), "Counter");
            assert_eq!(instance.fields.get("double"), Some(&RichValue::from(8)));
        }
        other => panic!("expected instance, got {:?}", other),
    }
}

#[test]
fn test_registered_symbol() {
    let token = Symbol::new("token");
    let codec = RichJson::new();

    assert!(matches!(
        codec.serialize(&RichValue::Symbol(token.clone())),
        Err(Error::UnsupportedType(_))
    ));

    codec.register_symbol(&token, None).unwrap();
    let out = codec.serialize(&rich!([(RichValue::Symbol(token.clone()))])).unwrap();
    assert_eq!(out.json, json!(["token"]));
    assert_eq!(out.to_json()["meta"]["values"], json!({ "0": [["symbol", "token"]] }));

    let back = codec.deserialize(out).unwrap();
    let items = back.as_array().unwrap().borrow();
    assert_eq!(items[0], RichValue::Symbol(token));
}

#[test]
fn test_ambiguous_registration() {
    let codec = RichJson::new();
    codec.register_symbol(&Symbol::new("dup"), None).unwrap();
    let err = codec.register_symbol(&Symbol::new("dup"), None).unwrap_err();
    assert!(matches!(err, Error::AmbiguousRegistration { ref identifier } if identifier == "dup"));

    // the same symbol again is fine
    let same = Symbol::new("again");
    codec.register_symbol(&same, None).unwrap();
    codec.register_symbol(&same, None).unwrap();
}

#[test]
fn test_error_props_allow_list() {
    let codec = RichJson::new();
    codec.allow_error_props(["code"]);

    let error = ErrorValue::new("TypeError", "boom")
        .with_prop("code", RichValue::from(42))
        .with_prop("stack", RichValue::from("at main"));
    let out = codec.serialize(&RichValue::error(error)).unwrap();
    assert_eq!(
        out.json,
        json!({ "name": "TypeError", "message": "boom", "code": 42 })
    );
    assert_eq!(out.to_json()["meta"]["values"], json!(["Error"]));

    let back = codec.deserialize(out).unwrap();
    let expected = ErrorValue::new("TypeError", "boom").with_prop("code", RichValue::from(42));
    assert_eq!(back, RichValue::error(expected));
}

#[test]
fn test_typed_array_roundtrip() {
    let value = RichValue::typed_array(TypedArray::Int16(vec![-1, 2, 300]));
    let out = serialize(&value).unwrap();
    assert_eq!(out.json, json!([-1, 2, 300]));
    assert_eq!(out.to_json()["meta"]["values"], json!([["typed-array", "Int16Array"]]));
    assert_eq!(deserialize(out).unwrap(), value);

    let floats = RichValue::typed_array(TypedArray::Float64(vec![0.5, f64::NAN]));
    assert_eq!(roundtrip(&floats), floats);
}

#[test]
fn test_typed_array_out_of_range_rejected() {
    let text = r#"{"json":[1,256],"meta":{"values":[["typed-array","Uint8Array"]],"v":1}}"#;
    assert!(matches!(from_str(text), Err(Error::TypeMismatch { .. })));
}

#[derive(Debug, PartialEq)]
struct Money {
    cents: i64,
}

#[test]
fn test_custom_transformer() {
    let codec = RichJson::new();
    codec
        .register_custom(Arc::new(FnTransformer::new(
            "money",
            |v: &RichValue| v.downcast_ref::<Money>().is_some(),
            |v: &RichValue| {
                let cents = v.downcast_ref::<Money>().map_or(0, |m| m.cents);
                Ok(json!(format!("{}.{:02}", cents / 100, cents % 100)))
            },
            |json: serde_json::Value| {
                let text = json.as_str().unwrap_or_default();
                let cents = text.replace('.', "").parse::<i64>().map_err(Error::custom)?;
                Ok(RichValue::extension(Money { cents }))
            },
        )))
        .unwrap();

    let value = rich!({ "price": (RichValue::extension(Money { cents: 1999 })) });
    let out = codec.serialize(&value).unwrap();
    assert_eq!(out.json, json!({ "price": "19.99" }));
    assert_eq!(out.to_json()["meta"]["values"], json!({ "price": [["custom", "money"]] }));
    assert_eq!(codec.deserialize(out).unwrap(), value);

    // without the transformer the extension cannot be encoded
    assert!(matches!(serialize(&value), Err(Error::UnsupportedType(_))));
}

#[test]
fn test_dedupe_mode() {
    let shared = rich!([1, (RichValue::Undefined)]);
    let value = rich!([(shared.clone()), (shared)]);
    let codec = RichJson::with_options(Options::new().with_dedupe(true));

    let out = codec.serialize(&value).unwrap();
    assert_eq!(out.json, json!([[1, null], null]));
    assert_eq!(
        out.to_json()["meta"],
        json!({
            "values": { "0.1": ["undefined"] },
            "referentialEqualities": { "0": ["1"] },
            "v": 1
        })
    );

    let back = codec.deserialize(out).unwrap();
    let items = back.as_array().unwrap().borrow();
    assert!(items[0].same_reference(&items[1]));
    assert!(items[1].as_array().unwrap().borrow()[1].is_undefined());
}

#[test]
fn test_dedupe_keeps_set_members_and_map_keys_apart() {
    let a = rich!({ "id": 1 });
    let b = rich!({ "id": 2 });
    let value = rich!({
        "a": (a.clone()),
        "b": (b.clone()),
        "s": (RichValue::set([a.clone(), b.clone()])),
        "m": (RichValue::map([(a, b)])),
    });
    let codec = RichJson::with_options(Options::new().with_dedupe(true));

    let out = codec.serialize(&value).unwrap();
    assert_eq!(out.json["s"], json!([{ "id": 1 }, { "id": 2 }]));
    assert_eq!(out.json["m"], json!([[{ "id": 1 }, null]]));

    let back = codec.deserialize(out).unwrap();
    let root = back.as_object().unwrap().borrow();
    let a = root.get("a").unwrap();
    let b = root.get("b").unwrap();

    let set = root.get("s").unwrap().as_set().unwrap().borrow();
    assert_eq!(set.len(), 2);
    assert!(set.get_index(0).unwrap().same_reference(a));
    assert!(set.get_index(1).unwrap().same_reference(b));

    let map = root.get("m").unwrap().as_map().unwrap().borrow();
    let (key, val) = map.iter().next().unwrap();
    assert!(key.same_reference(a));
    assert!(val.same_reference(b));
}

#[test]
fn test_unknown_tag_rejected() {
    let err = from_str(r#"{"json":1,"meta":{"values":{"a":["bogus"]},"v":1}}"#).unwrap_err();
    assert!(matches!(err, Error::UnknownAnnotation { .. }));
}

#[test]
fn test_tag_on_wrong_shape() {
    let err = from_str(r#"{"json":5,"meta":{"values":["Date"],"v":1}}"#).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[test]
fn test_missing_path_reported() {
    let err = from_str(r#"{"json":{},"meta":{"values":{"a":["undefined"]},"v":1}}"#).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_missing_version_defaults() {
    let value = from_str(r#"{"json":"-0","meta":{"values":["number"]}}"#).unwrap();
    assert_eq!(value, RichValue::Number(Number::Float(-0.0)));
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Ledger {
    id: u128,
    owner: String,
    balances: BTreeMap<u32, i64>,
    note: Option<String>,
}

#[test]
fn test_typed_struct_through_rich_json() {
    let mut balances = BTreeMap::new();
    balances.insert(7, -20);
    balances.insert(9, 35);
    let ledger = Ledger {
        id: u128::MAX - 1,
        owner: "Ada".to_string(),
        balances,
        note: None,
    };

    let value = to_value(&ledger).unwrap();
    assert!(matches!(
        value.as_object().unwrap().borrow().get("balances"),
        Some(RichValue::Map(_))
    ));

    let back: Ledger = from_value(roundtrip(&value)).unwrap();
    assert_eq!(back, ledger);
}

use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_walk::{
    to_string, to_string_pretty, to_string_with_options, to_value, value, Error,
    ExtensionConflicts, KeyPolicy, NullHandling, Number, Record, Value, ValueMap, WriteOptions,
    WriterOptions,
};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    note: Option<String>,
}

fn assert_roundtrip<T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug>(value: &T) {
    let json = to_string(&to_value(value).unwrap()).unwrap();
    let back: T = serde_json::from_str(&json).unwrap();
    assert_eq!(*value, back, "json was {}", json);
}

fn object(value: Value) -> ValueMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, found {:?}", other),
    }
}

fn user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    }
}

#[test]
fn test_simple_struct() {
    let json = to_string(&to_value(&user()).unwrap()).unwrap();
    assert_eq!(
        json,
        r#"{"id":123,"name":"Alice","active":true,"tags":["admin","developer"]}"#
    );
    assert_roundtrip(&user());
}

#[test]
fn test_nested_struct_pretty() {
    let order = Order {
        order_id: 12345,
        customer: user(),
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.0,
                quantity: 1,
            },
        ],
        note: None,
    };

    let json = to_string_pretty(&to_value(&order).unwrap()).unwrap();
    assert!(json.contains("\n  \"customer\": {\n    \"id\": 123,"));
    assert!(json.contains("\"price\": 49.0"));

    let back: Order = serde_json::from_str(&json).unwrap();
    assert_eq!(order, back);
}

#[test]
fn test_primitives() {
    assert_roundtrip(&42i32);
    assert_roundtrip(&-7i64);
    assert_roundtrip(&u64::MAX);
    assert_roundtrip(&3.5f64);
    assert_roundtrip(&true);
    assert_roundtrip(&"hello world".to_string());
    assert_roundtrip(&vec![1, 2, 3, 4, 5]);
    assert_roundtrip(&Some(5u8));
    assert_roundtrip(&(1, "two".to_string(), false));
}

#[test]
fn test_special_strings() {
    let strings = vec![
        "".to_string(),
        "quote \" inside".to_string(),
        "back\\slash".to_string(),
        "line1\nline2\r\n".to_string(),
        "tab\there".to_string(),
        "bell\u{7}".to_string(),
        "unicode: héllo 日本".to_string(),
    ];
    assert_roundtrip(&strings);
}

#[test]
fn test_empty_containers() {
    assert_eq!(to_string(&value!([])).unwrap(), "[]");
    assert_eq!(to_string(&value!({})).unwrap(), "{}");
    assert_eq!(to_string(&Value::Record(Record::new())).unwrap(), "{}");
    assert_eq!(to_string_pretty(&value!({ "a": [] })).unwrap(), "{\n  \"a\": []\n}");
}

#[test]
fn test_mapping_keeps_iteration_order() {
    let mut map = ValueMap::new();
    map.insert("b".to_string(), Value::from(1));
    map.insert("a".to_string(), Value::from(2));
    map.insert("c".to_string(), value!([3]));
    assert_eq!(to_string(&map).unwrap(), r#"{"b":1,"a":2,"c":[3]}"#);
}

#[test]
fn test_enum_variants() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Event {
        Ping,
        Move { x: i32, y: i32 },
        Say(String),
        Pair(u8, u8),
    }

    assert_roundtrip(&vec![
        Event::Ping,
        Event::Move { x: 1, y: -2 },
        Event::Say("hi".to_string()),
        Event::Pair(1, 2),
    ]);
}

#[test]
fn test_dates_and_big_integers() {
    let when = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
    let big: BigInt = "123456789012345678901234567890".parse().unwrap();

    let value = Value::from(vec![Value::from(when), Value::from(big)]);
    assert_eq!(
        to_string(&value).unwrap(),
        r#"["2024-05-17T08:30:00Z","123456789012345678901234567890"]"#
    );
}

#[test]
fn test_non_finite_float_is_rejected() {
    let floats = Value::from(vec![Value::from(1.0), Value::from(f64::INFINITY)]);
    let err = to_string(&floats).unwrap_err();
    assert!(matches!(err, Error::UnsupportedValue(_)));
}

#[test]
fn test_extension_data_is_folded_flat() {
    let record = Record::new()
        .with_field("id", 1)
        .with_field("name", "widget")
        .with_extension(object(value!({ "color": "red", "dims": [1, 2] })));

    let json = to_string(&Value::from(record)).unwrap();
    assert_eq!(json, r#"{"id":1,"name":"widget","color":"red","dims":[1,2]}"#);
}

#[test]
fn test_extension_data_after_nested_member() {
    let record = Record::new()
        .with_field("inner", value!({ "x": 1 }))
        .with_extension(object(value!({ "extra": { "y": 2 } })));

    let json = to_string(&Value::from(record)).unwrap();
    assert_eq!(json, r#"{"inner":{"x":1},"extra":{"y":2}}"#);
}

#[test]
fn test_empty_extension_data() {
    let record = Record::new()
        .with_field("id", 1)
        .with_extension(ValueMap::new());
    assert_eq!(to_string(&Value::from(record)).unwrap(), r#"{"id":1}"#);
}

#[test]
fn test_extension_key_collision() {
    let record = Value::from(
        Record::new()
            .with_field("id", 1)
            .with_extension(object(value!({ "id": 2 }))),
    );

    assert_eq!(
        to_string(&record).unwrap_err(),
        Error::DuplicateKey("id".to_string())
    );

    let options = WriteOptions::new().with_extension_conflicts(ExtensionConflicts::Allow);
    let json = to_string_with_options(&record, options, WriterOptions::new()).unwrap();
    assert_eq!(json, r#"{"id":1,"id":2}"#);
}

#[test]
fn test_null_handling() {
    #[derive(Serialize)]
    struct Profile {
        name: String,
        email: Option<String>,
        tags: Vec<Option<u8>>,
        extra: ValueMap,
    }

    let mut extra = ValueMap::new();
    extra.insert("missing".to_string(), Value::Null);
    let profile = to_value(&Profile {
        name: "Ada".to_string(),
        email: None,
        tags: vec![Some(1), None],
        extra,
    })
    .unwrap();

    assert_eq!(
        to_string(&profile).unwrap(),
        r#"{"name":"Ada","email":null,"tags":[1,null],"extra":{"missing":null}}"#
    );

    // skipping applies to members only; elements and mapping entries keep their nulls
    let options = WriteOptions::new().with_null_handling(NullHandling::Skip);
    assert_eq!(
        to_string_with_options(&profile, options, WriterOptions::new()).unwrap(),
        r#"{"name":"Ada","tags":[1,null],"extra":{"missing":null}}"#
    );
}

#[test]
fn test_optional_field_skips_null_regardless_of_options() {
    let record = Value::from(
        Record::new()
            .with_field("a", Value::Null)
            .with_optional_field("b", Value::Null)
            .with_optional_field("c", 3),
    );
    assert_eq!(to_string(&record).unwrap(), r#"{"a":null,"c":3}"#);
}

#[test]
fn test_null_root() {
    assert_eq!(to_string(&Value::Null).unwrap(), "null");
}

#[test]
fn test_key_policy_applies_to_mapping_keys_only() {
    let record = Record::new()
        .with_field("FirstName", "Ada")
        .with_field("Settings", value!({ "DarkMode": true, "FontSize": { "BaseSize": 12 } }))
        .with_extension(object(value!({ "ExtraKey": 1 })));

    let options = WriteOptions::new().with_key_policy(KeyPolicy::camel_case());
    let json = to_string_with_options(&Value::from(record), options, WriterOptions::new()).unwrap();
    assert_eq!(
        json,
        r#"{"FirstName":"Ada","Settings":{"darkMode":true,"fontSize":{"baseSize":12}},"ExtraKey":1}"#
    );
}

#[test]
fn test_key_policy_runs_once_per_entry() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let policy = KeyPolicy::transform(move |key| {
        counter.fetch_add(1, Ordering::SeqCst);
        format!("{}!", key)
    });

    let map = value!({ "a": 1, "b": [2], "c": { "d": null } });
    let options = WriteOptions::new().with_key_policy(policy);
    let json = to_string_with_options(&map, options, WriterOptions::new()).unwrap();

    assert_eq!(json, r#"{"a!":1,"b!":[2],"c!":{"d!":null}}"#);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_key_policy_empty_key_is_configuration_error() {
    let options = WriteOptions::new().with_key_policy(KeyPolicy::transform(|_| String::new()));
    let err = to_string_with_options(&value!({ "a": 1 }), options, WriterOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_snake_case_policy() {
    let options = WriteOptions::new().with_key_policy(KeyPolicy::snake_case());
    let json =
        to_string_with_options(&value!({ "userName": "x" }), options, WriterOptions::new()).unwrap();
    assert_eq!(json, r#"{"user_name":"x"}"#);
}

#[test]
fn test_max_depth() {
    let nested = value!([[[[1]]]]);

    let shallow = WriteOptions::new().with_max_depth(Some(3));
    assert_eq!(
        to_string_with_options(&nested, shallow, WriterOptions::new()).unwrap_err(),
        Error::DepthExceeded { max: 3 }
    );

    let enough = WriteOptions::new().with_max_depth(Some(4));
    assert_eq!(
        to_string_with_options(&nested, enough, WriterOptions::new()).unwrap(),
        "[[[[1]]]]"
    );
}

#[test]
fn test_to_value_record_fields() {
    let value = to_value(&user()).unwrap();
    let record = value.as_record().unwrap();

    assert_eq!(record.get("id"), Some(&Value::Number(Number::Integer(123))));
    assert_eq!(record.get("name"), Some(&Value::String("Alice".to_string())));
    assert_eq!(record.get("active"), Some(&Value::Bool(true)));
    assert_eq!(
        record.get("tags").and_then(|tags| tags.as_array()).map(Vec::len),
        Some(2)
    );
}

#[test]
fn test_value_serialize_matches_engine_output() {
    let when = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
    let record = Record::new()
        .with_field("user", to_value(&user()).unwrap())
        .with_field("created", Value::Date(when))
        .with_field("stamps", Value::from(vec![Value::Date(when), Value::from(1.5)]));
    let value = Value::from(record);

    assert!(to_string(&value)
        .unwrap()
        .contains(r#""created":"2024-05-17T08:30:00Z""#));
    let via_engine: serde_json::Value = serde_json::from_str(&to_string(&value).unwrap()).unwrap();
    let via_serde = serde_json::to_value(&value).unwrap();
    assert_eq!(via_engine, via_serde);
}

#[test]
fn test_parse_back_into_value() {
    let json = to_string(&value!({ "a": [1, 2.5, "x", null, true] })).unwrap();
    let back: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(back, value!({ "a": [1, 2.5, "x", null, true] }));
}

mod descriptors {
    use serde_walk::{
        to_string, value, Describe, Entries, Entry, Error, Kind, Member, Node, Value, ValueMap,
    };
    use std::cell::Cell;

    /// Resolves to itself, so resolution never reaches a concrete shape.
    struct SelfResolving;

    impl Describe for SelfResolving {
        fn kind(&self) -> Kind {
            Kind::Unresolved
        }

        fn resolve(&self) -> Option<Node<'_>> {
            Some(self)
        }
    }

    /// Claims to be a leaf but has no payload.
    struct Hollow;

    impl Describe for Hollow {
        fn kind(&self) -> Kind {
            Kind::Leaf
        }
    }

    /// A mapping with no entry cursor.
    struct Opaque;

    impl Describe for Opaque {
        fn kind(&self) -> Kind {
            Kind::Mapping
        }
    }

    /// A mapping whose entries carry no keys.
    struct Keyless(Vec<i64>);

    impl Describe for Keyless {
        fn kind(&self) -> Kind {
            Kind::Mapping
        }

        fn entries(&self) -> Option<Entries<'_>> {
            Some(Box::new(
                self.0.iter().map(|n| Entry::element(Some(n as &dyn Describe))),
            ))
        }
    }

    /// A composite that counts how often its extension data is requested.
    struct Overflowing {
        id: i64,
        extra: ValueMap,
        lookups: Cell<usize>,
    }

    impl Describe for Overflowing {
        fn kind(&self) -> Kind {
            Kind::Composite
        }

        fn member_count(&self) -> usize {
            1
        }

        fn member(&self, index: usize) -> Option<Member<'_>> {
            (index == 0).then(|| Member::new("id", Some(&self.id as &dyn Describe)))
        }

        fn extension_data(&self) -> Option<Node<'_>> {
            self.lookups.set(self.lookups.get() + 1);
            Some(&self.extra as &dyn Describe)
        }
    }

    #[test]
    fn test_unresolved_chain_is_configuration_error() {
        let err = to_string(&SelfResolving).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{:?}", err);
    }

    #[test]
    fn test_leaf_without_scalar_is_configuration_error() {
        let err = to_string(&Hollow).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{:?}", err);
    }

    #[test]
    fn test_mapping_without_cursor_is_unsupported_shape() {
        let err = to_string(&Opaque).unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)), "{:?}", err);
    }

    #[test]
    fn test_keyless_mapping_entry_is_unsupported_shape() {
        let err = to_string(&Keyless(vec![1, 2])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedShape(_)), "{:?}", err);

        // an empty keyless mapping never reaches an entry
        assert_eq!(to_string(&Keyless(vec![])).unwrap(), "{}");
    }

    #[test]
    fn test_extension_data_is_requested_once_per_fold() {
        let mut extra = ValueMap::new();
        extra.insert("a".to_string(), Value::from(1));
        extra.insert("nested".to_string(), value!({ "b": [2, 3] }));
        extra.insert("c".to_string(), Value::from("x"));
        let composite = Overflowing {
            id: 7,
            extra,
            lookups: Cell::new(0),
        };

        assert_eq!(
            to_string(&composite).unwrap(),
            r#"{"id":7,"a":1,"nested":{"b":[2,3]},"c":"x"}"#
        );
        assert_eq!(composite.lookups.get(), 1);
    }
}

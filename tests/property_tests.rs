//! Property-based tests over generated value graphs.
//!
//! Generated floats stay in a moderate range so the parsed JSON compares
//! exactly; float formatting has its own unit tests.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_walk::{
    to_string, to_value, ContainerKind, Progress, Record, Session, Token, TokenRecorder, Value,
    ValueMap, WriteOptions,
};
use std::sync::Arc;

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        (0i64..4_000_000_000).prop_map(|secs| Value::Date(Utc.timestamp_opt(secs, 0).unwrap())),
        "[a-zA-Z0-9 \"\\\\\n\t]{0,12}".prop_map(Value::String),
    ]
}

/// Records get indexed field names (`f0`, `f1`, ...) and extension keys
/// starting with `x`, so the two never collide.
fn arb_record(inner: impl Strategy<Value = Value> + Clone) -> impl Strategy<Value = Value> {
    (
        prop::collection::vec((inner.clone(), any::<bool>()), 0..4),
        proptest::option::of(prop::collection::vec(("x[a-z]{0,4}", inner), 0..4)),
    )
        .prop_map(|(fields, extension)| {
            let mut record = Record::new();
            for (i, (value, optional)) in fields.into_iter().enumerate() {
                let name = format!("f{}", i);
                record = if optional {
                    record.with_optional_field(name, value)
                } else {
                    record.with_field(name, value)
                };
            }
            if let Some(entries) = extension {
                record = record.with_extension(entries.into_iter().collect::<ValueMap>());
            }
            Value::from(record)
        })
}

/// The same non-null value behind two clones of one `Arc`.
fn arb_shared_pair(inner: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    inner.prop_map(|value| {
        if value.is_null() {
            return Value::Array(vec![Value::Null, Value::Null]);
        }
        let shared = Arc::new(value);
        Value::Array(vec![Value::Shared(shared.clone()), Value::Shared(shared)])
    })
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,6}", inner.clone()), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<ValueMap>())),
            arb_record(inner.clone()),
            arb_shared_pair(inner),
        ]
    })
}

fn options() -> impl Strategy<Value = WriteOptions> {
    prop_oneof![
        Just(WriteOptions::new()),
        Just(WriteOptions::preserve_references()),
    ]
}

fn tokens(value: &Value, options: WriteOptions, sink: TokenRecorder) -> Vec<Token> {
    let mut sink = sink;
    let mut session = Session::new(Some(value), options);
    while session.resume(&mut sink).unwrap() == Progress::Suspended {}
    sink.into_tokens()
}

fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(
    value: &T,
) -> bool {
    let json = match to_value(value).and_then(|v| to_string(&v)) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Serialize failed: {}", e);
            return false;
        }
    };
    match serde_json::from_str::<T>(&json) {
        Ok(back) => *value == back,
        Err(e) => {
            eprintln!("Parse failed: {}", e);
            eprintln!("Serialized was: {}", json);
            false
        }
    }
}

proptest! {
    #[test]
    fn prop_output_is_valid_json(value in arb_value()) {
        let json = to_string(&value).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, serde_json::to_value(&value).unwrap());
    }

    #[test]
    fn prop_pausing_is_transparent(
        value in arb_value(),
        options in options(),
        every in 1usize..5,
    ) {
        let expected = tokens(&value, options.clone(), TokenRecorder::new());
        let paused = tokens(&value, options, TokenRecorder::pausing_every(every));
        prop_assert_eq!(paused, expected);
    }

    #[test]
    fn prop_containers_balance(value in arb_value(), options in options()) {
        let mut open = Vec::new();
        for token in tokens(&value, options, TokenRecorder::new()) {
            match token {
                Token::Open(kind, _) => open.push(kind),
                Token::Close(kind) => prop_assert_eq!(open.pop(), Some(kind)),
                _ => {}
            }
        }
        prop_assert!(open.is_empty());
    }

    #[test]
    fn prop_mappings_keep_key_order(keys in prop::collection::vec("[a-z]{1,8}", 0..10)) {
        let mut map = ValueMap::new();
        for (i, key) in keys.iter().enumerate() {
            map.insert(key.clone(), Value::from(i as i64));
        }
        let value = Value::Object(map.clone());

        let written: Vec<String> = tokens(&value, WriteOptions::new(), TokenRecorder::new())
            .into_iter()
            .filter_map(|token| match token {
                Token::Key(key) => Some(key),
                _ => None,
            })
            .collect();
        prop_assert_eq!(written, map.keys().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn prop_i64(n in any::<i64>()) {
        prop_assert!(roundtrip(&n));
    }

    #[test]
    fn prop_vec_string(v in prop::collection::vec(".{0,10}", 0..10)) {
        prop_assert!(roundtrip(&v));
    }

    #[test]
    fn prop_option_i32(opt in proptest::option::of(any::<i32>())) {
        prop_assert!(roundtrip(&opt));
    }

    #[test]
    fn prop_tuple_i32_bool(t in (any::<i32>(), any::<bool>())) {
        prop_assert!(roundtrip(&t));
    }
}

#[test]
fn test_collection_tokens() {
    let value = Value::from(vec![Value::from(1)]);
    assert_eq!(
        tokens(&value, WriteOptions::new(), TokenRecorder::new()),
        vec![
            Token::Open(ContainerKind::Collection, None),
            Token::Leaf(Value::from(1)),
            Token::Close(ContainerKind::Collection),
        ]
    );
}

//! Proptest strategies for resolver and ordering properties

use proptest::prelude::*;
use serde_json::{json, Value};

/// Field names valid inside a reference path
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,11}"
}

/// Scalars that never contain reference tokens
pub fn token_free_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(|b| json!(b)),
        "[a-zA-Z0-9 ,.:/_-]{0,16}".prop_map(Value::String),
        Just(Value::Null),
    ]
}

/// Arbitrary JSON documents without reference tokens
pub fn token_free_json_strategy() -> impl Strategy<Value = Value> {
    token_free_scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(field_name_strategy(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

/// A produced response body: an object of token-free scalars
pub fn response_body_strategy() -> impl Strategy<Value = serde_json::Map<String, Value>> {
    prop::collection::btree_map(field_name_strategy(), token_free_scalar_strategy(), 1..6)
        .prop_map(|fields| fields.into_iter().collect())
}

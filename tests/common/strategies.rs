use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for leaf values found inside a nested collection
pub fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!({ "n": n })),
        "[a-z]{1,8}".prop_map(|s| json!({ "s": s })),
        any::<i32>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(Value::Bool),
    ]
}

/// Strategy for the value a record holds under the shape key, or `None` when absent
pub fn slot_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        prop::collection::vec(leaf_strategy(), 0..5).prop_map(|items| Some(Value::Array(items))),
        leaf_strategy().prop_map(Some),
        Just(Some(Value::Null)),
        Just(None),
    ]
}

/// Strategy for a heterogeneous collection keyed at `items`, including `null` placeholders
pub fn mixed_collection_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        prop_oneof![
            4 => (any::<u32>(), slot_strategy()).prop_map(|(id, slot)| {
                let mut record = json!({ "id": id });
                if let Some(value) = slot {
                    record["items"] = value;
                }
                record
            }),
            1 => Just(Value::Null),
        ],
        0..12,
    )
}

//! Property-based test generators using proptest.

use driftbox_clock::{HybridLogicalClock, ReplicaId};
use driftbox_store::Document;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating replica identifiers.
pub fn replica_id_strategy() -> impl Strategy<Value = ReplicaId> {
    prop::string::string_regex("[a-z]{2,8}-[0-9]{1,3}")
        .expect("invalid regex")
        .prop_map(ReplicaId::new)
}

/// Strategy for generating clock readings.
pub fn clock_strategy() -> impl Strategy<Value = HybridLogicalClock> {
    (replica_id_strategy(), 0u64..2_000_000_000_000, 0u32..1_000)
        .prop_map(|(replica, wall_ms, counter)| HybridLogicalClock::at(replica, wall_ms, counter))
}

/// Strategy for generating scalar field values.
pub fn field_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        prop::string::string_regex("[a-zA-Z0-9 ]{0,16}")
            .expect("invalid regex")
            .prop_map(Value::from),
    ]
}

/// Strategy for generating flat documents with 1-5 fields.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(
        prop::string::string_regex("[a-z]{1,10}").expect("invalid regex"),
        field_value_strategy(),
        1..5,
    )
    .prop_map(|fields| fields.into_iter().collect())
}

//! Property tests for the structural-sharing invariants.

use graft_state::{produce, Value};
use proptest::prelude::*;

/// Arbitrary JSON-shaped trees: a few levels deep, mixed containers.
fn arb_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i32>().prop_map(|n| serde_json::json!(n)),
        "[a-z]{0,8}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// A mutator that changes nothing yields the base, by identity.
    #[test]
    fn noop_produce_is_identity(tree in arb_json()) {
        let base = Value::from(serde_json::json!({"root": tree}));
        let next = produce(&base, |_| Ok(())).unwrap();
        prop_assert!(next.identical(&base));
    }

    /// One write never costs any sibling subtree its identity.
    #[test]
    fn single_write_shares_all_siblings(tree in arb_json(), x in any::<i32>()) {
        let base = Value::from(serde_json::json!({"payload": tree, "slot": null}));
        let next = produce(&base, |d| d.set("slot", x as i64)).unwrap();

        prop_assert!(!next.identical(&base));
        prop_assert!(next["payload"].identical(&base["payload"]));
        prop_assert_eq!(next["slot"].as_i64(), Some(x as i64));
    }

    /// Writing back the exact current value copies nothing anywhere.
    #[test]
    fn rewriting_identical_value_is_identity(tree in arb_json()) {
        let base = Value::from(serde_json::json!({"root": tree}));
        let same = base["root"].clone();
        let next = produce(&base, |d| d.set("root", same.clone())).unwrap();
        prop_assert!(next.identical(&base));
    }

    /// The tree representation round-trips through serde_json.
    #[test]
    fn json_round_trip(tree in arb_json()) {
        let val = Value::from(tree.clone());
        prop_assert_eq!(serde_json::Value::from(&val), tree);
    }
}

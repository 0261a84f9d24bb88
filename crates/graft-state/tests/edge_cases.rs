//! Edge case tests: error surfaces, freeze behavior, and the eager copy
//! strategy. Toggle-dependent tests serialize through a local lock because
//! the toggles are process-wide.

use graft_state::{
    produce, set_auto_freeze, set_copy_on_read, GraftError, Key, Scion, Value,
};
use serde_json::json;
use std::sync::Mutex;

fn v(j: serde_json::Value) -> Value {
    Value::from(j)
}

static TOGGLES: Mutex<()> = Mutex::new(());

// ============================================================================
// Error surfaces
// ============================================================================

#[test]
fn test_produce_from_leaf_is_a_type_mismatch() {
    for leaf in [json!(null), json!(true), json!(3), json!("s")] {
        let err = produce(&v(leaf), |_| Ok(())).unwrap_err();
        assert!(matches!(err, GraftError::TypeMismatch { .. }));
    }
}

#[test]
fn test_index_key_on_object_is_invalid() {
    let base = v(json!({"a": 1}));
    let err = produce(&base, |draft| draft.set(0, 9)).unwrap_err();
    assert!(matches!(
        err,
        GraftError::InvalidKey {
            container: "object",
            key: Key::Index(0)
        }
    ));
}

#[test]
fn test_name_key_on_array_is_invalid() {
    let base = v(json!([1, 2]));
    let err = produce(&base, |draft| draft.get("a").map(|_| ())).unwrap_err();
    assert!(matches!(
        err,
        GraftError::InvalidKey {
            container: "array",
            ..
        }
    ));
}

#[test]
fn test_array_write_past_append_position_is_out_of_bounds() {
    let base = v(json!([1, 2]));
    let err = produce(&base, |draft| draft.set(3, 9)).unwrap_err();
    assert!(matches!(
        err,
        GraftError::IndexOutOfBounds { index: 3, len: 2 }
    ));

    // A failed write must not have promoted anything: a later no-op
    // produce still returns the base.
    let next = produce(&base, |_| Ok(())).unwrap();
    assert!(next.identical(&base));
}

#[test]
fn test_array_write_at_len_appends() {
    let base = v(json!([1, 2]));
    let next = produce(&base, |draft| draft.set(2, 3)).unwrap();
    assert_eq!(next, v(json!([1, 2, 3])));
}

#[test]
fn test_push_on_object_is_a_type_mismatch() {
    let base = v(json!({"a": 1}));
    let err = produce(&base, |draft| draft.push(2)).unwrap_err();
    assert!(matches!(
        err,
        GraftError::TypeMismatch {
            expected: "array",
            ..
        }
    ));
}

#[test]
fn test_child_on_leaf_is_a_type_mismatch() {
    let base = v(json!({"a": 1}));
    let err = produce(&base, |draft| draft.child("a").map(|_| ())).unwrap_err();
    assert!(matches!(
        err,
        GraftError::TypeMismatch {
            expected: "object or array",
            found: "number"
        }
    ));
}

#[test]
fn test_self_referential_draft_fails() {
    let base = v(json!({"a": 1}));
    let err = produce(&base, |draft| draft.set("own", draft)).unwrap_err();
    assert!(matches!(err, GraftError::ProtocolViolation { .. }));
}

#[test]
fn test_cyclic_draft_graph_fails() {
    let base = v(json!({"child": {"x": 1}}));
    let err = produce(&base, |draft| {
        let child = draft.child("child")?;
        child.set("back", draft)
    })
    .unwrap_err();
    assert!(matches!(err, GraftError::ProtocolViolation { .. }));
}

// ============================================================================
// Deletes
// ============================================================================

#[test]
fn test_delete_missing_key_still_promotes() {
    let base = v(json!({"x": 1}));
    let next = produce(&base, |draft| draft.delete("ghost")).unwrap();
    // Contents unchanged, but the node was promoted.
    assert_eq!(next, base);
    assert!(!next.identical(&base));
}

#[test]
fn test_delete_then_rewrite() {
    let base = v(json!({"x": 1}));
    let next = produce(&base, |draft| {
        draft.delete("x")?;
        assert!(!draft.has("x")?);
        draft.set("x", 2)
    })
    .unwrap();
    assert_eq!(next["x"], 2);
}

#[test]
fn test_delete_array_index_out_of_range_is_noop() {
    let base = v(json!([1, 2]));
    let next = produce(&base, |draft| draft.delete(9)).unwrap();
    assert_eq!(next, v(json!([1, 2])));
}

// ============================================================================
// Numbers and identity
// ============================================================================

#[test]
fn test_nan_write_is_suppressed() {
    let base = produce(&v(json!({"x": 0})), |d| d.set("x", f64::NAN)).unwrap();
    assert!(base["x"].as_f64().unwrap().is_nan());

    let next = produce(&base, |d| d.set("x", f64::NAN)).unwrap();
    assert!(next.identical(&base));
}

#[test]
fn test_signed_zero_write_is_a_real_change() {
    let base = produce(&v(json!({"x": 0})), |d| d.set("x", 0.0f64)).unwrap();
    let next = produce(&base, |d| d.set("x", -0.0f64)).unwrap();
    assert!(!next.identical(&base));
    assert!(next["x"].as_f64().unwrap().is_sign_negative());
}

#[test]
fn test_integral_float_rewrite_is_suppressed() {
    let base = v(json!({"x": 1}));
    let next = produce(&base, |d| d.set("x", 1.0f64)).unwrap();
    assert!(next.identical(&base));
}

// ============================================================================
// Freeze behavior (toggle-locked)
// ============================================================================

fn all_frozen(value: &Value) -> bool {
    match value {
        Value::Array(a) => value.is_frozen() && a.items().iter().all(all_frozen),
        Value::Object(o) => value.is_frozen() && o.iter().all(|(_, child)| all_frozen(child)),
        _ => true,
    }
}

#[test]
fn test_auto_freeze_freezes_whole_result() {
    let _guard = TOGGLES.lock().unwrap();
    set_auto_freeze(true);

    let base = v(json!({"kept": {"a": 1}, "edited": {"b": 2}}));
    let next = produce(&base, |draft| {
        draft.child("edited")?.set("b", 3)?;
        draft.set("fresh", json!({"nested": [1, {"deep": true}]}))
    })
    .unwrap();

    assert!(all_frozen(&next));
    // Freshly constructed containers are frozen too.
    assert!(next["fresh"]["nested"][1].is_frozen());
}

#[test]
fn test_produce_works_from_a_frozen_result() {
    let _guard = TOGGLES.lock().unwrap();
    set_auto_freeze(true);

    let first = produce(&v(json!({"n": 1})), |d| d.set("n", 2)).unwrap();
    assert!(first.is_frozen());

    let second = produce(&first, |d| d.set("n", 3)).unwrap();
    assert_eq!(second["n"], 3);
    assert_eq!(first["n"], 2);
}

#[test]
fn test_auto_freeze_disabled_leaves_results_unfrozen() {
    let _guard = TOGGLES.lock().unwrap();
    set_auto_freeze(false);

    let base = v(json!({"a": {"b": 1}}));
    let next = produce(&base, |draft| draft.child("a")?.set("b", 2)).unwrap();
    assert!(!next.is_frozen());
    assert!(!next["a"].is_frozen());

    set_auto_freeze(true);
}

#[test]
fn test_freeze_helper_respects_toggle() {
    let _guard = TOGGLES.lock().unwrap();

    set_auto_freeze(false);
    let val = v(json!({"a": 1}));
    val.freeze();
    assert!(!val.is_frozen());

    set_auto_freeze(true);
    val.freeze();
    assert!(val.is_frozen());
}

// ============================================================================
// Eager copy strategy (toggle-locked)
// ============================================================================

#[test]
fn test_copy_on_read_keeps_noop_identity() {
    let _guard = TOGGLES.lock().unwrap();
    set_copy_on_read(true);

    let base = v(json!({"a": {"deep": {"x": 1}}}));
    let next = produce(&base, |draft| {
        // Reads stage shallow copies eagerly, but promotion stays
        // write-driven.
        let deep = draft.child("a")?.child("deep")?;
        assert_eq!(deep.get("x")?.value().unwrap(), 1i64);
        Ok(())
    })
    .unwrap();
    assert!(next.identical(&base));

    set_copy_on_read(false);
}

#[test]
fn test_copy_on_read_produces_same_results() {
    let _guard = TOGGLES.lock().unwrap();
    set_copy_on_read(true);

    let base = v(json!({"a": 1, "b": {"c": 2}, "d": [1, 2]}));
    let next = produce(&base, |draft| {
        draft.child("b")?.set("c", 3)?;
        draft.child("d")?.push(3)
    })
    .unwrap();

    assert_eq!(next, v(json!({"a": 1, "b": {"c": 3}, "d": [1, 2, 3]})));
    assert!(!next["b"].identical(&base["b"]));

    set_copy_on_read(false);
}

#[test]
fn test_copy_on_read_suppresses_idempotent_writes() {
    let _guard = TOGGLES.lock().unwrap();
    set_copy_on_read(true);

    let base = v(json!({"a": 1}));
    let next = produce(&base, |draft| draft.set("a", 1)).unwrap();
    assert!(next.identical(&base));

    set_copy_on_read(false);
}

// ============================================================================
// Scion building
// ============================================================================

#[test]
fn test_scion_array_of_drafts() {
    let base = v(json!({"a": {"id": 1}, "b": {"id": 2}}));
    let next = produce(&base, |draft| {
        let a = draft.child("a")?;
        let b = draft.child("b")?;
        draft.set("pair", Scion::array(vec![Scion::from(a), Scion::from(b)]))
    })
    .unwrap();

    assert_eq!(next["pair"][0]["id"], 1);
    assert_eq!(next["pair"][1]["id"], 2);
    assert!(next["pair"][0].identical(&next["a"]));
}

#[test]
fn test_deeply_nested_fresh_containers() {
    let base = v(json!({"x": {"v": 1}}));
    let next = produce(&base, |draft| {
        let x = draft.child("x")?;
        x.set("v", 2)?;
        draft.set(
            "outer",
            Scion::object(vec![(
                "mid".to_owned(),
                Scion::array(vec![Scion::from(x)]),
            )]),
        )
    })
    .unwrap();

    assert_eq!(next["outer"]["mid"][0]["v"], 2);
    assert!(next["outer"]["mid"][0].identical(&next["x"]));
}

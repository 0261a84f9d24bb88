//! The finalize pass: converting a tree of drafts back into plain values.
//!
//! Untouched nodes resolve straight to their base, so never-modified
//! subtrees cost nothing regardless of size. Modified nodes rebuild from
//! their working copy, reusing every slot that still holds settled data and
//! recursing only through child drafts. Outputs are cached per node so a
//! draft reachable through several slots resolves to one allocation.

use crate::node::{Finalized, NodeId, Shadow, Slot};
use crate::session::{Planted, SessionCore};
use crate::{GraftError, GraftResult, Value};
use indexmap::IndexMap;

/// Resolve a drafted node to its plain value.
pub(crate) fn finalize_node(session: &mut SessionCore, id: NodeId) -> GraftResult<Value> {
    {
        let node = session.node(id);
        if !node.modified {
            // Nothing under this node was touched; the base is the result.
            return Ok(node.base.clone());
        }
        match &node.finalized {
            Finalized::Done(v) => return Ok(v.clone()),
            Finalized::InProgress => {
                return Err(GraftError::protocol_violation(
                    "draft graph contains a cycle",
                ));
            }
            Finalized::No => {}
        }
    }

    session.node_mut(id).finalized = Finalized::InProgress;
    let shadow = session.node_mut(id).copy.take().ok_or_else(|| {
        GraftError::protocol_violation("modified draft node has no working copy")
    })?;

    let out = match shadow {
        Shadow::Object(entries) => {
            let mut map = IndexMap::with_capacity(entries.len());
            for (key, slot) in entries {
                let value = resolve_slot(session, slot)?;
                map.insert(key, value);
            }
            Value::from(map)
        }
        Shadow::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for slot in items {
                values.push(resolve_slot(session, slot)?);
            }
            Value::from(values)
        }
    };

    session.node_mut(id).finalized = Finalized::Done(out.clone());
    Ok(out)
}

fn resolve_slot(session: &mut SessionCore, slot: Slot) -> GraftResult<Value> {
    match slot {
        // Settled data: shared as-is, no recursion needed — a plain value
        // cannot contain drafts.
        Slot::Value(v) => Ok(v),
        Slot::Draft(child) => finalize_node(session, child),
    }
}

/// Resolve a replacement value the mutator returned, including any drafts
/// embedded inside freshly built containers.
pub(crate) fn finalize_planted(session: &mut SessionCore, planted: Planted) -> GraftResult<Value> {
    match planted {
        Planted::Value(v) => Ok(v),
        Planted::Node(id) => finalize_node(session, id),
        Planted::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(finalize_planted(session, item)?);
            }
            Ok(Value::from(values))
        }
        Planted::Object(pairs) => {
            let mut map = IndexMap::with_capacity(pairs.len());
            for (key, item) in pairs {
                let value = finalize_planted(session, item)?;
                map.insert(key, value);
            }
            Ok(Value::from(map))
        }
    }
}

/// Freeze a tree bottom-up, pruning at containers already frozen by an
/// earlier produce call — frozen data cannot contain anything unsettled.
pub(crate) fn deep_freeze(value: &Value) {
    match value {
        Value::Array(a) => {
            if a.is_frozen() {
                return;
            }
            for item in a.items() {
                deep_freeze(item);
            }
            a.mark_frozen();
        }
        Value::Object(o) => {
            if o.is_frozen() {
                return;
            }
            for (_, child) in o.iter() {
                deep_freeze(child);
            }
            o.mark_frozen();
        }
        _ => {}
    }
}

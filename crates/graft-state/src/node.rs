//! Per-node bookkeeping for drafted containers.
//!
//! Every container a session wraps gets exactly one `NodeState`, allocated
//! in the session arena and addressed by index. The record tracks the
//! original value, the shallow working copy once the node is touched, the
//! lazily created child drafts, and the flags driving promotion and
//! finalization.

use crate::{Key, Value};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Index of a node inside its session arena.
pub(crate) type NodeId = usize;

/// One entry of a working copy: settled data, or a child draft by id.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    Value(Value),
    Draft(NodeId),
}

/// Shallow working copy of a container, mirroring its kind.
#[derive(Clone, Debug)]
pub(crate) enum Shadow {
    Object(IndexMap<String, Slot>),
    Array(Vec<Slot>),
}

impl Shadow {
    /// Shallow-duplicate a container, splicing already-created child drafts
    /// into their slots so in-flight handles stay live after promotion.
    pub fn of(base: &Value, children: &HashMap<Key, NodeId>) -> Shadow {
        match base {
            Value::Object(o) => Shadow::Object(
                o.iter()
                    .map(|(k, v)| {
                        let slot = match children.get(&Key::Name(k.clone())) {
                            Some(id) => Slot::Draft(*id),
                            None => Slot::Value(v.clone()),
                        };
                        (k.clone(), slot)
                    })
                    .collect(),
            ),
            Value::Array(a) => Shadow::Array(
                a.items()
                    .iter()
                    .enumerate()
                    .map(|(i, v)| match children.get(&Key::Index(i)) {
                        Some(id) => Slot::Draft(*id),
                        None => Slot::Value(v.clone()),
                    })
                    .collect(),
            ),
            // Draft nodes wrap containers only; enforced at wrap time.
            _ => Shadow::Object(IndexMap::new()),
        }
    }

    /// Look up a slot. Mismatched key kinds read as absent.
    pub fn get(&self, key: &Key) -> Option<&Slot> {
        match (self, key) {
            (Shadow::Object(entries), Key::Name(k)) => entries.get(k),
            (Shadow::Array(items), Key::Index(i)) => items.get(*i),
            _ => None,
        }
    }

    /// Store a slot. Array indexes must be within `0..=len`; index == len
    /// appends. Callers validate bounds and key kind beforehand.
    pub fn put(&mut self, key: &Key, slot: Slot) {
        match (self, key) {
            (Shadow::Object(entries), Key::Name(k)) => {
                entries.insert(k.clone(), slot);
            }
            (Shadow::Array(items), Key::Index(i)) => {
                if *i == items.len() {
                    items.push(slot);
                } else {
                    items[*i] = slot;
                }
            }
            _ => {}
        }
    }

    /// Remove an entry if present. Array removals shift later items left.
    pub fn remove(&mut self, key: &Key) {
        match (self, key) {
            (Shadow::Object(entries), Key::Name(k)) => {
                entries.shift_remove(k);
            }
            (Shadow::Array(items), Key::Index(i)) => {
                if *i < items.len() {
                    items.remove(*i);
                }
            }
            _ => {}
        }
    }

    /// Whether the effective view contains the key.
    pub fn contains(&self, key: &Key) -> bool {
        match (self, key) {
            (Shadow::Object(entries), Key::Name(k)) => entries.contains_key(k),
            (Shadow::Array(items), Key::Index(i)) => *i < items.len(),
            _ => false,
        }
    }

    /// Keys of the effective view, in container order.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Shadow::Object(entries) => entries.keys().map(|k| Key::Name(k.clone())).collect(),
            Shadow::Array(items) => (0..items.len()).map(Key::Index).collect(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Shadow::Object(entries) => entries.len(),
            Shadow::Array(items) => items.len(),
        }
    }
}

/// Finalization progress of a node.
///
/// `Done` caches the node's output so every alias of the node resolves to
/// the same allocation. `InProgress` catches cyclic draft references, which
/// the value tree cannot represent.
#[derive(Clone, Debug, Default)]
pub(crate) enum Finalized {
    #[default]
    No,
    InProgress,
    Done(Value),
}

/// Per-node state record. Owned by the session arena; `parent` is a plain
/// back-index used only to propagate modification upward.
#[derive(Debug)]
pub(crate) struct NodeState {
    /// The original container this node wraps. Never mutated.
    pub base: Value,
    /// Shallow working copy. Present once modified; pre-staged (still
    /// unmodified) under the copy-on-read strategy.
    pub copy: Option<Shadow>,
    /// Lazily created child drafts, used only while no copy exists.
    pub children: HashMap<Key, NodeId>,
    /// Monotonic: flips to true on the first real write at or below this
    /// node, never resets.
    pub modified: bool,
    /// Finalization progress and output cache.
    pub finalized: Finalized,
    /// Enclosing node, if any.
    pub parent: Option<NodeId>,
}

impl NodeState {
    pub fn new(parent: Option<NodeId>, base: Value) -> Self {
        Self {
            base,
            copy: None,
            children: HashMap::new(),
            modified: false,
            finalized: Finalized::No,
            parent,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.base, Value::Array(_))
    }

    pub fn container_kind(&self) -> &'static str {
        if self.is_array() {
            "array"
        } else {
            "object"
        }
    }

    /// Read from the original container.
    pub fn base_get(&self, key: &Key) -> Option<&Value> {
        match (&self.base, key) {
            (Value::Object(o), Key::Name(k)) => o.get(k),
            (Value::Array(a), Key::Index(i)) => a.get(*i),
            _ => None,
        }
    }

    /// Whether the original container has the key.
    pub fn base_has(&self, key: &Key) -> bool {
        self.base_get(key).is_some()
    }

    /// Length of the original container.
    pub fn base_len(&self) -> usize {
        match &self.base {
            Value::Object(o) => o.len(),
            Value::Array(a) => a.len(),
            _ => 0,
        }
    }

    /// Keys of the original container, in container order.
    pub fn base_keys(&self) -> Vec<Key> {
        match &self.base {
            Value::Object(o) => o.iter().map(|(k, _)| Key::Name(k.clone())).collect(),
            Value::Array(a) => (0..a.len()).map(Key::Index).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    #[test]
    fn test_shadow_splices_children() {
        let base = v(json!({"a": 1, "b": {"x": 2}}));
        let mut children = HashMap::new();
        children.insert(Key::name("b"), 7);

        let shadow = Shadow::of(&base, &children);
        assert!(matches!(shadow.get(&Key::name("a")), Some(Slot::Value(_))));
        assert!(matches!(shadow.get(&Key::name("b")), Some(Slot::Draft(7))));
    }

    #[test]
    fn test_shadow_array_put_appends_at_len() {
        let base = v(json!([1, 2]));
        let mut shadow = Shadow::of(&base, &HashMap::new());
        shadow.put(&Key::index(2), Slot::Value(v(json!(3))));
        assert_eq!(shadow.len(), 3);
        shadow.put(&Key::index(0), Slot::Value(v(json!(9))));
        assert_eq!(shadow.len(), 3);
    }

    #[test]
    fn test_shadow_remove_shifts() {
        let base = v(json!([1, 2, 3]));
        let mut shadow = Shadow::of(&base, &HashMap::new());
        shadow.remove(&Key::index(1));
        assert_eq!(shadow.len(), 2);
        assert_eq!(shadow.keys(), vec![Key::index(0), Key::index(1)]);
    }

    #[test]
    fn test_shadow_object_key_order() {
        let base = v(json!({"z": 1, "a": 2}));
        let shadow = Shadow::of(&base, &HashMap::new());
        assert_eq!(shadow.keys(), vec![Key::name("z"), Key::name("a")]);
    }

    #[test]
    fn test_node_base_access() {
        let node = NodeState::new(None, v(json!({"k": 5})));
        assert!(!node.is_array());
        assert_eq!(node.container_kind(), "object");
        assert!(node.base_has(&Key::name("k")));
        assert!(!node.base_has(&Key::name("q")));
        assert_eq!(node.base_len(), 1);
    }
}

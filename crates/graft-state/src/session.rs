//! Session core and the produce orchestrators.
//!
//! A session is the scope of one produce call: it owns the arena of node
//! state records, the configuration snapshot taken at session start, and the
//! revocation flag that invalidates every handle once the call returns.

use crate::config::Settings;
use crate::draft::{plant, Draft, Scion};
use crate::error::value_type_name;
use crate::finalize::{deep_freeze, finalize_node, finalize_planted};
use crate::node::{NodeId, NodeState, Shadow, Slot};
use crate::{GraftError, GraftResult, Key, Value};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Session-internal form of a [`Scion`]: embedded drafts are resolved to
/// arena ids, so no locking is needed while the tree is walked.
#[derive(Debug)]
pub(crate) enum Planted {
    Value(Value),
    Node(NodeId),
    Array(Vec<Planted>),
    Object(Vec<(String, Planted)>),
}

/// What a session read yields before the caller re-wraps child ids into
/// public handles.
pub(crate) enum ReadOut {
    Leaf(Value),
    Child(NodeId),
}

/// Lock a session core, surfacing poisoning as an error instead of a panic.
pub(crate) fn lock(core: &Arc<Mutex<SessionCore>>) -> GraftResult<MutexGuard<'_, SessionCore>> {
    core.lock()
        .map_err(|_| GraftError::protocol_violation("draft session lock poisoned"))
}

/// The state shared by every draft handle of one produce call.
#[derive(Debug)]
pub(crate) struct SessionCore {
    nodes: Vec<NodeState>,
    settings: Settings,
    revoked: bool,
}

impl SessionCore {
    pub fn new(settings: Settings) -> Self {
        Self {
            nodes: Vec::new(),
            settings,
            revoked: false,
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Fail if the owning produce call has already returned.
    pub fn ensure_live(&self) -> GraftResult<()> {
        if self.revoked {
            Err(GraftError::StaleDraft)
        } else {
            Ok(())
        }
    }

    /// End the session: every retained handle becomes stale and the arena
    /// is dropped wholesale.
    pub fn revoke(&mut self) {
        self.revoked = true;
        self.nodes.clear();
    }

    pub fn node(&self, id: NodeId) -> &NodeState {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeState {
        &mut self.nodes[id]
    }

    pub fn is_modified(&self, id: NodeId) -> bool {
        self.node(id).modified
    }

    /// Allocate a node for a container. Under the copy-on-read strategy the
    /// shallow copy is staged immediately; promotion stays write-driven.
    pub fn wrap(&mut self, parent: Option<NodeId>, base: Value) -> NodeId {
        let mut node = NodeState::new(parent, base);
        if self.settings.copy_on_read {
            node.copy = Some(Shadow::of(&node.base, &node.children));
        }
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Allocate a node for a container the mutator built from scratch.
    /// Born modified: there is no base to fall back to.
    fn wrap_fresh(&mut self, parent: NodeId, base: Value) -> NodeId {
        let mut node = NodeState::new(Some(parent), base);
        node.modified = true;
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    fn check_key_kind(&self, id: NodeId, key: &Key) -> GraftResult<()> {
        let node = self.node(id);
        match (node.is_array(), key) {
            (true, Key::Name(_)) | (false, Key::Index(_)) => {
                Err(GraftError::invalid_key(node.container_kind(), key.clone()))
            }
            _ => Ok(()),
        }
    }

    /// The child draft already cached for a key, wherever it lives.
    fn cached_child(&self, id: NodeId, key: &Key) -> Option<NodeId> {
        let node = self.node(id);
        match &node.copy {
            Some(copy) => match copy.get(key) {
                Some(Slot::Draft(child)) => Some(*child),
                _ => None,
            },
            None => node.children.get(key).copied(),
        }
    }

    /// Read one entry of a node's effective view.
    ///
    /// Draftable children are wrapped on first access and cached — in the
    /// child-draft map while the node has no working copy, or directly in
    /// the copy's slot afterwards, which keeps never-touched nested
    /// containers uncopied even after the parent promoted.
    pub fn read(&mut self, id: NodeId, key: &Key) -> GraftResult<ReadOut> {
        self.check_key_kind(id, key)?;

        if self.node(id).copy.is_some() {
            let slot = self
                .node(id)
                .copy
                .as_ref()
                .and_then(|copy| copy.get(key))
                .cloned();
            return Ok(match slot {
                None => ReadOut::Leaf(Value::Null),
                Some(Slot::Draft(child)) => ReadOut::Child(child),
                Some(Slot::Value(v)) => {
                    if v.is_draftable() {
                        let child = self.wrap(Some(id), v);
                        if let Some(copy) = self.node_mut(id).copy.as_mut() {
                            copy.put(key, Slot::Draft(child));
                        }
                        ReadOut::Child(child)
                    } else {
                        ReadOut::Leaf(v)
                    }
                }
            });
        }

        if let Some(child) = self.node(id).children.get(key).copied() {
            return Ok(ReadOut::Child(child));
        }
        match self.node(id).base_get(key).cloned() {
            None => Ok(ReadOut::Leaf(Value::Null)),
            Some(v) if v.is_draftable() => {
                let child = self.wrap(Some(id), v);
                self.node_mut(id).children.insert(key.clone(), child);
                Ok(ReadOut::Child(child))
            }
            Some(v) => Ok(ReadOut::Leaf(v)),
        }
    }

    /// Promote a node and every ancestor to their working copies.
    ///
    /// Promotion is eager and monotonic: once a node is modified the whole
    /// parent chain is too, and already-created child drafts are spliced
    /// into the copy so in-flight handles stay live.
    fn mark_changed(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(i) = current {
            let node = self.node_mut(i);
            if node.modified {
                break;
            }
            node.modified = true;
            if node.copy.is_none() {
                node.copy = Some(Shadow::of(&node.base, &node.children));
            }
            current = node.parent;
        }
    }

    /// Write one entry.
    pub fn write(&mut self, id: NodeId, key: &Key, planted: Planted) -> GraftResult<()> {
        self.check_key_kind(id, key)?;

        // Bounds are checked before anything promotes, so a failed write
        // leaves the tree untouched.
        if let Key::Index(i) = key {
            let len = self.len(id);
            if *i > len {
                return Err(GraftError::index_out_of_bounds(*i, len));
            }
        }

        if !self.node(id).modified {
            let suppressed = match &planted {
                Planted::Value(v) => self
                    .node(id)
                    .base_get(key)
                    .is_some_and(|current| current.identical(v)),
                Planted::Node(child) => self.cached_child(id, key) == Some(*child),
                _ => false,
            };
            if suppressed {
                return Ok(());
            }
            self.mark_changed(id);
        }

        let slot = self.slot_of(id, planted);
        if let Some(copy) = self.node_mut(id).copy.as_mut() {
            copy.put(key, slot);
        }
        Ok(())
    }

    /// Remove one entry: promote unconditionally, then remove if present.
    pub fn delete(&mut self, id: NodeId, key: &Key) -> GraftResult<()> {
        self.check_key_kind(id, key)?;
        if !self.node(id).modified {
            self.mark_changed(id);
        }
        if let Some(copy) = self.node_mut(id).copy.as_mut() {
            copy.remove(key);
        }
        Ok(())
    }

    /// Append to an array node.
    pub fn push(&mut self, id: NodeId, planted: Planted) -> GraftResult<()> {
        if !self.node(id).is_array() {
            return Err(GraftError::type_mismatch("array", "object"));
        }
        let len = self.len(id);
        self.write(id, &Key::Index(len), planted)
    }

    /// Existence check against the effective view.
    pub fn has(&self, id: NodeId, key: &Key) -> GraftResult<bool> {
        self.check_key_kind(id, key)?;
        let node = self.node(id);
        Ok(match &node.copy {
            Some(copy) => copy.contains(key),
            None => node.base_has(key),
        })
    }

    /// Keys of the effective view, in container order.
    pub fn keys(&self, id: NodeId) -> Vec<Key> {
        let node = self.node(id);
        match &node.copy {
            Some(copy) => copy.keys(),
            None => node.base_keys(),
        }
    }

    /// Length of the effective view.
    pub fn len(&self, id: NodeId) -> usize {
        let node = self.node(id);
        match &node.copy {
            Some(copy) => copy.len(),
            None => node.base_len(),
        }
    }

    pub fn is_array(&self, id: NodeId) -> bool {
        self.node(id).is_array()
    }

    /// Convert a planted value into a copy slot under `parent`.
    ///
    /// Freshly built containers become born-modified nodes, so drafts they
    /// embed at any depth resolve through the ordinary finalize path.
    fn slot_of(&mut self, parent: NodeId, planted: Planted) -> Slot {
        match planted {
            Planted::Value(v) => Slot::Value(v),
            Planted::Node(id) => Slot::Draft(id),
            Planted::Array(items) => {
                let id = self.wrap_fresh(parent, Value::array());
                let slots: Vec<Slot> = items
                    .into_iter()
                    .map(|item| self.slot_of(id, item))
                    .collect();
                self.node_mut(id).copy = Some(Shadow::Array(slots));
                Slot::Draft(id)
            }
            Planted::Object(pairs) => {
                let id = self.wrap_fresh(parent, Value::object());
                let entries: IndexMap<String, Slot> = pairs
                    .into_iter()
                    .map(|(k, item)| {
                        let slot = self.slot_of(id, item);
                        (k, slot)
                    })
                    .collect();
                self.node_mut(id).copy = Some(Shadow::Object(entries));
                Slot::Draft(id)
            }
        }
    }
}

/// Run a mutator against a draft of `base` and produce the next tree.
///
/// The mutator edits the draft in place; structural sharing guarantees that
/// the result reuses every untouched subtree of `base`, and a mutator that
/// changes nothing yields a result identical to `base`.
///
/// # Examples
///
/// ```
/// use graft_state::{produce, Value};
/// use serde_json::json;
///
/// let base = Value::from(json!({"a": 1, "b": {"c": 2}}));
/// let next = produce(&base, |draft| {
///     draft.child("b")?.set("c", 3)
/// }).unwrap();
///
/// assert_eq!(next["b"]["c"], 3);
/// assert_eq!(base["b"]["c"], 2);
/// assert!(next["a"].identical(&base["a"]));
/// ```
pub fn produce<F>(base: &Value, mutator: F) -> GraftResult<Value>
where
    F: FnOnce(&Draft) -> GraftResult<()>,
{
    produce_with(base, |draft| {
        mutator(draft)?;
        Ok(None)
    })
}

/// Like [`produce`], but the mutator may return a replacement value instead
/// of (not in addition to) editing the draft.
///
/// Returning `None` — or the root draft itself — means "use the draft".
/// Returning a replacement after modifying the draft fails with
/// [`GraftError::ConflictingMutation`].
pub fn produce_with<F>(base: &Value, mutator: F) -> GraftResult<Value>
where
    F: FnOnce(&Draft) -> GraftResult<Option<Scion>>,
{
    if !base.is_draftable() {
        return Err(GraftError::type_mismatch(
            "object or array",
            value_type_name(base),
        ));
    }

    let core = Arc::new(Mutex::new(SessionCore::new(Settings::capture())));
    let root_id = lock(&core)?.wrap(None, base.clone());
    let root = Draft::new(Arc::clone(&core), root_id);

    let outcome = run_session(&core, &root, mutator);

    // Invalidate every handle the mutator may have kept, error or not.
    if let Ok(mut guard) = core.lock() {
        guard.revoke();
    }
    outcome
}

fn run_session<F>(
    core: &Arc<Mutex<SessionCore>>,
    root: &Draft,
    mutator: F,
) -> GraftResult<Value>
where
    F: FnOnce(&Draft) -> GraftResult<Option<Scion>>,
{
    let returned = mutator(root)?;

    // Returning the root draft is the same as returning nothing.
    let replacement = match returned {
        None => None,
        Some(Scion::Draft(ref d)) if d.is_same(root) => None,
        Some(other) => Some(plant(core, other)?),
    };

    let mut session = lock(core)?;
    let result = match replacement {
        None => finalize_node(&mut session, root.node_id())?,
        Some(planted) => {
            if session.is_modified(root.node_id()) {
                return Err(GraftError::ConflictingMutation);
            }
            finalize_planted(&mut session, planted)?
        }
    };

    if session.settings().auto_freeze {
        deep_freeze(&result);
    }
    Ok(result)
}

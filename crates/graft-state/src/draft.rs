//! Draft handles: the objects a mutator reads and writes.
//!
//! A `Draft` is a cheap, cloneable handle onto one drafted container inside
//! a produce call. Reads hand back leaf values verbatim and child containers
//! as further drafts; writes promote the copy-on-write chain up to the root.

use crate::error::value_type_name;
use crate::node::NodeId;
use crate::session::{lock, Planted, ReadOut, SessionCore};
use crate::{GraftError, GraftResult, Key, Value};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Handle onto a drafted container.
///
/// All handles created during one produce call share that call's session;
/// once the call returns they are stale and every operation fails with
/// [`GraftError::StaleDraft`].
#[derive(Clone)]
pub struct Draft {
    core: Arc<Mutex<SessionCore>>,
    node: NodeId,
}

impl Draft {
    pub(crate) fn new(core: Arc<Mutex<SessionCore>>, node: NodeId) -> Self {
        Self { core, node }
    }

    pub(crate) fn node_id(&self) -> NodeId {
        self.node
    }

    /// Whether two handles refer to the same node of the same session.
    pub(crate) fn is_same(&self, other: &Draft) -> bool {
        self.node == other.node && Arc::ptr_eq(&self.core, &other.core)
    }

    fn session(&self) -> GraftResult<std::sync::MutexGuard<'_, SessionCore>> {
        let guard = lock(&self.core)?;
        guard.ensure_live()?;
        Ok(guard)
    }

    /// Read one entry.
    ///
    /// Leaves come back as [`Entry::Value`] (missing keys read as `Null`);
    /// draftable children come back as [`Entry::Draft`]. Reading the same
    /// untouched child twice returns a handle to the same underlying node,
    /// so identity comparisons behave like they would on the original tree.
    pub fn get(&self, key: impl Into<Key>) -> GraftResult<Entry> {
        let key = key.into();
        let mut session = self.session()?;
        match session.read(self.node, &key)? {
            ReadOut::Leaf(v) => Ok(Entry::Value(v)),
            ReadOut::Child(id) => Ok(Entry::Draft(Draft::new(Arc::clone(&self.core), id))),
        }
    }

    /// Read one entry, requiring a draftable child.
    ///
    /// Fails with `TypeMismatch` if the entry is a leaf (or absent).
    pub fn child(&self, key: impl Into<Key>) -> GraftResult<Draft> {
        match self.get(key)? {
            Entry::Draft(d) => Ok(d),
            Entry::Value(v) => Err(GraftError::type_mismatch(
                "object or array",
                value_type_name(&v),
            )),
        }
    }

    /// Write one entry.
    ///
    /// Writing a value identical to the current base value of an untouched
    /// node is a successful no-op: nothing is copied anywhere. Otherwise the
    /// node and all its ancestors promote to their working copies and the
    /// entry is stored. Array indexes from `0..=len` are accepted; index ==
    /// len appends.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Scion>) -> GraftResult<()> {
        let key = key.into();
        let planted = plant(&self.core, value.into())?;
        let mut session = self.session()?;
        session.write(self.node, &key, planted)
    }

    /// Remove one entry.
    ///
    /// Always promotes, then removes the entry if present. Array removals
    /// shift later items left.
    pub fn delete(&self, key: impl Into<Key>) -> GraftResult<()> {
        let key = key.into();
        let mut session = self.session()?;
        session.delete(self.node, &key)
    }

    /// Whether the effective view contains the key.
    pub fn has(&self, key: impl Into<Key>) -> GraftResult<bool> {
        let key = key.into();
        let session = self.session()?;
        session.has(self.node, &key)
    }

    /// Keys of the effective view, in container order: record keys in
    /// insertion order, array indexes in order.
    pub fn keys(&self) -> GraftResult<Vec<Key>> {
        let session = self.session()?;
        Ok(session.keys(self.node))
    }

    /// Number of entries in the effective view.
    pub fn len(&self) -> GraftResult<usize> {
        let session = self.session()?;
        Ok(session.len(self.node))
    }

    /// Whether the effective view is empty.
    pub fn is_empty(&self) -> GraftResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Append to an array draft. Equivalent to `set(len, value)`.
    pub fn push(&self, value: impl Into<Scion>) -> GraftResult<()> {
        let planted = plant(&self.core, value.into())?;
        let mut session = self.session()?;
        session.push(self.node, planted)
    }

    /// Whether this draft wraps an array.
    pub fn is_array(&self) -> GraftResult<bool> {
        let session = self.session()?;
        Ok(session.is_array(self.node))
    }

    /// Whether this draft wraps a record.
    pub fn is_object(&self) -> GraftResult<bool> {
        Ok(!self.is_array()?)
    }
}

impl fmt::Debug for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draft").field("node", &self.node).finish()
    }
}

/// What a read yields: a leaf value or a child draft.
#[derive(Debug)]
pub enum Entry {
    /// A leaf value, returned verbatim (missing keys read as `Null`).
    Value(Value),
    /// A handle onto a draftable child.
    Draft(Draft),
}

impl Entry {
    /// Whether this entry is a child draft.
    #[inline]
    pub fn is_draft(&self) -> bool {
        matches!(self, Entry::Draft(_))
    }

    /// Get the leaf value, if this is one.
    #[inline]
    pub fn value(self) -> Option<Value> {
        match self {
            Entry::Value(v) => Some(v),
            Entry::Draft(_) => None,
        }
    }

    /// Get the child draft, if this is one.
    #[inline]
    pub fn draft(self) -> Option<Draft> {
        match self {
            Entry::Draft(d) => Some(d),
            Entry::Value(_) => None,
        }
    }
}

/// A value being grafted into a draft.
///
/// Plain data arrives as [`Scion::Value`]. The other variants let a mutator
/// re-attach drafts it is holding — directly, or embedded at arbitrary depth
/// inside freshly built containers. The finalize pass resolves embedded
/// drafts wherever they ended up.
#[derive(Debug)]
pub enum Scion {
    /// Plain data; contains no drafts by construction.
    Value(Value),
    /// An existing draft of the same produce call.
    Draft(Draft),
    /// A freshly built array that may embed drafts.
    Array(Vec<Scion>),
    /// A freshly built record that may embed drafts.
    Object(Vec<(String, Scion)>),
}

impl Scion {
    /// Build a fresh array scion.
    pub fn array(items: impl IntoIterator<Item = Scion>) -> Self {
        Scion::Array(items.into_iter().collect())
    }

    /// Build a fresh record scion.
    pub fn object(pairs: impl IntoIterator<Item = (String, Scion)>) -> Self {
        Scion::Object(pairs.into_iter().collect())
    }
}

impl From<Value> for Scion {
    fn from(v: Value) -> Self {
        Scion::Value(v)
    }
}

impl From<Draft> for Scion {
    fn from(d: Draft) -> Self {
        Scion::Draft(d)
    }
}

impl From<&Draft> for Scion {
    fn from(d: &Draft) -> Self {
        Scion::Draft(d.clone())
    }
}

impl From<Entry> for Scion {
    fn from(e: Entry) -> Self {
        match e {
            Entry::Value(v) => Scion::Value(v),
            Entry::Draft(d) => Scion::Draft(d),
        }
    }
}

impl From<serde_json::Value> for Scion {
    fn from(v: serde_json::Value) -> Self {
        Scion::Value(Value::from(v))
    }
}

impl From<bool> for Scion {
    fn from(v: bool) -> Self {
        Scion::Value(Value::from(v))
    }
}

impl From<i64> for Scion {
    fn from(v: i64) -> Self {
        Scion::Value(Value::from(v))
    }
}

impl From<i32> for Scion {
    fn from(v: i32) -> Self {
        Scion::Value(Value::from(v))
    }
}

impl From<f64> for Scion {
    fn from(v: f64) -> Self {
        Scion::Value(Value::from(v))
    }
}

impl From<&str> for Scion {
    fn from(v: &str) -> Self {
        Scion::Value(Value::from(v))
    }
}

impl From<String> for Scion {
    fn from(v: String) -> Self {
        Scion::Value(Value::from(v))
    }
}

/// Convert a scion into its session-internal form, validating that every
/// embedded draft belongs to the given session.
pub(crate) fn plant(core: &Arc<Mutex<SessionCore>>, scion: Scion) -> GraftResult<Planted> {
    match scion {
        Scion::Value(v) => Ok(Planted::Value(v)),
        Scion::Draft(d) => {
            if !Arc::ptr_eq(core, &d.core) {
                return Err(GraftError::protocol_violation(
                    "draft belongs to a different produce call",
                ));
            }
            Ok(Planted::Node(d.node))
        }
        Scion::Array(items) => Ok(Planted::Array(
            items
                .into_iter()
                .map(|s| plant(core, s))
                .collect::<GraftResult<_>>()?,
        )),
        Scion::Object(pairs) => Ok(Planted::Object(
            pairs
                .into_iter()
                .map(|(k, s)| plant(core, s).map(|p| (k, p)))
                .collect::<GraftResult<_>>()?,
        )),
    }
}

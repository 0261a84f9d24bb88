//! Immutable value trees with reference-counted structural sharing.
//!
//! `Value` is the tree type every produce call consumes and yields.
//! Containers are shared through `Arc`, so cloning a value is cheap and
//! untouched subtrees of a produced tree are the exact same allocations as
//! in the base tree.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A numeric leaf value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
}

impl Number {
    /// Convert to f64.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Get the integer value, if this is an integer.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Float(_) => None,
        }
    }

    /// Check if this is an integer.
    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    /// Identity equality: bitwise for floats, so NaN is identical to NaN
    /// and `+0.0` is distinct from `-0.0`. Mixed int/float compares
    /// identical only when both lossless round-trips agree.
    #[inline]
    pub(crate) fn same(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Number::Int(i), Number::Float(f)) | (Number::Float(f), Number::Int(i)) => {
                (*i as f64).to_bits() == f.to_bits() && *f as i64 == *i
            }
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(v as i64)
    }
}

impl From<u32> for Number {
    fn from(v: u32) -> Self {
        Number::Int(v as i64)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

impl From<f32> for Number {
    fn from(v: f32) -> Self {
        Number::Float(v as f64)
    }
}

/// An array container.
///
/// The `frozen` flag is monotonic: it is set at most once, by the finalize
/// pass or the [`Value::freeze`] helper, and never cleared.
#[derive(Default)]
pub struct Array {
    items: Vec<Value>,
    frozen: AtomicBool,
}

impl Array {
    /// Create an unfrozen array from its items.
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            frozen: AtomicBool::new(false),
        }
    }

    pub(crate) fn new_frozen(items: Vec<Value>, frozen: bool) -> Self {
        Self {
            items,
            frozen: AtomicBool::new(frozen),
        }
    }

    /// The items in order.
    #[inline]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    #[inline]
    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn mark_frozen(&self) {
        self.frozen.store(true, Ordering::Relaxed);
    }
}

impl Clone for Array {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            frozen: AtomicBool::new(self.is_frozen()),
        }
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.items.fmt(f)
    }
}

/// A record container with insertion-ordered keys.
///
/// Key order is part of the contract: enumeration, shallow copies, and
/// produced trees all preserve it.
#[derive(Default)]
pub struct Object {
    entries: IndexMap<String, Value>,
    frozen: AtomicBool,
}

impl Object {
    /// Create an unfrozen record from its entries.
    pub fn new(entries: IndexMap<String, Value>) -> Self {
        Self {
            entries,
            frozen: AtomicBool::new(false),
        }
    }

    pub(crate) fn new_frozen(entries: IndexMap<String, Value>, frozen: bool) -> Self {
        Self {
            entries,
            frozen: AtomicBool::new(frozen),
        }
    }

    /// The entries in insertion order.
    #[inline]
    pub fn entries(&self) -> &IndexMap<String, Value> {
        &self.entries
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether the record contains a key.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    #[inline]
    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn mark_frozen(&self) {
        self.frozen.store(true, Ordering::Relaxed);
    }
}

impl Clone for Object {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            frozen: AtomicBool::new(self.is_frozen()),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// An immutable tree of records, arrays, and leaf values.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (integer or float).
    Number(Number),
    /// String.
    String(String),
    /// Array, shared by reference.
    Array(Arc<Array>),
    /// Record, shared by reference.
    Object(Arc<Object>),
}

impl Value {
    /// Create an empty record.
    pub fn object() -> Self {
        Value::Object(Arc::new(Object::default()))
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Arc::new(Array::default()))
    }

    /// True only for containers a draft can wrap: arrays and records.
    /// Every other variant is an opaque leaf that reads return verbatim.
    #[inline]
    pub fn is_draftable(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Whether this is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the boolean, if this is one.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer, if this is an integer number.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Get the numeric value as f64, if this is a number.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Get the string, if this is one.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the array cell, if this is an array.
    #[inline]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get the record cell, if this is a record.
    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get a record entry by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Get an array item by index.
    #[inline]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Identity equality: the change-detection rule.
    ///
    /// Containers compare by pointer (`Arc::ptr_eq`); leaves compare by
    /// strict per-variant equality, with NaN identical to NaN and `+0.0`
    /// distinct from `-0.0`. Never structural for containers — two
    /// separately built but equal arrays are not identical.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.same(b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Shallow-copy a container: a new unfrozen cell with the same entries
    /// in the same order, children shared by reference. Leaves clone.
    pub fn shallow_copy(&self) -> Value {
        match self {
            Value::Array(a) => Value::Array(Arc::new(Array::new(a.items.clone()))),
            Value::Object(o) => Value::Object(Arc::new(Object::new(o.entries.clone()))),
            leaf => leaf.clone(),
        }
    }

    /// Shallow-freeze a container, preventing nothing at the type level but
    /// marking it as settled data for later produce calls. Idempotent, and
    /// a no-op while [`auto_freeze`](crate::auto_freeze) is disabled.
    /// Leaves are inherently frozen.
    pub fn freeze(&self) -> &Value {
        if crate::auto_freeze() {
            match self {
                Value::Array(a) => a.mark_frozen(),
                Value::Object(o) => o.mark_frozen(),
                _ => {}
            }
        }
        self
    }

    /// Whether this value is frozen. Leaves always are.
    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Array(a) => a.is_frozen(),
            Value::Object(o) => o.is_frozen(),
            _ => true,
        }
    }
}

// ===== Leaf conversions =====

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Number::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(Number::Int(v as i64))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(Number::Int(v as i64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(Array::new(items)))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Object(Arc::new(Object::new(entries)))
    }
}

// ===== serde_json interop =====

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::Int(i))
                } else {
                    Value::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::from(items.into_iter().map(Value::from).collect::<Vec<_>>())
            }
            serde_json::Value::Object(map) => Value::from(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<IndexMap<_, _>>(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(Number::Int(i)) => serde_json::Value::Number((*i).into()),
            Value::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(a) => {
                serde_json::Value::Array(a.items().iter().map(serde_json::Value::from).collect())
            }
            Value::Object(o) => serde_json::Value::Object(
                o.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        serde_json::Value::from(&v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Value::from(serde_json::Value::deserialize(deserializer)?))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::from(self))
    }
}

// ===== Index sugar =====

static NULL: Value = Value::Null;

impl std::ops::Index<&str> for Value {
    type Output = Value;

    /// Record entry lookup; missing keys and non-records yield `Null`.
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl std::ops::Index<usize> for Value {
    type Output = Value;

    /// Array item lookup; out-of-bounds indexes and non-arrays yield `Null`.
    fn index(&self, index: usize) -> &Value {
        self.get_index(index).unwrap_or(&NULL)
    }
}

// ===== Scalar comparisons for assertions =====

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Value::Number(Number::Float(f)) if f == other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

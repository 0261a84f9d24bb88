//! Error types for graft-state operations.

use crate::{Key, Value};
use thiserror::Error;

/// Result type alias for graft-state operations.
pub type GraftResult<T> = Result<T, GraftError>;

/// Errors that can occur while drafting or producing.
#[derive(Debug, Error)]
pub enum GraftError {
    /// A draft was used in a way the protocol forbids, or an internal
    /// consistency check failed.
    #[error("draft protocol violation: {message}")]
    ProtocolViolation {
        /// Description of what went wrong.
        message: String,
    },

    /// The mutator modified its draft and also returned a replacement value.
    #[error("a producer returned a new value and also modified its draft; either return a new value or modify the draft")]
    ConflictingMutation,

    /// A draft handle was used after its produce call completed.
    #[error("draft used after its produce call completed")]
    StaleDraft,

    /// A value had the wrong kind for the requested operation.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The expected kind.
        expected: &'static str,
        /// The actual kind found.
        found: &'static str,
    },

    /// A key addressed the wrong kind of container.
    #[error("invalid key for {container} draft: {key}")]
    InvalidKey {
        /// The container kind the draft wraps.
        container: &'static str,
        /// The offending key.
        key: Key,
    },

    /// Array index beyond the append position.
    #[error("index {index} out of bounds (len: {len})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The actual length of the array.
        len: usize,
    },
}

impl GraftError {
    /// Create a protocol violation error.
    #[inline]
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        GraftError::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        GraftError::TypeMismatch { expected, found }
    }

    /// Create an invalid key error.
    #[inline]
    pub fn invalid_key(container: &'static str, key: Key) -> Self {
        GraftError::InvalidKey { container, key }
    }

    /// Create an index out of bounds error.
    #[inline]
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        GraftError::IndexOutOfBounds { index, len }
    }
}

/// Get the kind name of a value.
#[inline]
pub fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Key segments for addressing one step into a record or array.
//!
//! A draft navigates its tree one hop at a time; each hop is either a record
//! key or an array index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single addressing step into a container.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Record key access: `{"key": value}`
    Name(String),
    /// Array index access: `[index]`
    Index(usize),
}

impl Key {
    /// Create a record key.
    #[inline]
    pub fn name(k: impl Into<String>) -> Self {
        Key::Name(k.into())
    }

    /// Create an array index.
    #[inline]
    pub fn index(i: usize) -> Self {
        Key::Index(i)
    }

    /// Returns true if this is a record key.
    #[inline]
    pub fn is_name(&self) -> bool {
        matches!(self, Key::Name(_))
    }

    /// Returns true if this is an array index.
    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }

    /// Get the record key if this is one.
    #[inline]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(k) => Some(k),
            Key::Index(_) => None,
        }
    }

    /// Get the index if this is one.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Name(_) => None,
            Key::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(k) => write!(f, ".{}", k),
            Key::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_owned())
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Name(s.clone())
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from("users"), Key::Name("users".into()));
        assert_eq!(Key::from(3usize), Key::Index(3));
        assert_eq!(Key::name("a"), Key::Name("a".into()));
    }

    #[test]
    fn test_key_accessors() {
        let k = Key::name("title");
        assert!(k.is_name());
        assert_eq!(k.as_name(), Some("title"));
        assert_eq!(k.as_index(), None);

        let i = Key::index(7);
        assert!(i.is_index());
        assert_eq!(i.as_index(), Some(7));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(format!("{}", Key::name("users")), ".users");
        assert_eq!(format!("{}", Key::index(0)), "[0]");
    }
}

//! Draft-based copy-on-write engine for immutable value trees.
//!
//! `graft-state` turns "describe the change with ordinary reads and writes"
//! into minimally-copied immutable updates: run a mutator against a draft of
//! a base tree, and get back a new tree that shares every untouched subtree
//! with the original.
//!
//! # Core Concepts
//!
//! - **Value**: the immutable tree type; containers are `Arc`-shared, so
//!   clones are cheap and structural sharing is observable
//! - **Draft**: the handle a mutator reads and writes; child containers come
//!   back as further drafts, created lazily on first access
//! - **produce**: the orchestrator — wrap the base, run the mutator,
//!   finalize the touched branches, invalidate every handle
//! - **Scion**: what a write accepts — plain data, an existing draft, or a
//!   freshly built container embedding drafts at any depth
//!
//! # Structural Sharing
//!
//! ```text
//! next = produce(base, mutator)
//! ```
//!
//! - A mutator that changes nothing yields `next` identical to `base`
//! - A write at one leaf copies only the spine from the root to that leaf;
//!   every sibling subtree is the same allocation as in `base`
//! - Writing a value identical to the current one copies nothing at all
//!
//! # Quick Start
//!
//! ```
//! use graft_state::{produce, Value};
//! use serde_json::json;
//!
//! let base = Value::from(json!({
//!     "title": "shopping",
//!     "items": [{"name": "milk", "done": false}],
//! }));
//!
//! let next = produce(&base, |draft| {
//!     draft.child("items")?.child(0)?.set("done", true)?;
//!     draft.set("title", "shopping (1/1)")
//! }).unwrap();
//!
//! assert_eq!(next["items"][0]["done"], true);
//! // The original is untouched.
//! assert_eq!(base["items"][0]["done"], false);
//! ```
//!
//! # Replacement Values
//!
//! A mutator may instead return a whole replacement for the base — but not
//! both modify the draft and return one:
//!
//! ```
//! use graft_state::{produce_with, Value};
//! use serde_json::json;
//!
//! let base = Value::from(json!({"anything": 1}));
//! let next = produce_with(&base, |_draft| {
//!     Ok(Some(json!({"reset": true}).into()))
//! }).unwrap();
//! assert_eq!(next["reset"], true);
//! ```

mod config;
mod draft;
mod error;
mod finalize;
mod key;
mod node;
mod session;
mod value;

pub use config::{auto_freeze, copy_on_read, set_auto_freeze, set_copy_on_read};
pub use draft::{Draft, Entry, Scion};
pub use error::{value_type_name, GraftError, GraftResult};
pub use key::Key;
pub use session::{produce, produce_with};
pub use value::{Array, Number, Object, Value};

//! Process-wide behavior toggles.
//!
//! Both toggles are read once when a produce call starts; flipping them
//! mid-session does not affect a running call.

use std::sync::atomic::{AtomicBool, Ordering};

static AUTO_FREEZE: AtomicBool = AtomicBool::new(true);
static COPY_ON_READ: AtomicBool = AtomicBool::new(false);

/// Enable or disable automatic freezing of produced trees.
///
/// When enabled (the default), every container a produce call materializes
/// is frozen, protecting against accidental in-place modification of results.
/// Disabling this skips the freeze pass entirely.
pub fn set_auto_freeze(enabled: bool) {
    AUTO_FREEZE.store(enabled, Ordering::Relaxed);
}

/// Whether automatic freezing is currently enabled.
pub fn auto_freeze() -> bool {
    AUTO_FREEZE.load(Ordering::Relaxed)
}

/// Enable or disable the eager copy strategy.
///
/// When disabled (the default), child drafts defer their shallow copy until
/// the first real write. When enabled, wrapping a node stages its shallow
/// copy immediately; promotion still happens only on a real write, so an
/// untouched draft finalizes back to its base either way.
pub fn set_copy_on_read(enabled: bool) {
    COPY_ON_READ.store(enabled, Ordering::Relaxed);
}

/// Whether the eager copy strategy is currently enabled.
pub fn copy_on_read() -> bool {
    COPY_ON_READ.load(Ordering::Relaxed)
}

/// Configuration snapshot taken at session start.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Settings {
    pub auto_freeze: bool,
    pub copy_on_read: bool,
}

impl Settings {
    /// Capture the current process-wide toggles.
    pub fn capture() -> Self {
        Self {
            auto_freeze: auto_freeze(),
            copy_on_read: copy_on_read(),
        }
    }
}

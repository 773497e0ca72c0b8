//! Single-shot guard for the logout prompt.

use std::sync::atomic::{AtomicBool, Ordering};

/// At most one holder at a time. `begin` is a check-and-set; `end` releases.
#[derive(Debug, Default)]
pub struct PromptGuard {
    active: AtomicBool,
}

impl PromptGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard. Returns `false` if a prompt is already active.
    pub fn begin(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

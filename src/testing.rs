//! Shared test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::session::{InvalidationNotice, LogoutPrompt};

/// Prompt that records each notice and blocks until `release` is called.
pub(crate) struct GatedPrompt {
    shown: AtomicUsize,
    notices: Mutex<Vec<InvalidationNotice>>,
    gate: Notify,
}

impl GatedPrompt {
    pub(crate) fn new() -> Self {
        Self {
            shown: AtomicUsize::new(0),
            notices: Mutex::new(Vec::new()),
            gate: Notify::new(),
        }
    }

    pub(crate) fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }

    pub(crate) fn notices(&self) -> Vec<InvalidationNotice> {
        self.notices.lock().unwrap().clone()
    }

    /// Acknowledge the current (or next) prompt.
    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl LogoutPrompt for GatedPrompt {
    async fn acknowledge(&self, notice: &InvalidationNotice) {
        self.shown.fetch_add(1, Ordering::SeqCst);
        self.notices.lock().unwrap().push(notice.clone());
        self.gate.notified().await;
    }
}

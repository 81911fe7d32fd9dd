//! Load admission gate.
//!
//! Rapid re-renders and navigation churn can ask for the same document
//! many times a second. The gate coalesces repeat loads: if a pass for
//! the same identifier completed within the cooldown window and no edit
//! has happened since, the caller reuses the last result instead of
//! re-running the source fan-out. The cooldown resets whenever the
//! identifier changes.

use std::time::{Duration, Instant};

use genkou_types::DocumentId;
use parking_lot::Mutex;
use tracing::debug;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Run the full reconciliation pass.
    Allowed,
    /// Reuse the last result; a fresh pass just completed.
    Coalesced,
}

#[derive(Debug, Default)]
struct GateInner {
    last_id: Option<DocumentId>,
    completed_at: Option<Instant>,
    /// Set when an edit occurs; the next load must re-run regardless of
    /// the cooldown.
    dirty: bool,
}

/// Per-session guard coalescing repeat loads of the active document.
#[derive(Debug)]
pub struct LoadGate {
    cooldown: Duration,
    inner: Mutex<GateInner>,
}

impl LoadGate {
    /// Gate with the given cooldown window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            inner: Mutex::new(GateInner::default()),
        }
    }

    /// Decide whether a load for `id` should run or reuse the last result.
    pub fn admit(&self, id: &DocumentId) -> Admission {
        let mut inner = self.inner.lock();
        if inner.last_id.as_ref() != Some(id) {
            // Identifier changed: cooldown state belongs to the old
            // document and is discarded.
            *inner = GateInner::default();
            return Admission::Allowed;
        }
        if inner.dirty {
            return Admission::Allowed;
        }
        match inner.completed_at {
            Some(at) if at.elapsed() < self.cooldown => {
                debug!(%id, "load coalesced within cooldown window");
                Admission::Coalesced
            }
            _ => Admission::Allowed,
        }
    }

    /// Record a completed pass for `id`.
    pub fn record(&self, id: &DocumentId) {
        let mut inner = self.inner.lock();
        inner.last_id = Some(id.clone());
        inner.completed_at = Some(Instant::now());
        inner.dirty = false;
    }

    /// Note that an edit occurred; the next load must not be coalesced.
    pub fn invalidate(&self) {
        self.inner.lock().dirty = true;
    }
}

//! The reconciliation engine.
//!
//! Given the candidates from one fan-out, pick which (if any) becomes the
//! active content, materialize it into the live document model, and write
//! the winner back into the volatile cache so it carries volatile
//! priority for the rest of the session.
//!
//! The decision itself is [`should_apply`], a pure function kept apart
//! from the I/O-bound fetch and the mutating apply step. The policy it
//! encodes: content already known locally (volatile or durable) always
//! preempts whatever is active, because the most recent local edit is
//! trusted over a possibly-stale remote copy; remote content only applies
//! when nothing of higher rank is active, or as a refresh when remote is
//! already the active source.
//!
//! Per-pass state machine: `Idle -> Loading -> Applied | Failed -> Idle`.

use std::sync::Arc;

use genkou_types::{ContentSnapshot, DocumentId, Fingerprint, Source};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::hash;
use crate::model::DocumentModel;
use crate::reader::CandidateSet;
use crate::volatile::VolatileCache;

/// Where the engine is within a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Applied,
    Failed,
}

/// The currently-active document content.
#[derive(Debug, Clone)]
pub struct ActiveContent {
    pub id: DocumentId,
    pub snapshot: ContentSnapshot,
}

/// Engine bookkeeping for the active document.
///
/// Mutated only by the reconciliation engine (on a load win) and the save
/// coordinator (on save success, which forces the volatile source). Reset
/// when a different document loads or on explicit invalidation.
#[derive(Debug, Default)]
pub struct EngineState {
    pub active: Option<ActiveContent>,
    pub active_source: Option<Source>,
    pub last_fingerprint: Option<Fingerprint>,
    pub phase: LoadPhase,
}

impl EngineState {
    /// Rank of the active source; 0 when nothing is active, so any
    /// source outranks it.
    pub fn active_rank(&self) -> u8 {
        self.active_source.map(Source::rank).unwrap_or(0)
    }

    /// Tear down all bookkeeping.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Engine state shared between the reconcile and save paths.
pub type SharedEngineState = Arc<Mutex<EngineState>>;

/// Pure priority decision: should a candidate from `candidate_source`
/// replace the content from `active_source`?
///
/// Volatile and durable candidates always apply — any locally-known edit
/// state preempts the active content. A remote candidate applies only if
/// it outranks the active source, or refreshes an already-remote active
/// state.
pub fn should_apply(candidate_source: Source, active_source: Option<Source>) -> bool {
    match candidate_source {
        Source::Volatile | Source::Durable => true,
        Source::Remote => {
            let active_rank = active_source.map(Source::rank).unwrap_or(0);
            Source::Remote.rank() > active_rank || active_source == Some(Source::Remote)
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The active snapshot after the pass (empty when nothing ever won).
    pub snapshot: ContentSnapshot,
    /// Provenance of the active snapshot.
    pub source: Option<Source>,
    /// Whether this pass changed the live document model.
    pub updated: bool,
}

/// Applies the priority policy and materializes winners.
pub struct ReconciliationEngine {
    state: SharedEngineState,
    volatile: Arc<VolatileCache>,
    model: Arc<dyn DocumentModel>,
}

impl ReconciliationEngine {
    pub fn new(
        state: SharedEngineState,
        volatile: Arc<VolatileCache>,
        model: Arc<dyn DocumentModel>,
    ) -> Self {
        Self {
            state,
            volatile,
            model,
        }
    }

    /// Run one reconciliation pass over a candidate set.
    ///
    /// Candidates are considered highest-priority-first; the first one
    /// that passes [`should_apply`] and materializes cleanly wins, and
    /// nothing of lower priority is applied afterwards. Per-candidate
    /// failures (including materialize failures) downgrade that candidate
    /// and fall through to the next source, so a corrupt cache entry can
    /// never block the remote fallback.
    ///
    /// `cancel` is checked immediately before the materialize step: a
    /// stale pass for a previously-active document must never overwrite a
    /// model now showing a different one.
    pub fn reconcile(
        &self,
        id: &DocumentId,
        candidates: CandidateSet,
        cancel: &CancellationToken,
    ) -> ReconcileOutcome {
        // A pass cancelled before it starts must not even reset state:
        // the bookkeeping now belongs to the newer document.
        if cancel.is_cancelled() {
            debug!(%id, "pass cancelled before start");
            return self.previous_outcome();
        }

        {
            let mut state = self.state.lock();
            if state.active.as_ref().is_some_and(|a| a.id != *id) {
                debug!(%id, "active document changed; resetting engine state");
                state.reset();
            }
            state.phase = LoadPhase::Loading;
        }

        for candidate in candidates.into_descending_priority() {
            if let Some(error) = &candidate.error {
                debug!(%id, source = %candidate.source, %error, "skipping candidate");
                continue;
            }
            let Some(snapshot) = candidate.snapshot else {
                continue;
            };

            let apply = {
                let state = self.state.lock();
                should_apply(candidate.source, state.active_source)
            };
            if !apply {
                debug!(%id, source = %candidate.source, "candidate does not outrank active state");
                continue;
            }

            if cancel.is_cancelled() {
                debug!(%id, "pass cancelled before materialize; leaving model untouched");
                self.state.lock().phase = LoadPhase::Idle;
                return self.previous_outcome();
            }

            match self.model.replace_all(snapshot.clone()) {
                Ok(()) => {
                    // The winner becomes the volatile-priority truth for
                    // subsequent passes this session.
                    self.volatile.set(id, snapshot.clone());

                    let fingerprint = hash::fingerprint(&self.model.serialize(&snapshot));
                    let mut state = self.state.lock();
                    state.active = Some(ActiveContent {
                        id: id.clone(),
                        snapshot: snapshot.clone(),
                    });
                    state.active_source = Some(candidate.source);
                    state.last_fingerprint = Some(fingerprint);
                    state.phase = LoadPhase::Applied;

                    info!(%id, source = %candidate.source, blocks = snapshot.block_count(), "content applied");
                    return ReconcileOutcome {
                        snapshot,
                        source: Some(candidate.source),
                        updated: true,
                    };
                }
                Err(e) => {
                    // Downgraded to an error; fall through to the next source.
                    warn!(%id, source = %candidate.source, error = %e, "materialize failed; trying next source");
                    continue;
                }
            }
        }

        let mut state = self.state.lock();
        state.phase = if state.active.is_some() {
            LoadPhase::Applied
        } else {
            LoadPhase::Failed
        };
        drop(state);
        debug!(%id, "no candidate won; previous state unchanged");
        self.previous_outcome()
    }

    /// The active content as an outcome, with `updated: false`.
    pub fn previous_outcome(&self) -> ReconcileOutcome {
        let state = self.state.lock();
        ReconcileOutcome {
            snapshot: state
                .active
                .as_ref()
                .map(|a| a.snapshot.clone())
                .unwrap_or_default(),
            source: state.active_source,
            updated: false,
        }
    }

    /// Explicitly tear down the active-content bookkeeping.
    pub fn invalidate(&self) {
        self.state.lock().reset();
    }

    /// Current pass phase, for diagnostics.
    pub fn phase(&self) -> LoadPhase {
        self.state.lock().phase
    }
}

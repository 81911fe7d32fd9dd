//! Editor session facade.
//!
//! [`EditorSession`] is the surface the UI layer talks to: load content,
//! save content, report cache statistics. Internally it owns the whole
//! pipeline — gate, reader, engine, coordinator — and enforces the
//! concurrency rules: one reconciliation or save in flight per document
//! (queued behind a per-identifier lock, never racing), debounced saves
//! after edit quiescence, and cancellation of stale passes when the
//! active document changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use genkou_types::{CacheStats, ContentSnapshot, DocumentId, Source};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::durable::DurableCache;
use crate::error::SaveError;
use crate::gate::{Admission, LoadGate};
use crate::model::DocumentModel;
use crate::reader::SourceReader;
use crate::reconcile::{ReconciliationEngine, SharedEngineState};
use crate::remote::RemoteStore;
use crate::save::{SaveCoordinator, SaveOutcome};
use crate::volatile::VolatileCache;

/// Result of a `load_content` call.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// The active snapshot after the load.
    pub snapshot: ContentSnapshot,
    /// Provenance of the active snapshot.
    pub source: Option<Source>,
    /// Whether this call changed the live document model.
    pub updated: bool,
    /// Whether the call was coalesced with a recently-completed pass.
    pub coalesced: bool,
}

#[derive(Debug)]
struct ActiveLoad {
    id: Option<DocumentId>,
    cancel: CancellationToken,
}

#[derive(Debug)]
struct PendingSave {
    id: DocumentId,
    snapshot: ContentSnapshot,
}

/// One editing session: the UI-facing entry point to the engine.
pub struct EditorSession {
    config: EngineConfig,
    volatile: Arc<VolatileCache>,
    durable: Arc<dyn DurableCache>,
    reader: SourceReader,
    engine: ReconciliationEngine,
    saver: SaveCoordinator,
    gate: LoadGate,
    /// Per-identifier operation locks: reconcile and save for the same
    /// document are mutually exclusive and queue here.
    locks: DashMap<DocumentId, Arc<tokio::sync::Mutex<()>>>,
    active: Mutex<ActiveLoad>,
    /// The newest unsaved edit, if a debounced save is pending.
    pending: Mutex<Option<PendingSave>>,
    /// Bumped on every edit; a debounce timer only fires if no newer
    /// edit has superseded it.
    edit_generation: AtomicU64,
}

impl EditorSession {
    /// Assemble a session from its injected collaborators.
    pub fn new(
        config: EngineConfig,
        durable: Arc<dyn DurableCache>,
        remote: Arc<dyn RemoteStore>,
        model: Arc<dyn DocumentModel>,
    ) -> Self {
        let state = SharedEngineState::default();
        let volatile = Arc::new(VolatileCache::new());
        let reader = SourceReader::new(
            volatile.clone(),
            durable.clone(),
            remote.clone(),
            model.clone(),
        );
        let engine = ReconciliationEngine::new(state.clone(), volatile.clone(), model.clone());
        let saver = SaveCoordinator::new(
            state,
            volatile.clone(),
            durable.clone(),
            remote,
            model,
        );
        let gate = LoadGate::new(config.load_cooldown());
        Self {
            config,
            volatile,
            durable,
            reader,
            engine,
            saver,
            gate,
            locks: DashMap::new(),
            active: Mutex::new(ActiveLoad {
                id: None,
                cancel: CancellationToken::new(),
            }),
            pending: Mutex::new(None),
            edit_generation: AtomicU64::new(0),
        }
    }

    fn lock_for(&self, id: &DocumentId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Load (or refresh) a document into the live model.
    ///
    /// Idempotent and cheap to call repeatedly: loads within the cooldown
    /// window reuse the last result. Per-source failures degrade — the
    /// caller always gets *something*, at worst an empty document.
    pub async fn load_content(&self, id: &DocumentId) -> LoadResult {
        if self.gate.admit(id) == Admission::Coalesced {
            let previous = self.engine.previous_outcome();
            return LoadResult {
                snapshot: previous.snapshot,
                source: previous.source,
                updated: false,
                coalesced: true,
            };
        }

        // Switching documents cancels any in-flight pass for the old one:
        // a stale result must never materialize over the new document.
        let cancel = {
            let mut active = self.active.lock();
            if active.id.as_ref() != Some(id) {
                debug!(new = %id, "active document changed; cancelling in-flight pass");
                active.cancel.cancel();
                active.cancel = CancellationToken::new();
                active.id = Some(id.clone());
            }
            active.cancel.clone()
        };

        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let candidates = self.reader.read(id).await;
        let outcome = self.engine.reconcile(id, candidates, &cancel);
        if !cancel.is_cancelled() {
            self.gate.record(id);
        }

        LoadResult {
            snapshot: outcome.snapshot,
            source: outcome.source,
            updated: outcome.updated,
            coalesced: false,
        }
    }

    /// Save a snapshot immediately, queued behind any in-flight
    /// operation for the same document.
    pub async fn save_content(
        &self,
        id: &DocumentId,
        snapshot: ContentSnapshot,
    ) -> Result<SaveOutcome, SaveError> {
        self.gate.invalidate();
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;
        self.saver.save(id, snapshot).await
    }

    /// Note an edit to the live document; a save is scheduled after the
    /// quiescence window, and a newer edit resets the timer.
    ///
    /// Must be called within a tokio runtime (the debounce timer is a
    /// spawned task).
    pub fn note_edit(self: &Arc<Self>, id: &DocumentId, snapshot: ContentSnapshot) {
        self.gate.invalidate();
        let generation = self.edit_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let displaced = {
            let mut pending = self.pending.lock();
            let displaced = pending.take().filter(|p| p.id != *id);
            *pending = Some(PendingSave {
                id: id.clone(),
                snapshot,
            });
            displaced
        };

        // An edit for a different document must not orphan the one
        // already waiting in the slot; save it now instead of letting
        // its timer lose the generation race.
        if let Some(displaced) = displaced {
            debug!(id = %displaced.id, "pending edit displaced by another document; saving immediately");
            let session = Arc::clone(self);
            tokio::spawn(async move {
                let lock = session.lock_for(&displaced.id);
                let _guard = lock.lock().await;
                if let Err(e) = session.saver.save(&displaced.id, displaced.snapshot).await {
                    warn!(id = %displaced.id, error = %e, "displaced save failed; edit remains in local caches");
                }
            });
        }

        let session = Arc::clone(self);
        let debounce = self.config.save_debounce();
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if session.edit_generation.load(Ordering::SeqCst) != generation {
                // A newer edit restarted the window; its timer owns the save.
                return;
            }
            if let Err(e) = session.flush_pending().await {
                warn!(error = %e, "debounced save failed; edit remains in local caches");
            }
        });
    }

    /// Flush the pending debounced save, if any.
    pub async fn flush_pending(&self) -> Result<Option<SaveOutcome>, SaveError> {
        let Some(pending) = self.pending.lock().take() else {
            return Ok(None);
        };
        let lock = self.lock_for(&pending.id);
        let _guard = lock.lock().await;
        self.saver.save(&pending.id, pending.snapshot).await.map(Some)
    }

    /// Tear down the session, flushing any pending debounced save rather
    /// than dropping it.
    pub async fn shutdown(&self) {
        if let Err(e) = self.flush_pending().await {
            warn!(error = %e, "pending save lost to remote failure during shutdown; local caches retain it");
        }
        self.active.lock().cancel.cancel();
    }

    /// Explicitly invalidate the active-content bookkeeping; the next
    /// load re-runs the full fan-out.
    pub fn invalidate(&self) {
        self.engine.invalidate();
        self.gate.invalidate();
    }

    /// Durable-cache statistics for diagnostics UI.
    pub fn cache_stats(&self) -> CacheStats {
        self.durable.stats()
    }

    /// Number of documents held in the volatile cache this session.
    pub fn volatile_len(&self) -> usize {
        self.volatile.len()
    }
}

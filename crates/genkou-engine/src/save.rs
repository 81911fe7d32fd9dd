//! Outbound save path.
//!
//! Serializes edits back to the authoritative store: canonical text,
//! fingerprint comparison to skip true no-op saves, best-effort local
//! persistence, then the remote write. Only the remote write can fail a
//! save; by then the local caches already carry the edit, so the user's
//! content survives a failed save.

use std::sync::Arc;

use genkou_types::{ContentSnapshot, DocumentId, Source};
use tracing::{debug, info, warn};

use crate::durable::{DurableCache, DurableEntry};
use crate::error::SaveError;
use crate::hash;
use crate::model::DocumentModel;
use crate::reconcile::{ActiveContent, SharedEngineState};
use crate::remote::RemoteStore;
use crate::volatile::VolatileCache;

/// What a save actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Content changed and was written to the remote store.
    Written,
    /// Content was identical to the last persisted state; nothing hit
    /// the remote store. Repeated saves of unchanged content are free.
    Unchanged,
}

/// Serializes outbound edits for the active document.
pub struct SaveCoordinator {
    state: SharedEngineState,
    volatile: Arc<VolatileCache>,
    durable: Arc<dyn DurableCache>,
    remote: Arc<dyn RemoteStore>,
    model: Arc<dyn DocumentModel>,
}

impl SaveCoordinator {
    pub fn new(
        state: SharedEngineState,
        volatile: Arc<VolatileCache>,
        durable: Arc<dyn DurableCache>,
        remote: Arc<dyn RemoteStore>,
        model: Arc<dyn DocumentModel>,
    ) -> Self {
        Self {
            state,
            volatile,
            durable,
            remote,
            model,
        }
    }

    /// Persist a snapshot for `id`.
    ///
    /// On remote failure the active snapshot/source bookkeeping stays
    /// untouched and the failure surfaces to the caller; the local caches
    /// already reflect the attempted edit, so nothing is lost.
    /// Callers serialize concurrent saves per identifier (see
    /// [`crate::session::EditorSession`]); this method assumes it is not
    /// racing itself for the same document.
    pub async fn save(
        &self,
        id: &DocumentId,
        snapshot: ContentSnapshot,
    ) -> Result<SaveOutcome, SaveError> {
        let text = self.model.serialize(&snapshot);
        let fingerprint = hash::fingerprint(&text);

        // The fingerprint only describes the active document; identical
        // text under a different identifier is still a distinct save.
        let unchanged = {
            let state = self.state.lock();
            state.active.as_ref().is_some_and(|a| a.id == *id)
                && state.last_fingerprint.as_ref() == Some(&fingerprint)
        };
        if unchanged {
            debug!(%id, %fingerprint, "content unchanged; skipping save");
            return Ok(SaveOutcome::Unchanged);
        }

        // Local persistence first, best-effort: the durable cache can
        // reject the write (capacity), which must not fail the save.
        self.volatile.set(id, snapshot.clone());
        let entry = DurableEntry::new(snapshot.clone(), fingerprint.clone());
        if let Err(e) = self.durable.set(id, &entry) {
            warn!(%id, error = %e, "durable cache write failed; continuing with remote save");
        }

        self.remote.write(id, &text).await.map_err(SaveError::from)?;

        let mut state = self.state.lock();
        state.active = Some(ActiveContent {
            id: id.clone(),
            snapshot,
        });
        // A successful save makes the in-session copy the authoritative
        // truth: volatile source, highest rank.
        state.active_source = Some(Source::Volatile);
        state.last_fingerprint = Some(fingerprint);

        info!(%id, bytes = text.len(), "document saved");
        Ok(SaveOutcome::Written)
    }
}

//! Process-lifetime content cache.
//!
//! Maps document identifiers to the last snapshot applied or edited this
//! session. Contents die with the process; entries here represent
//! "already in the live document model", which is why the volatile source
//! carries the highest reconciliation priority. Bounded by the number of
//! documents opened in a session, so no eviction.

use std::collections::HashMap;

use genkou_types::{ContentSnapshot, DocumentId};
use parking_lot::RwLock;
use tracing::trace;

/// In-memory snapshot cache for the running session.
#[derive(Debug, Default)]
pub struct VolatileCache {
    map: RwLock<HashMap<DocumentId, ContentSnapshot>>,
}

impl VolatileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-known snapshot for a document, if any.
    pub fn get(&self, id: &DocumentId) -> Option<ContentSnapshot> {
        self.map.read().get(id).cloned()
    }

    /// Record the latest snapshot for a document.
    pub fn set(&self, id: &DocumentId, snapshot: ContentSnapshot) {
        trace!(%id, blocks = snapshot.block_count(), "volatile cache updated");
        self.map.write().insert(id.clone(), snapshot);
    }

    /// Drop the entry for a document.
    pub fn clear(&self, id: &DocumentId) {
        self.map.write().remove(id);
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

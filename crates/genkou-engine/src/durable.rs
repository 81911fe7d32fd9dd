//! Cross-session persisted content cache.
//!
//! Survives restarts of the client but is local to one device; it is
//! never shared. The cache is an injected dependency ([`DurableCache`]
//! trait) so tests can substitute the in-memory implementation and inject
//! failures.
//!
//! Persisted entries are keyed by a versioned prefix: bumping
//! [`CACHE_VERSION`] makes every prior entry a miss, so incompatible
//! layouts are invalidated forward-compatibly and never parsed.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use genkou_types::{CacheStats, ContentSnapshot, DocumentId, Fingerprint};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DurableReadError, PersistError};

/// Entry layout version. Bump on incompatible changes; old entries then
/// read as cache misses instead of parse attempts.
pub const CACHE_VERSION: &str = "v2";

/// One persisted cache entry: the snapshot, its fingerprint, and when it
/// was saved (milliseconds since the Unix epoch, informational).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableEntry {
    pub snapshot: ContentSnapshot,
    pub fingerprint: Fingerprint,
    pub saved_at_ms: u64,
}

impl DurableEntry {
    /// Build an entry stamped with the current wall clock.
    pub fn new(snapshot: ContentSnapshot, fingerprint: Fingerprint) -> Self {
        Self {
            snapshot,
            fingerprint,
            saved_at_ms: now_ms(),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The durable cache interface.
///
/// Reads are synchronous and cheap; the engine calls them on the hot
/// load path before deciding whether a remote round trip is needed.
/// Write failure is non-fatal to callers — they log and continue with
/// the volatile cache and remote store.
pub trait DurableCache: Send + Sync {
    /// Stored entry for a document. `Ok(None)` is a miss; `Err` means
    /// the medium was unreadable or the entry is corrupt.
    fn get(&self, id: &DocumentId) -> Result<Option<DurableEntry>, DurableReadError>;

    /// Persist an entry. Fails when the medium rejects the write
    /// (capacity exceeded, I/O error).
    fn set(&self, id: &DocumentId, entry: &DurableEntry) -> Result<(), PersistError>;

    /// Remove a document's entry, if present.
    fn clear(&self, id: &DocumentId);

    /// Informational size/count statistics.
    fn stats(&self) -> CacheStats;
}

// ============================================================================
// Filesystem-backed implementation
// ============================================================================

/// Durable cache persisted as one JSON file per document under a
/// directory, with a byte-capacity budget.
#[derive(Debug)]
pub struct FsDurableCache {
    dir: PathBuf,
    capacity_bytes: u64,
}

impl FsDurableCache {
    /// Open (creating if needed) a cache directory.
    pub fn open(dir: impl Into<PathBuf>, capacity_bytes: u64) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            capacity_bytes,
        })
    }

    /// Path of the entry file for an identifier: versioned prefix plus a
    /// digest of the identifier (path-shaped ids aren't filename-safe).
    fn entry_path(&self, id: &DocumentId) -> PathBuf {
        let digest = blake3::hash(id.as_str().as_bytes());
        self.dir
            .join(format!("{CACHE_VERSION}-{}.json", hex::encode(&digest.as_bytes()[..16])))
    }

    /// Bytes used by current-version entries, optionally excluding one file.
    fn used_bytes(&self, excluding: Option<&Path>) -> u64 {
        let Ok(read) = std::fs::read_dir(&self.dir) else {
            return 0;
        };
        read.flatten()
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name.starts_with(CACHE_VERSION) && name.ends_with(".json")
            })
            .filter(|e| excluding != Some(e.path().as_path()))
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }
}

impl DurableCache for FsDurableCache {
    fn get(&self, id: &DocumentId) -> Result<Option<DurableEntry>, DurableReadError> {
        let path = self.entry_path(id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DurableReadError::Unavailable(e.to_string())),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DurableReadError::Corrupt(e.to_string()))
    }

    fn set(&self, id: &DocumentId, entry: &DurableEntry) -> Result<(), PersistError> {
        let raw = serde_json::to_string(entry).map_err(io::Error::other)?;
        let path = self.entry_path(id);

        let needed = raw.len() as u64;
        let used = self.used_bytes(Some(path.as_path()));
        if used + needed > self.capacity_bytes {
            return Err(PersistError::CapacityExceeded {
                needed,
                available: self.capacity_bytes.saturating_sub(used),
            });
        }

        std::fs::write(&path, raw)?;
        debug!(%id, bytes = needed, "durable cache entry written");
        Ok(())
    }

    fn clear(&self, id: &DocumentId) {
        let path = self.entry_path(id);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(%id, error = %e, "failed to clear durable cache entry");
            }
        }
    }

    fn stats(&self) -> CacheStats {
        let Ok(read) = std::fs::read_dir(&self.dir) else {
            return CacheStats::default();
        };
        let mut stats = CacheStats::default();
        for entry in read.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !(name.starts_with(CACHE_VERSION) && name.ends_with(".json")) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                stats.total_bytes += meta.len();
                stats.entries += 1;
            }
        }
        stats
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// Durable cache held in memory — for tests and ephemeral sessions.
///
/// Stores entries in their serialized form so tests can inject corrupt
/// payloads via [`MemoryDurableCache::insert_raw`], and failures via
/// [`MemoryDurableCache::fail_writes`].
#[derive(Debug, Default)]
pub struct MemoryDurableCache {
    entries: RwLock<HashMap<DocumentId, String>>,
    capacity_bytes: Option<u64>,
    fail_writes: AtomicBool,
}

impl MemoryDurableCache {
    /// Unbounded in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory cache with a byte budget.
    pub fn with_capacity(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes: Some(capacity_bytes),
            ..Self::default()
        }
    }

    /// Make every subsequent `set` fail (simulates a full medium).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert a raw payload, bypassing serialization. For corruption tests.
    pub fn insert_raw(&self, id: &DocumentId, raw: impl Into<String>) {
        self.entries.write().insert(id.clone(), raw.into());
    }
}

impl DurableCache for MemoryDurableCache {
    fn get(&self, id: &DocumentId) -> Result<Option<DurableEntry>, DurableReadError> {
        match self.entries.read().get(id) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| DurableReadError::Corrupt(e.to_string())),
        }
    }

    fn set(&self, id: &DocumentId, entry: &DurableEntry) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Io(io::Error::other("injected write failure")));
        }
        let raw = serde_json::to_string(entry).map_err(io::Error::other)?;
        if let Some(capacity) = self.capacity_bytes {
            let mut entries = self.entries.write();
            let used: u64 = entries
                .iter()
                .filter(|(k, _)| *k != id)
                .map(|(_, v)| v.len() as u64)
                .sum();
            let needed = raw.len() as u64;
            if used + needed > capacity {
                return Err(PersistError::CapacityExceeded {
                    needed,
                    available: capacity.saturating_sub(used),
                });
            }
            entries.insert(id.clone(), raw);
        } else {
            self.entries.write().insert(id.clone(), raw);
        }
        Ok(())
    }

    fn clear(&self, id: &DocumentId) {
        self.entries.write().remove(id);
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        CacheStats {
            total_bytes: entries.values().map(|v| v.len() as u64).sum(),
            entries: entries.len(),
        }
    }
}

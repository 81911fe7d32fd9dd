//! Source fan-out.
//!
//! For one document, [`SourceReader`] queries all three content sources
//! and normalizes each result into a provenance-tagged [`Candidate`].
//! Failure of one source never blocks the others — a corrupt durable
//! entry still leaves the remote path open, and an unreachable remote
//! still leaves local content usable.
//!
//! The volatile and durable reads are synchronous and cheap, so they run
//! first; the remote read is the only operation that suspends on I/O and
//! is skipped outright when a local source already has a valid snapshot
//! (the cache-hit short-circuit — no remote round trip once an
//! in-session copy exists).

use std::sync::Arc;

use genkou_types::{ContentSnapshot, DocumentId, Source};
use tracing::{debug, warn};

use crate::durable::DurableCache;
use crate::error::{CandidateError, DurableReadError};
use crate::model::DocumentModel;
use crate::remote::RemoteStore;
use crate::volatile::VolatileCache;

/// A provenance-tagged content result from one reconciliation pass.
/// Produced fresh per pass; never persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub source: Source,
    pub snapshot: Option<ContentSnapshot>,
    pub error: Option<CandidateError>,
}

impl Candidate {
    /// A candidate carrying content.
    pub fn hit(source: Source, snapshot: ContentSnapshot) -> Self {
        Self {
            source,
            snapshot: Some(snapshot),
            error: None,
        }
    }

    /// The source had nothing for this document.
    pub fn absent(source: Source) -> Self {
        Self {
            source,
            snapshot: None,
            error: None,
        }
    }

    /// The source failed; recorded but never fatal.
    pub fn error(source: Source, error: CandidateError) -> Self {
        Self {
            source,
            snapshot: None,
            error: Some(error),
        }
    }

    /// Whether this candidate can win a reconciliation pass.
    pub fn is_viable(&self) -> bool {
        self.error.is_none() && self.snapshot.is_some()
    }
}

/// The three candidates from one fan-out.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub remote: Candidate,
    pub durable: Candidate,
    pub volatile: Candidate,
}

impl CandidateSet {
    /// Candidates in descending priority order: volatile, durable, remote.
    pub fn into_descending_priority(self) -> [Candidate; 3] {
        [self.volatile, self.durable, self.remote]
    }
}

/// Fans out one document identifier to all three sources.
pub struct SourceReader {
    volatile: Arc<VolatileCache>,
    durable: Arc<dyn DurableCache>,
    remote: Arc<dyn RemoteStore>,
    model: Arc<dyn DocumentModel>,
}

impl SourceReader {
    pub fn new(
        volatile: Arc<VolatileCache>,
        durable: Arc<dyn DurableCache>,
        remote: Arc<dyn RemoteStore>,
        model: Arc<dyn DocumentModel>,
    ) -> Self {
        Self {
            volatile,
            durable,
            remote,
            model,
        }
    }

    /// Produce candidates from all three sources.
    pub async fn read(&self, id: &DocumentId) -> CandidateSet {
        let volatile = match self.volatile.get(id) {
            Some(snapshot) => Candidate::hit(Source::Volatile, snapshot),
            None => Candidate::absent(Source::Volatile),
        };

        let durable = match self.durable.get(id) {
            Ok(Some(entry)) => Candidate::hit(Source::Durable, entry.snapshot),
            Ok(None) => Candidate::absent(Source::Durable),
            Err(e) => {
                warn!(%id, error = %e, "durable cache entry unusable; falling through");
                let kind = match e {
                    DurableReadError::Corrupt(msg) => CandidateError::Decode(msg),
                    DurableReadError::Unavailable(msg) => CandidateError::Unavailable(msg),
                };
                Candidate::error(Source::Durable, kind)
            }
        };

        // Cache-hit short-circuit: a valid local copy always outranks
        // remote content, so the round trip would be wasted.
        let remote = if volatile.is_viable() || durable.is_viable() {
            debug!(%id, "local candidate present; skipping remote read");
            Candidate::absent(Source::Remote)
        } else {
            self.read_remote(id).await
        };

        CandidateSet {
            remote,
            durable,
            volatile,
        }
    }

    async fn read_remote(&self, id: &DocumentId) -> Candidate {
        match self.remote.read(id).await {
            // Empty text and not-found both materialize as a valid empty
            // document: "open a path that doesn't exist yet" behaves as a
            // blank new document, never as a miss.
            Ok(read) if !read.found || read.text.is_empty() => {
                Candidate::hit(Source::Remote, ContentSnapshot::empty())
            }
            Ok(read) => match self.model.parse(&read.text) {
                Ok(snapshot) => Candidate::hit(Source::Remote, snapshot),
                Err(e) => {
                    warn!(%id, error = %e, "remote content failed to parse");
                    Candidate::error(Source::Remote, CandidateError::Parse(e.to_string()))
                }
            },
            Err(e) => {
                warn!(%id, error = %e, "remote read failed");
                Candidate::error(Source::Remote, CandidateError::Unavailable(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::{DurableEntry, MemoryDurableCache};
    use crate::error::RemoteError;
    use crate::hash::fingerprint;
    use crate::markdown::MarkdownModel;
    use crate::remote::RemoteRead;
    use async_trait::async_trait;
    use genkou_types::BlockNode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Remote store that counts reads and serves a fixed response.
    #[derive(Default)]
    struct CountingRemote {
        reads: AtomicUsize,
        response: Option<RemoteRead>,
    }

    impl CountingRemote {
        fn with_text(text: &str) -> Self {
            Self {
                reads: AtomicUsize::new(0),
                response: Some(RemoteRead::found(text)),
            }
        }

        fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteStore for CountingRemote {
        async fn read(&self, _id: &DocumentId) -> Result<RemoteRead, RemoteError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Some(r) => Ok(r.clone()),
                None => Err(RemoteError::Unavailable("offline".into())),
            }
        }

        async fn write(&self, _id: &DocumentId, _text: &str) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    fn reader(remote: Arc<CountingRemote>) -> (SourceReader, Arc<VolatileCache>, Arc<MemoryDurableCache>) {
        let volatile = Arc::new(VolatileCache::new());
        let durable = Arc::new(MemoryDurableCache::new());
        let reader = SourceReader::new(
            volatile.clone(),
            durable.clone(),
            remote,
            Arc::new(MarkdownModel::new()),
        );
        (reader, volatile, durable)
    }

    fn snap(text: &str) -> ContentSnapshot {
        ContentSnapshot::from_blocks(vec![BlockNode::paragraph(text)])
    }

    #[tokio::test]
    async fn test_all_absent_falls_through_to_remote() {
        let remote = Arc::new(CountingRemote::with_text("remote body\n"));
        let (reader, _, _) = reader(remote.clone());

        let set = reader.read(&DocumentId::new("a.md")).await;
        assert!(!set.volatile.is_viable());
        assert!(!set.durable.is_viable());
        assert!(set.remote.is_viable());
        assert_eq!(remote.read_count(), 1);
    }

    #[tokio::test]
    async fn test_durable_hit_short_circuits_remote() {
        let remote = Arc::new(CountingRemote::with_text("remote body\n"));
        let (reader, _, durable) = reader(remote.clone());
        let id = DocumentId::new("a.md");
        durable
            .set(&id, &DurableEntry::new(snap("cached"), fingerprint("cached")))
            .expect("set");

        let set = reader.read(&id).await;
        assert!(set.durable.is_viable());
        assert_eq!(remote.read_count(), 0, "remote must not be read on a durable hit");
    }

    #[tokio::test]
    async fn test_volatile_hit_short_circuits_remote() {
        let remote = Arc::new(CountingRemote::with_text("remote body\n"));
        let (reader, volatile, _) = reader(remote.clone());
        let id = DocumentId::new("a.md");
        volatile.set(&id, snap("live"));

        let set = reader.read(&id).await;
        assert!(set.volatile.is_viable());
        assert_eq!(remote.read_count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_durable_entry_becomes_error_candidate() {
        let remote = Arc::new(CountingRemote::with_text("fallback\n"));
        let (reader, _, durable) = reader(remote.clone());
        let id = DocumentId::new("a.md");
        durable.insert_raw(&id, "{definitely not an entry");

        let set = reader.read(&id).await;
        assert!(matches!(set.durable.error, Some(CandidateError::Decode(_))));
        // The corrupt entry doesn't count as a hit, so remote is consulted.
        assert!(set.remote.is_viable());
        assert_eq!(remote.read_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_not_found_is_an_empty_snapshot() {
        let remote = Arc::new(CountingRemote {
            reads: AtomicUsize::new(0),
            response: Some(RemoteRead::absent()),
        });
        let (reader, _, _) = reader(remote);

        let set = reader.read(&DocumentId::new("new.md")).await;
        let snapshot = set.remote.snapshot.expect("empty snapshot, not a miss");
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_an_error_candidate() {
        let remote = Arc::new(CountingRemote::default());
        let (reader, _, _) = reader(remote);

        let set = reader.read(&DocumentId::new("a.md")).await;
        assert!(matches!(
            set.remote.error,
            Some(CandidateError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unparseable_remote_content_is_a_parse_error() {
        let remote = Arc::new(CountingRemote::with_text("bad\0bytes"));
        let (reader, _, _) = reader(remote);

        let set = reader.read(&DocumentId::new("a.md")).await;
        assert!(matches!(set.remote.error, Some(CandidateError::Parse(_))));
    }
}

//! Shared test fixtures for the session-level tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use genkou_engine::{
    EditorSession, EngineConfig, MarkdownModel, MemoryDurableCache, RemoteError, RemoteRead,
    RemoteStore,
};
use genkou_types::DocumentId;
use parking_lot::Mutex;

/// In-memory remote store with call counters, injectable latency, and
/// injectable write failure.
#[derive(Default)]
pub struct MockRemote {
    docs: Mutex<HashMap<DocumentId, String>>,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    read_delay_ms: AtomicU64,
    fail_writes: AtomicBool,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, id: &str, text: &str) {
        self.docs.lock().insert(DocumentId::new(id), text.to_string());
    }

    pub fn text_of(&self, id: &str) -> Option<String> {
        self.docs.lock().get(&DocumentId::new(id)).cloned()
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn read(&self, id: &DocumentId) -> Result<RemoteRead, RemoteError> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(match self.docs.lock().get(id) {
            Some(text) => RemoteRead::found(text.clone()),
            None => RemoteRead::absent(),
        })
    }

    async fn write(&self, id: &DocumentId, text: &str) -> Result<(), RemoteError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected outage".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.docs.lock().insert(id.clone(), text.to_string());
        Ok(())
    }
}

/// A full session wired to in-memory collaborators.
pub struct Harness {
    pub session: Arc<EditorSession>,
    pub remote: Arc<MockRemote>,
    pub durable: Arc<MemoryDurableCache>,
    pub model: Arc<MarkdownModel>,
}

pub fn harness(config: EngineConfig) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let remote = MockRemote::new();
    let durable = Arc::new(MemoryDurableCache::new());
    let model = Arc::new(MarkdownModel::new());
    let session = Arc::new(EditorSession::new(
        config,
        durable.clone(),
        remote.clone(),
        model.clone(),
    ));
    Harness {
        session,
        remote,
        durable,
        model,
    }
}

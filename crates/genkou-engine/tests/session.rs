//! End-to-end tests of the whole load/save pipeline through
//! `EditorSession`, with in-memory collaborators.

mod common;

use std::time::Duration;

use common::harness;
use genkou_engine::{DocumentModel, DurableCache, EngineConfig, SaveOutcome};
use genkou_types::{BlockNode, ContentSnapshot, DocumentId, Source};

fn snap(text: &str) -> ContentSnapshot {
    ContentSnapshot::from_blocks(vec![BlockNode::paragraph(text)])
}

#[tokio::test]
async fn test_fresh_load_comes_from_remote() {
    let h = harness(EngineConfig::default());
    h.remote.seed("/notes/a.md", "remote body\n");

    let result = h.session.load_content(&DocumentId::new("/notes/a.md")).await;
    assert!(result.updated);
    assert_eq!(result.source, Some(Source::Remote));
    assert_eq!(h.model.current(), snap("remote body"));
    assert_eq!(h.remote.read_count(), 1);
}

#[tokio::test]
async fn test_missing_remote_document_loads_as_blank() {
    let h = harness(EngineConfig::default());

    let result = h.session.load_content(&DocumentId::new("/new/idea.md")).await;
    // The empty snapshot is real content and is applied, so the model
    // shows a blank document rather than an error.
    assert!(result.updated);
    assert_eq!(result.source, Some(Source::Remote));
    assert!(result.snapshot.is_empty());
}

#[tokio::test]
async fn test_save_then_reconcile_stays_volatile_without_remote_trip() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("/notes/a.md");

    let outcome = h.session.save_content(&id, snap("edited")).await.expect("save");
    assert_eq!(outcome, SaveOutcome::Written);

    let result = h.session.load_content(&id).await;
    assert_eq!(result.source, Some(Source::Volatile));
    assert_eq!(result.snapshot, snap("edited"));
    assert_eq!(h.remote.read_count(), 0, "no remote round trip after a local save");
}

#[tokio::test]
async fn test_repeated_save_of_unchanged_content_writes_once() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("a.md");

    h.session.save_content(&id, snap("same")).await.expect("first");
    let second = h.session.save_content(&id, snap("same")).await.expect("second");
    assert_eq!(second, SaveOutcome::Unchanged);
    assert_eq!(h.remote.write_count(), 1);
}

#[tokio::test]
async fn test_durable_hit_wins_without_remote_read() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("a.md");

    // A previous session persisted an edit that never reached the remote.
    h.session.save_content(&id, snap("local edit")).await.expect("save");
    let fresh = harness(EngineConfig::default());
    // Carry the durable cache over to the "new" session.
    let entry = h.durable.get(&id).expect("get").expect("entry");
    fresh.durable.set(&id, &entry).expect("set");
    fresh.remote.seed("a.md", "newer remote\n");

    let result = fresh.session.load_content(&id).await;
    assert_eq!(result.source, Some(Source::Durable));
    assert_eq!(result.snapshot, snap("local edit"));
    assert_eq!(
        fresh.remote.read_count(),
        0,
        "durable hit must short-circuit the remote read"
    );
}

#[tokio::test]
async fn test_corrupt_durable_entry_falls_back_to_remote() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("a.md");
    h.durable.insert_raw(&id, "v1 garbage that fails to decode");
    h.remote.seed("a.md", "intact remote\n");

    let result = h.session.load_content(&id).await;
    assert!(result.updated);
    assert_eq!(result.source, Some(Source::Remote));
    assert_eq!(result.snapshot, snap("intact remote"));
}

#[tokio::test]
async fn test_rapid_reload_is_coalesced() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("a.md");
    h.remote.seed("a.md", "body\n");

    let first = h.session.load_content(&id).await;
    assert!(!first.coalesced);
    let second = h.session.load_content(&id).await;
    assert!(second.coalesced);
    assert!(!second.updated);
    assert_eq!(second.snapshot, first.snapshot);
    assert_eq!(h.remote.read_count(), 1, "coalesced load re-reads nothing");
}

#[tokio::test]
async fn test_edit_defeats_coalescing() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("a.md");
    h.remote.seed("a.md", "body\n");

    h.session.load_content(&id).await;
    h.session.save_content(&id, snap("edited")).await.expect("save");
    let reload = h.session.load_content(&id).await;
    assert!(!reload.coalesced);
    assert_eq!(reload.snapshot, snap("edited"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_switching_documents_cancels_stale_pass() {
    let h = harness(EngineConfig::default());
    h.remote.seed("a.md", "content of A\n");
    h.remote.seed("b.md", "content of B\n");
    h.remote.set_read_delay(Duration::from_millis(200));

    let session = h.session.clone();
    let slow_a = tokio::spawn(async move { session.load_content(&DocumentId::new("a.md")).await });

    // Give A time to enter its remote read, then switch to B.
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.remote.set_read_delay(Duration::ZERO);
    let b = h.session.load_content(&DocumentId::new("b.md")).await;
    assert_eq!(b.snapshot, snap("content of B"));

    let a = slow_a.await.expect("join");
    assert!(!a.updated, "stale pass for A must not apply after switching to B");
    assert_eq!(h.model.current(), snap("content of B"));
}

#[tokio::test]
async fn test_remote_save_failure_surfaces_but_keeps_edit_locally() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("a.md");
    h.remote.fail_writes(true);

    assert!(h.session.save_content(&id, snap("precious")).await.is_err());

    // The edit survives in the durable cache for the next session.
    let entry = h.durable.get(&id).expect("get").expect("entry");
    assert_eq!(entry.snapshot, snap("precious"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_debounced_edit_saves_after_quiescence() {
    let h = harness(EngineConfig::from_toml_str("save_debounce_ms = 50").expect("config"));
    let id = DocumentId::new("a.md");

    h.session.note_edit(&id, snap("draft"));
    assert_eq!(h.remote.write_count(), 0, "not saved before the window elapses");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.remote.write_count(), 1);
    assert_eq!(h.remote.text_of("a.md").as_deref(), Some("draft\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_newer_edit_resets_the_debounce_window() {
    let h = harness(EngineConfig::from_toml_str("save_debounce_ms = 120").expect("config"));
    let id = DocumentId::new("a.md");

    h.session.note_edit(&id, snap("first"));
    tokio::time::sleep(Duration::from_millis(40)).await;
    h.session.note_edit(&id, snap("second"));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(h.remote.write_count(), 1, "only the quiesced edit saves");
    assert_eq!(h.remote.text_of("a.md").as_deref(), Some("second\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cross_document_edit_saves_the_displaced_pending_edit() {
    let h = harness(EngineConfig::from_toml_str("save_debounce_ms = 60000").expect("config"));

    h.session.note_edit(&DocumentId::new("a.md"), snap("edit to A"));
    h.session.note_edit(&DocumentId::new("b.md"), snap("edit to B"));

    // A's edit no longer occupies the pending slot, so it must have
    // been saved on displacement rather than dropped.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.remote.text_of("a.md").as_deref(), Some("edit to A\n"));

    h.session.shutdown().await;
    assert_eq!(h.remote.text_of("b.md").as_deref(), Some("edit to B\n"));
}

#[tokio::test]
async fn test_same_text_saved_under_another_identifier_still_writes() {
    let h = harness(EngineConfig::default());

    h.session
        .save_content(&DocumentId::new("a.md"), snap("same text"))
        .await
        .expect("save a");
    let second = h
        .session
        .save_content(&DocumentId::new("b.md"), snap("same text"))
        .await
        .expect("save b");
    assert_eq!(second, SaveOutcome::Written);
    assert_eq!(h.remote.text_of("b.md").as_deref(), Some("same text\n"));
}

#[tokio::test]
async fn test_shutdown_flushes_pending_edit() {
    let h = harness(EngineConfig::from_toml_str("save_debounce_ms = 60000").expect("config"));
    let id = DocumentId::new("a.md");

    h.session.note_edit(&id, snap("about to close"));
    h.session.shutdown().await;
    assert_eq!(h.remote.write_count(), 1, "teardown flushes instead of dropping");
    assert_eq!(h.remote.text_of("a.md").as_deref(), Some("about to close\n"));
}

#[tokio::test]
async fn test_cache_stats_reflect_durable_entries() {
    let h = harness(EngineConfig::default());
    assert_eq!(h.session.cache_stats().entries, 0);

    h.session
        .save_content(&DocumentId::new("a.md"), snap("x"))
        .await
        .expect("save");
    let stats = h.session.cache_stats();
    assert_eq!(stats.entries, 1);
    assert!(stats.total_bytes > 0);
}

#[tokio::test]
async fn test_invalidate_forces_a_full_reload() {
    let h = harness(EngineConfig::default());
    let id = DocumentId::new("a.md");
    h.remote.seed("a.md", "body\n");

    h.session.load_content(&id).await;
    h.session.invalidate();

    let reload = h.session.load_content(&id).await;
    assert!(!reload.coalesced);
    // The volatile cache still holds the content, so the reload is
    // served locally and re-applies it.
    assert!(reload.updated);
    assert_eq!(reload.source, Some(Source::Volatile));
    assert_eq!(h.remote.read_count(), 1);
}

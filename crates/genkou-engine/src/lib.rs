//! genkou-engine — multi-source content reconciliation.
//!
//! A document's content exists in three places at once: the
//! authoritative remote store, a durable per-device cache, and the
//! in-memory copy of the running session. This crate arbitrates between
//! them: it fans out reads, picks a winner by provenance priority
//! (volatile > durable > remote), materializes it into the document
//! model, detects staleness by content fingerprint, and serializes
//! writes back out without redundant round trips or lost updates.
//!
//! Entry point is [`session::EditorSession`]; everything below it is
//! independently usable and testable.

pub mod config;
pub mod durable;
pub mod error;
pub mod gate;
pub mod hash;
pub mod markdown;
pub mod model;
pub mod reader;
pub mod reconcile;
pub mod remote;
pub mod save;
pub mod session;
pub mod volatile;

pub use config::EngineConfig;
pub use durable::{DurableCache, DurableEntry, FsDurableCache, MemoryDurableCache};
pub use error::{CandidateError, ModelError, PersistError, RemoteError, SaveError};
pub use gate::{Admission, LoadGate};
pub use markdown::MarkdownModel;
pub use model::DocumentModel;
pub use reader::{Candidate, CandidateSet, SourceReader};
pub use reconcile::{LoadPhase, ReconcileOutcome, ReconciliationEngine, should_apply};
pub use remote::{LocalFsStore, RemoteRead, RemoteStore};
pub use save::{SaveCoordinator, SaveOutcome};
pub use session::{EditorSession, LoadResult};
pub use volatile::VolatileCache;

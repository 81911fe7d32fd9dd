//! Shared types for the genkou reconciliation engine.
//!
//! Everything here is plain data: document identifiers, the block-level
//! content model, content fingerprints, and the provenance/priority types
//! the reconciliation engine dispatches on. No I/O, no async, no policy.

pub mod block;
pub mod id;
pub mod source;

pub use block::{BlockKind, BlockNode, ContentSnapshot};
pub use id::DocumentId;
pub use source::{Fingerprint, Source};

use serde::{Deserialize, Serialize};

/// Informational statistics for the durable cache, surfaced to
/// diagnostics UIs. Informational only — never used for decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total bytes of persisted entry payloads.
    pub total_bytes: u64,
    /// Number of entries currently persisted.
    pub entries: usize,
}

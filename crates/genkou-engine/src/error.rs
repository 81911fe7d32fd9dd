//! Engine error types.
//!
//! The taxonomy follows the containment policy: per-source failures
//! ([`CandidateError`]) never escape a reconciliation pass, durable-cache
//! write failures ([`PersistError`]) are logged and swallowed, and only
//! remote write failures ([`SaveError`]) surface to callers — a silent
//! save failure risks data loss, everything else degrades gracefully.

use std::io;

use thiserror::Error;

/// Why a single content candidate is unusable. Contained within the
/// reconciliation pass: the affected source is skipped, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CandidateError {
    /// The source could not be reached.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Content was fetched but could not be parsed into a snapshot.
    #[error("content could not be parsed: {0}")]
    Parse(String),

    /// A persisted cache entry failed to decode.
    #[error("cached entry is malformed: {0}")]
    Decode(String),

    /// The document model rejected the snapshot at materialize time.
    #[error("materialize failed: {0}")]
    Materialize(String),
}

/// Error reading from the durable cache. Absence is not an error —
/// this covers unreachable media and undecodable entries only.
#[derive(Debug, Error)]
pub enum DurableReadError {
    /// The stored value exists but does not decode to a snapshot entry.
    #[error("corrupt entry: {0}")]
    Corrupt(String),

    /// The persistence medium could not be read.
    #[error("cache medium unavailable: {0}")]
    Unavailable(String),
}

/// Error writing to the durable cache. Callers log and continue; the
/// volatile cache and remote store still carry the content.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The persistence medium rejected the write for size reasons.
    #[error("cache capacity exceeded: entry is {needed} bytes, {available} available")]
    CapacityExceeded { needed: u64, available: u64 },

    /// The persistence medium failed outright.
    #[error("cache write failed: {0}")]
    Io(#[from] io::Error),
}

/// Error from the remote (authoritative) store.
///
/// Note that "document does not exist" is not an error: `RemoteStore::read`
/// reports it as `found: false` and the product treats it as a blank new
/// document.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The store rejected the identifier (e.g. path escapes the root).
    #[error("invalid document path: {0}")]
    InvalidPath(String),

    /// Transport-level failure.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// I/O failure in the store itself.
    #[error("remote I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error from the document-model provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Input text could not be interpreted as document content.
    #[error("malformed content: {0}")]
    Parse(String),

    /// The live model refused to swap in the snapshot.
    #[error("replace rejected: {0}")]
    Materialize(String),
}

/// Error surfaced from a save. Durable-cache failures are swallowed
/// upstream; by the time a save fails the local caches already hold the
/// edit, so the user's content is not lost.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The authoritative store rejected the write.
    #[error("remote write failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Error loading or parsing an engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

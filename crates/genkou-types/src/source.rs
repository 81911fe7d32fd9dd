//! Content provenance and identity types.
//!
//! [`Source`] names where a content candidate came from, and carries the
//! total priority order the reconciliation engine dispatches on:
//! `Remote < Durable < Volatile`. Volatile represents content already
//! applied to the live document model this session, so it always outranks
//! anything fetched from storage — most-recently-edited wins.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Where a content candidate came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Source {
    /// The authoritative backing store (server filesystem).
    Remote,
    /// The client-persisted cache, surviving reloads on one device.
    Durable,
    /// The in-memory copy for the running session.
    Volatile,
}

impl Source {
    /// Priority rank. Higher wins: Remote=1, Durable=2, Volatile=3.
    pub fn rank(self) -> u8 {
        match self {
            Source::Remote => 1,
            Source::Durable => 2,
            Source::Volatile => 3,
        }
    }

    /// All sources in descending priority order (highest first).
    pub fn by_descending_priority() -> [Source; 3] {
        [Source::Volatile, Source::Durable, Source::Remote]
    }
}

/// Short deterministic digest of a snapshot's canonical linear text.
///
/// Equal content always yields an equal fingerprint; used for no-op edit
/// detection and skipping redundant remote writes. Not security-sensitive.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already-computed digest string.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The digest as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

//! Document identifiers.
//!
//! A [`DocumentId`] is an opaque path-shaped string that names one document
//! consistently across every content source (remote store, durable cache,
//! volatile cache). The engine never interprets the path beyond equality
//! and hashing — path normalization is the caller's problem.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a document, stable across all content sources.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identifier from a path-shaped string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty (callers should treat this as
    /// "no document selected", not as a valid document).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

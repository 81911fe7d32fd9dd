//! Document-model provider interface.
//!
//! The editing surface is an external collaborator. The engine only needs
//! three things from it: parse linear text into a block snapshot,
//! serialize a snapshot back to canonical linear text, and atomically
//! replace the live editable content. [`crate::markdown::MarkdownModel`]
//! is the provided implementation; tests substitute their own.

use genkou_types::ContentSnapshot;

use crate::error::ModelError;

/// The opaque document-model provider.
///
/// `serialize` must be canonical: serializing the same logical snapshot
/// twice yields byte-identical text, so fingerprints computed over it are
/// stable. `replace_all` has replace-all semantics — the entire live
/// content is swapped atomically, never merged.
pub trait DocumentModel: Send + Sync {
    /// Parse linear text into a snapshot. Malformed input fails with
    /// [`ModelError::Parse`]; callers treat that as a candidate error,
    /// never a crash.
    fn parse(&self, text: &str) -> Result<ContentSnapshot, ModelError>;

    /// Serialize a snapshot to its canonical linear-text form.
    fn serialize(&self, snapshot: &ContentSnapshot) -> String;

    /// Atomically swap the live editable content.
    fn replace_all(&self, snapshot: ContentSnapshot) -> Result<(), ModelError>;

    /// The current live content.
    fn current(&self) -> ContentSnapshot;
}

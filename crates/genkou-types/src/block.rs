//! Block-level content model.
//!
//! A [`ContentSnapshot`] is the structured, in-memory representation of a
//! document: an ordered sequence of [`BlockNode`]s. It is deliberately
//! flat; the reconciliation engine only needs enough structure to carry
//! content between sources and to serialize back to linear markdown text.
//! Rich-text schemas (inline marks, nesting) live in the editing surface,
//! outside this crate.

use serde::{Deserialize, Serialize};

/// What a block is, at the granularity storage cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BlockKind {
    /// ATX heading; `level` is 1..=6.
    Heading { level: u8 },
    /// Plain paragraph text.
    Paragraph,
    /// Fenced code block; `lang` is the info string, if any.
    CodeFence { lang: Option<String> },
    /// A list item (flattened — nesting is the editor's concern).
    ListItem,
    /// Block quote.
    Quote,
    /// Thematic break (`---`).
    Rule,
}

/// One block of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    /// Block classification.
    #[serde(flatten)]
    pub kind: BlockKind,
    /// The block's source text, without trailing blank lines. For code
    /// fences this is the fence interior, not the backtick delimiters.
    pub text: String,
}

impl BlockNode {
    /// Create a block of the given kind.
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Shorthand for a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    /// Shorthand for a heading block.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading { level }, text)
    }
}

/// Ordered sequence of blocks — the structured form of a document.
///
/// An empty snapshot is valid content (a blank document), distinct from
/// "no content available" which the engine models as an absent candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSnapshot {
    pub blocks: Vec<BlockNode>,
}

impl ContentSnapshot {
    /// A valid, empty document.
    pub fn empty() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Build a snapshot from blocks.
    pub fn from_blocks(blocks: Vec<BlockNode>) -> Self {
        Self { blocks }
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the snapshot holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl FromIterator<BlockNode> for ContentSnapshot {
    fn from_iter<T: IntoIterator<Item = BlockNode>>(iter: T) -> Self {
        Self {
            blocks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_is_valid_content() {
        let snap = ContentSnapshot::empty();
        assert!(snap.is_empty());
        assert_eq!(snap.block_count(), 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let snap = ContentSnapshot::from_blocks(vec![
            BlockNode::heading(1, "Title"),
            BlockNode::paragraph("Body text."),
            BlockNode::new(
                BlockKind::CodeFence {
                    lang: Some("rust".into()),
                },
                "fn main() {}",
            ),
        ]);
        let json = serde_json::to_string(&snap).expect("serialize");
        let back: ContentSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snap);
    }

    #[test]
    fn test_block_kind_tagged_encoding() {
        let json = serde_json::to_string(&BlockNode::heading(2, "h")).expect("serialize");
        assert!(json.contains("\"kind\":\"heading\""), "got: {json}");
        assert!(json.contains("\"level\":2"), "got: {json}");
    }
}

//! Markdown block model.
//!
//! [`MarkdownModel`] is the default [`DocumentModel`] provider: it
//! segments linear markdown into top-level blocks with pulldown-cmark and
//! holds the live editable snapshot behind a lock. Serialization is
//! canonical — the same snapshot always produces byte-identical text, so
//! fingerprints computed over it are stable.
//!
//! The segmentation is deliberately shallow: nested structure inside a
//! list item or quote stays embedded in the block's text. The engine only
//! moves content between sources; rich structure belongs to the editor.

use genkou_types::{BlockKind, BlockNode, ContentSnapshot};
use parking_lot::RwLock;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use crate::error::ModelError;
use crate::model::DocumentModel;

/// Block-level markdown document model with a live snapshot.
#[derive(Debug, Default)]
pub struct MarkdownModel {
    live: RwLock<ContentSnapshot>,
}

impl MarkdownModel {
    /// Create a model with empty live content.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentModel for MarkdownModel {
    fn parse(&self, text: &str) -> Result<ContentSnapshot, ModelError> {
        // Markdown accepts nearly anything; an embedded NUL means the
        // payload is binary garbage from a corrupted source, not a document.
        if text.contains('\0') {
            return Err(ModelError::Parse("embedded NUL byte".into()));
        }

        let mut blocks = Vec::new();
        let mut depth = 0usize;
        for (event, range) in Parser::new_ext(text, Options::empty()).into_offset_iter() {
            match event {
                Event::Start(tag) => {
                    let slice = &text[range];
                    match (&tag, depth) {
                        // Lists don't become blocks themselves; their
                        // top-level items do.
                        (Tag::List(_), 0) => {}
                        (Tag::Item, 1) => {
                            blocks.push(BlockNode::new(BlockKind::ListItem, item_text(slice)));
                        }
                        (Tag::Heading { level, .. }, 0) => {
                            blocks.push(BlockNode::heading(*level as u8, heading_text(slice)));
                        }
                        (Tag::CodeBlock(kind), 0) => {
                            let lang = match kind {
                                CodeBlockKind::Fenced(info) if !info.is_empty() => {
                                    Some(info.to_string())
                                }
                                _ => None,
                            };
                            blocks.push(BlockNode::new(
                                BlockKind::CodeFence { lang },
                                code_text(slice),
                            ));
                        }
                        (Tag::BlockQuote(_), 0) => {
                            blocks.push(BlockNode::new(BlockKind::Quote, quote_text(slice)));
                        }
                        (Tag::Paragraph, 0) => {
                            blocks.push(BlockNode::paragraph(slice.trim()));
                        }
                        // Anything else at the top level (raw HTML blocks
                        // and friends) is carried as an opaque paragraph.
                        (_, 0) => {
                            blocks.push(BlockNode::paragraph(slice.trim()));
                        }
                        _ => {}
                    }
                    depth += 1;
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Rule if depth == 0 => {
                    blocks.push(BlockNode::new(BlockKind::Rule, ""));
                }
                _ => {}
            }
        }
        Ok(ContentSnapshot::from_blocks(blocks))
    }

    fn serialize(&self, snapshot: &ContentSnapshot) -> String {
        let mut out = String::new();
        for (i, block) in snapshot.blocks.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            match &block.kind {
                BlockKind::Heading { level } => {
                    for _ in 0..(*level).clamp(1, 6) {
                        out.push('#');
                    }
                    out.push(' ');
                    out.push_str(&block.text);
                }
                BlockKind::Paragraph => out.push_str(&block.text),
                BlockKind::CodeFence { lang } => {
                    out.push_str("```");
                    if let Some(lang) = lang {
                        out.push_str(lang);
                    }
                    out.push('\n');
                    out.push_str(&block.text);
                    if !block.text.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str("```");
                }
                BlockKind::ListItem => {
                    out.push_str("- ");
                    out.push_str(&block.text);
                }
                BlockKind::Quote => {
                    for (j, line) in block.text.lines().enumerate() {
                        if j > 0 {
                            out.push('\n');
                        }
                        out.push_str("> ");
                        out.push_str(line);
                    }
                }
                BlockKind::Rule => out.push_str("---"),
            }
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn replace_all(&self, snapshot: ContentSnapshot) -> Result<(), ModelError> {
        *self.live.write() = snapshot;
        Ok(())
    }

    fn current(&self) -> ContentSnapshot {
        self.live.read().clone()
    }
}

/// Heading text without the ATX markers (or setext underline).
fn heading_text(slice: &str) -> String {
    let t = slice.trim();
    if t.starts_with('#') {
        t.trim_start_matches('#').trim().to_string()
    } else {
        // Setext heading: drop the ===/--- underline.
        let mut lines: Vec<&str> = t.lines().collect();
        lines.pop();
        lines.join("\n").trim().to_string()
    }
}

/// Interior of a code block, without fence delimiters.
fn code_text(slice: &str) -> String {
    let t = slice.trim_end();
    if t.starts_with("```") || t.starts_with("~~~") {
        let mut lines: Vec<&str> = t.lines().collect();
        lines.remove(0);
        if lines
            .last()
            .is_some_and(|l| l.trim_start().starts_with("```") || l.trim_start().starts_with("~~~"))
        {
            lines.pop();
        }
        lines.join("\n")
    } else {
        // Indented code block: strip the four-space indent.
        t.lines()
            .map(|l| l.strip_prefix("    ").unwrap_or(l))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Quote interior without the `>` prefixes.
fn quote_text(slice: &str) -> String {
    slice
        .trim()
        .lines()
        .map(|l| {
            let l = l.trim_start();
            l.strip_prefix("> ").or_else(|| l.strip_prefix('>')).unwrap_or(l)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// List item text without its bullet or ordinal marker.
fn item_text(slice: &str) -> String {
    let t = slice.trim();
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = t.strip_prefix(marker) {
            return rest.trim_start().to_string();
        }
    }
    // Ordered markers: digits followed by `.` or `)`.
    let digits = t.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &t[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start().to_string();
        }
    }
    t.to_string()
}

//! Block scanning over raw source text.
//!
//! A block is a maximal, non-overlapping `<tag ...>...</tag>` region for
//! one of the allowed tags, found scanning left to right. The inner match
//! is minimal: the block closes at the *first* same-named closing tag, so
//! a block nested inside another block of the same name truncates the
//! outer one. Different tag names nest safely because the closer must
//! match the opener's name. This mirrors the historical matching behavior
//! and is deliberately not nesting-aware (see DESIGN.md).

use std::ops::Range;

/// Tags the scanner recognizes, tried in this order as prefixes of the
/// text after a `<`. Order matters only for overlapping prefixes; the
/// opening tag runs to the first `>`, so `<h1 class="x">` opens an `h1`
/// block and, notoriously, `<pre>` opens a `p` block.
pub const ALLOWED_TAGS: [&str; 11] = [
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "code", "table",
];

/// One scanned block: tag name, byte span in the source, and the raw
/// text of the whole region including both tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub tag: &'static str,
    pub span: Range<usize>,
    pub raw: &'a str,
}

/// A piece of the source document in order: either untouched text
/// between blocks or a scanned block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Passthrough(&'a str),
    Block(Block<'a>),
}

/// Scan the source into an ordered sequence of blocks and the
/// passthrough spans between them. Trailing text after the last block is
/// returned as a final `Passthrough` segment; deciding what to do with
/// it (escape and wrap as a paragraph) is the orchestrator's job.
pub fn scan(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut emitted = 0;
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let open_at = pos + offset;
        match match_block_at(text, open_at) {
            Some(block) => {
                if open_at > emitted {
                    segments.push(Segment::Passthrough(&text[emitted..open_at]));
                }
                emitted = block.span.end;
                pos = block.span.end;
                segments.push(Segment::Block(block));
            }
            // Not a block opener here; resume scanning one byte later.
            None => pos = open_at + 1,
        }
    }

    if emitted < text.len() {
        segments.push(Segment::Passthrough(&text[emitted..]));
    }

    segments
}

/// Try to match a block whose opening `<` sits at `open_at`.
fn match_block_at(text: &str, open_at: usize) -> Option<Block<'_>> {
    let after_angle = &text[open_at + 1..];
    let tag = *ALLOWED_TAGS
        .iter()
        .find(|tag| after_angle.starts_with(**tag))?;

    // The opening tag is anything up to the first `>` (attributes and all).
    let name_end = open_at + 1 + tag.len();
    let open_end = name_end + text[name_end..].find('>')? + 1;

    // Minimal inner match: first same-named closer wins.
    let closer = format!("</{tag}>");
    let close_at = open_end + text[open_end..].find(&closer)?;
    let end = close_at + closer.len();

    Some(Block {
        tag,
        span: open_at..end,
        raw: &text[open_at..end],
    })
}

//! Layered fallback resolution

use tracing::debug;

use crate::content::{Position, TextDocument};
use crate::highlights::Highlight;

/// Which fallback located the range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// `prefix + text + suffix` matched literally.
    FullContext,
    /// `prefix + text` matched.
    PrefixOnly,
    /// `text + suffix` matched.
    SuffixOnly,
    /// The stored offsets still hold the exact text.
    StoredOffsets,
    /// First literal occurrence of the bare text.
    BareText,
}

/// A highlight located in the current flattened text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: usize,
    pub end: usize,
    pub strategy: ResolveStrategy,
}

/// Locate a highlight's text in the current flattened content.
///
/// Strategies are tried in order, first success wins. Returns `None` when
/// every fallback misses; the caller simply omits the highlight from this
/// render pass.
pub fn resolve_range(highlight: &Highlight, current: &str) -> Option<ResolvedRange> {
    let text = highlight.text.as_str();
    if text.is_empty() {
        return None;
    }
    let prefix = highlight.prefix_context.as_str();
    let suffix = highlight.suffix_context.as_str();

    let full = format!("{prefix}{text}{suffix}");
    if let Some(found) = current.find(&full) {
        return Some(located(found + prefix.len(), text, ResolveStrategy::FullContext));
    }

    let with_prefix = format!("{prefix}{text}");
    if let Some(found) = current.find(&with_prefix) {
        return Some(located(found + prefix.len(), text, ResolveStrategy::PrefixOnly));
    }

    let with_suffix = format!("{text}{suffix}");
    if let Some(found) = current.find(&with_suffix) {
        return Some(located(found, text, ResolveStrategy::SuffixOnly));
    }

    if current.get(highlight.start_offset..highlight.end_offset) == Some(text) {
        return Some(located(
            highlight.start_offset,
            text,
            ResolveStrategy::StoredOffsets,
        ));
    }

    if let Some(found) = current.find(text) {
        return Some(located(found, text, ResolveStrategy::BareText));
    }

    None
}

fn located(start: usize, text: &str, strategy: ResolveStrategy) -> ResolvedRange {
    ResolvedRange {
        start,
        end: start + text.len(),
        strategy,
    }
}

/// Resolve a highlight against a live document and translate the flat range
/// back into concrete anchor positions.
///
/// The text spanned by the concrete anchors is re-read from the structure and
/// must equal the stored text byte-for-byte; any mismatch is treated as
/// resolution failure.
pub fn resolve_in_document(
    highlight: &Highlight,
    doc: &TextDocument,
) -> Option<(Position, Position)> {
    let flat = doc.flatten();
    let range = resolve_range(highlight, &flat)?;
    let start = doc.locate(range.start)?;
    let end = doc.locate_end(range.end)?;
    let spanned = doc.text_between(&start, &end)?;
    if spanned != highlight.text {
        debug!(
            id = %highlight.id,
            strategy = ?range.strategy,
            "anchor verification mismatch, dropping highlight for this pass"
        );
        return None;
    }
    Some((start, end))
}

//! Selection capture
//!
//! Converts a user text selection inside a content container into a portable
//! record: selected text, absolute byte offsets into the flattened text, and
//! bounded prefix/suffix context. Offsets and contexts reflect the exact
//! rendered state at the moment of capture; nothing guarantees they remain
//! valid after a re-render.

use tracing::debug;

use crate::highlights::CONTEXT_LEN;

use super::document::{Position, TextDocument};

/// Minimum selection length, in chars.
pub const MIN_SELECTION_CHARS: usize = 2;

/// Capture tuning
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Bytes of context kept on each side of the selection.
    pub context_len: usize,
    /// Selections shorter than this many chars are rejected.
    pub min_selection_chars: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            context_len: CONTEXT_LEN,
            min_selection_chars: MIN_SELECTION_CHARS,
        }
    }
}

/// A captured selection, ready to become a highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSelection {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub prefix_context: String,
    pub suffix_context: String,
}

/// What a selection event turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured(CapturedSelection),
    /// The selection landed on an existing marker: treat it as a request to
    /// remove that highlight.
    RemoveExisting(String),
    /// Too short, outside the container, or not on a char boundary.
    Rejected,
}

/// Capture a selection bounded by two concrete positions.
pub fn capture_selection(
    doc: &TextDocument,
    start: &Position,
    end: &Position,
    options: &CaptureOptions,
) -> CaptureOutcome {
    if let Some(id) = doc.marker_at(start) {
        return CaptureOutcome::RemoveExisting(id.to_string());
    }

    let (Some(start_offset), Some(end_offset)) =
        (doc.position_offset(start), doc.position_offset(end))
    else {
        debug!("selection outside the container, ignoring");
        return CaptureOutcome::Rejected;
    };
    // Selections made right-to-left arrive inverted.
    let (start_offset, end_offset) = if start_offset <= end_offset {
        (start_offset, end_offset)
    } else {
        (end_offset, start_offset)
    };

    let flat = doc.flatten();
    let Some(text) = flat.get(start_offset..end_offset) else {
        return CaptureOutcome::Rejected;
    };
    if text.chars().count() < options.min_selection_chars {
        return CaptureOutcome::Rejected;
    }

    let mut prefix_start = start_offset.saturating_sub(options.context_len);
    while !flat.is_char_boundary(prefix_start) {
        prefix_start += 1;
    }
    let mut suffix_end = (end_offset + options.context_len).min(flat.len());
    while !flat.is_char_boundary(suffix_end) {
        suffix_end -= 1;
    }

    CaptureOutcome::Captured(CapturedSelection {
        text: text.to_string(),
        start_offset,
        end_offset,
        prefix_context: flat[prefix_start..start_offset].to_string(),
        suffix_context: flat[end_offset..suffix_end].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlights::HighlightColor;

    fn doc() -> TextDocument {
        TextDocument::from_paragraphs(&["The quick brown fox jumps over the lazy dog"])
    }

    fn capture(d: &TextDocument, start: usize, end: usize) -> CaptureOutcome {
        let start = d.locate(start).unwrap();
        let end = d.locate_end(end).unwrap();
        capture_selection(d, &start, &end, &CaptureOptions::default())
    }

    #[test]
    fn test_capture_offsets_and_context() {
        let CaptureOutcome::Captured(sel) = capture(&doc(), 10, 19) else {
            panic!("expected capture");
        };
        assert_eq!(sel.text, "brown fox");
        assert_eq!(sel.start_offset, 10);
        assert_eq!(sel.end_offset, 19);
        assert_eq!(sel.prefix_context, "The quick ");
        assert_eq!(sel.suffix_context, " jumps over the lazy dog");
    }

    #[test]
    fn test_context_clamped_at_bounds() {
        let CaptureOutcome::Captured(sel) = capture(&doc(), 0, 3) else {
            panic!("expected capture");
        };
        assert_eq!(sel.text, "The");
        assert_eq!(sel.prefix_context, "");
        assert_eq!(sel.suffix_context, " quick brown fox jumps over th");
        assert_eq!(sel.suffix_context.len(), CONTEXT_LEN);
    }

    #[test]
    fn test_inverted_selection_normalized() {
        let d = doc();
        let start = d.locate(19).unwrap();
        let end = d.locate_end(10).unwrap();
        let CaptureOutcome::Captured(sel) =
            capture_selection(&d, &start, &end, &CaptureOptions::default())
        else {
            panic!("expected capture");
        };
        assert_eq!(sel.text, "brown fox");
    }

    #[test]
    fn test_short_selection_rejected() {
        assert_eq!(capture(&doc(), 10, 11), CaptureOutcome::Rejected);
    }

    #[test]
    fn test_selection_outside_container_rejected() {
        let d = doc();
        let bogus = Position {
            block: 7,
            run: 0,
            offset: 0,
        };
        let end = d.locate_end(5).unwrap();
        assert_eq!(
            capture_selection(&d, &bogus, &end, &CaptureOptions::default()),
            CaptureOutcome::Rejected
        );
    }

    #[test]
    fn test_selection_on_marker_requests_removal() {
        let mut d = doc();
        let start = d.locate(10).unwrap();
        let end = d.locate_end(19).unwrap();
        d.wrap_range(&start, &end, "h1", HighlightColor::Yellow).unwrap();

        let inside = d.locate(12).unwrap();
        assert_eq!(
            capture_selection(&d, &inside, &inside, &CaptureOptions::default()),
            CaptureOutcome::RemoveExisting("h1".to_string())
        );
    }

    #[test]
    fn test_multibyte_context_clamps_to_char_boundary() {
        let d = TextDocument::from_paragraphs(&["día y noche — el camión rápido se detuvo aquí"]);
        let flat = d.flatten();
        let start_byte = flat.find("camión").unwrap();
        let end_byte = start_byte + "camión".len();
        let start = d.locate(start_byte).unwrap();
        let end = d.locate_end(end_byte).unwrap();
        let CaptureOutcome::Captured(sel) =
            capture_selection(&d, &start, &end, &CaptureOptions::default())
        else {
            panic!("expected capture");
        };
        assert_eq!(sel.text, "camión");
        assert!(sel.prefix_context.len() <= CONTEXT_LEN);
        assert!(flat.ends_with(&format!("{}{}", sel.text, sel.suffix_context)));
    }
}

//! Block/run text model

use thiserror::Error;

use crate::highlights::HighlightColor;

/// One run of content inside a block: plain text, or text wrapped by a
/// highlight marker. Marker text is still content and contributes to the
/// flattened string.
#[derive(Debug, Clone, PartialEq)]
pub enum Run {
    Text(String),
    Marker {
        highlight_id: String,
        color: HighlightColor,
        text: String,
    },
}

impl Run {
    pub fn text(&self) -> &str {
        match self {
            Run::Text(text) => text,
            Run::Marker { text, .. } => text,
        }
    }

    fn len(&self) -> usize {
        self.text().len()
    }
}

/// A sibling element in the rendered structure. Markers cannot span across
/// blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub runs: Vec<Run>,
}

impl Block {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::Text(text.into())],
        }
    }

    fn len(&self) -> usize {
        self.runs.iter().map(Run::len).sum()
    }
}

/// Concrete anchor: a position inside the rendered structure.
///
/// `offset` is a byte offset within the run's text and may equal the run
/// length (end-of-run), mirroring how range endpoints behave in a live
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub block: usize,
    pub run: usize,
    pub offset: usize,
}

/// Why a concrete range could not be wrapped
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WrapError {
    #[error("range spans a block boundary")]
    CrossesBlockBoundary,

    #[error("range cuts into an existing marker")]
    OverlapsMarker,

    #[error("position out of bounds")]
    OutOfBounds,

    #[error("range is empty or inverted")]
    EmptyRange,
}

/// The rendered state of one logical content unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDocument {
    pub blocks: Vec<Block>,
}

impl TextDocument {
    /// Build a document with one text run per paragraph.
    pub fn from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        Self {
            blocks: paragraphs
                .iter()
                .map(|p| Block::text(p.as_ref()))
                .collect(),
        }
    }

    /// Concatenate every run's text in document order. No synthetic
    /// separators are inserted between blocks.
    pub fn flatten(&self) -> String {
        let mut out = String::with_capacity(self.len());
        for block in &self.blocks {
            for run in &block.runs {
                out.push_str(run.text());
            }
        }
        out
    }

    /// Total length of the flattened text in bytes.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Translate an absolute offset in the flattened text into a concrete
    /// position. A boundary offset attaches to the start of the following
    /// run; the document end attaches to the end of the last run.
    pub fn locate(&self, flat_offset: usize) -> Option<Position> {
        let mut remaining = flat_offset;
        let mut last = None;
        for (bi, block) in self.blocks.iter().enumerate() {
            for (ri, run) in block.runs.iter().enumerate() {
                let len = run.len();
                if remaining < len {
                    return Some(Position {
                        block: bi,
                        run: ri,
                        offset: remaining,
                    });
                }
                remaining -= len;
                last = Some(Position {
                    block: bi,
                    run: ri,
                    offset: len,
                });
            }
        }
        if remaining == 0 {
            last
        } else {
            None
        }
    }

    /// Like [`locate`](Self::locate), for a range end: a boundary offset
    /// attaches to the end of the preceding run so a range ending exactly at
    /// a block boundary stays inside that block.
    pub fn locate_end(&self, flat_offset: usize) -> Option<Position> {
        if flat_offset == 0 {
            return self.blocks.first().and_then(|b| {
                b.runs.first().map(|_| Position {
                    block: 0,
                    run: 0,
                    offset: 0,
                })
            });
        }
        let mut remaining = flat_offset;
        for (bi, block) in self.blocks.iter().enumerate() {
            for (ri, run) in block.runs.iter().enumerate() {
                let len = run.len();
                if remaining <= len {
                    return Some(Position {
                        block: bi,
                        run: ri,
                        offset: remaining,
                    });
                }
                remaining -= len;
            }
        }
        None
    }

    /// Absolute offset of a concrete position in the flattened text.
    pub fn position_offset(&self, pos: &Position) -> Option<usize> {
        let block = self.blocks.get(pos.block)?;
        let run = block.runs.get(pos.run)?;
        if pos.offset > run.len() {
            return None;
        }
        let mut offset = 0;
        for b in &self.blocks[..pos.block] {
            offset += b.len();
        }
        for r in &block.runs[..pos.run] {
            offset += r.len();
        }
        Some(offset + pos.offset)
    }

    /// Text spanned between two concrete positions, read by walking the live
    /// structure.
    pub fn text_between(&self, start: &Position, end: &Position) -> Option<String> {
        let start_offset = self.position_offset(start)?;
        let end_offset = self.position_offset(end)?;
        if end_offset < start_offset {
            return None;
        }
        let mut out = String::with_capacity(end_offset - start_offset);
        let mut cursor = 0;
        for block in &self.blocks {
            for run in &block.runs {
                let text = run.text();
                let run_start = cursor;
                let run_end = cursor + text.len();
                if run_end > start_offset && run_start < end_offset {
                    let from = start_offset.saturating_sub(run_start);
                    let to = (end_offset - run_start).min(text.len());
                    out.push_str(text.get(from..to)?);
                }
                cursor = run_end;
            }
        }
        Some(out)
    }

    /// Highlight id of the marker containing a position, if any.
    pub fn marker_at(&self, pos: &Position) -> Option<&str> {
        let run = self.blocks.get(pos.block)?.runs.get(pos.run)?;
        match run {
            Run::Marker { highlight_id, .. } => Some(highlight_id),
            Run::Text(_) => None,
        }
    }

    /// Ids of every marker currently applied, in document order.
    pub fn marker_ids(&self) -> Vec<String> {
        self.blocks
            .iter()
            .flat_map(|b| &b.runs)
            .filter_map(|r| match r {
                Run::Marker { highlight_id, .. } => Some(highlight_id.clone()),
                Run::Text(_) => None,
            })
            .collect()
    }

    pub fn contains_marker(&self, highlight_id: &str) -> bool {
        self.blocks.iter().flat_map(|b| &b.runs).any(|r| {
            matches!(r, Run::Marker { highlight_id: id, .. } if id == highlight_id)
        })
    }

    /// Wrap the range between two concrete positions with a tagged marker.
    ///
    /// The range must stay within one block and must not cut into an existing
    /// marker; runs covered by the range are merged into the marker text.
    pub fn wrap_range(
        &mut self,
        start: &Position,
        end: &Position,
        highlight_id: &str,
        color: HighlightColor,
    ) -> Result<(), WrapError> {
        let abs_start = self
            .position_offset(start)
            .ok_or(WrapError::OutOfBounds)?;
        let abs_end = self.position_offset(end).ok_or(WrapError::OutOfBounds)?;
        if abs_end <= abs_start {
            return Err(WrapError::EmptyRange);
        }

        // Find the block whose span contains the whole range.
        let mut block_start = 0;
        let mut target = None;
        for (bi, block) in self.blocks.iter().enumerate() {
            let block_end = block_start + block.len();
            if abs_start >= block_start && abs_start < block_end {
                if abs_end > block_end {
                    return Err(WrapError::CrossesBlockBoundary);
                }
                target = Some((bi, abs_start - block_start, abs_end - block_start));
                break;
            }
            block_start = block_end;
        }
        let (bi, rel_start, rel_end) = target.ok_or(WrapError::OutOfBounds)?;

        let block = &self.blocks[bi];
        let mut before = Vec::new();
        let mut inside = String::new();
        let mut after = Vec::new();
        let mut cursor = 0;
        for run in &block.runs {
            let text = run.text();
            let run_start = cursor;
            let run_end = cursor + text.len();
            cursor = run_end;

            if run_end <= rel_start {
                before.push(run.clone());
                continue;
            }
            if run_start >= rel_end {
                after.push(run.clone());
                continue;
            }

            // The run intersects the range.
            let from = rel_start.saturating_sub(run_start);
            let to = (rel_end - run_start).min(text.len());
            if let Run::Marker { .. } = run {
                // Partially or fully covered markers cannot be re-wrapped.
                return Err(WrapError::OverlapsMarker);
            }
            let head = text.get(..from).ok_or(WrapError::OutOfBounds)?;
            let body = text.get(from..to).ok_or(WrapError::OutOfBounds)?;
            let tail = text.get(to..).ok_or(WrapError::OutOfBounds)?;
            if !head.is_empty() {
                before.push(Run::Text(head.to_string()));
            }
            inside.push_str(body);
            if !tail.is_empty() {
                after.push(Run::Text(tail.to_string()));
            }
        }

        let mut runs = before;
        runs.push(Run::Marker {
            highlight_id: highlight_id.to_string(),
            color,
            text: inside,
        });
        runs.extend(after);
        self.blocks[bi].runs = runs;
        Ok(())
    }

    /// Remove a marker, replacing it with plain text and merging any
    /// now-adjacent text runs. Returns whether a marker was removed.
    pub fn unwrap_marker(&mut self, highlight_id: &str) -> bool {
        let mut removed = false;
        for block in &mut self.blocks {
            let mut merged: Vec<Run> = Vec::with_capacity(block.runs.len());
            for run in block.runs.drain(..) {
                let run = match run {
                    Run::Marker {
                        highlight_id: id,
                        text,
                        ..
                    } if id == highlight_id => {
                        removed = true;
                        Run::Text(text)
                    }
                    other => other,
                };
                match (merged.last_mut(), &run) {
                    (Some(Run::Text(prev)), Run::Text(next)) => prev.push_str(next),
                    _ => merged.push(run),
                }
            }
            block.runs = merged;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> TextDocument {
        TextDocument::from_paragraphs(&["The quick brown fox", " jumps over the lazy dog"])
    }

    #[test]
    fn test_flatten_concatenates_blocks() {
        assert_eq!(doc().flatten(), "The quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_locate_round_trip() {
        let d = doc();
        for offset in [0, 4, 18, 19, 20, d.len()] {
            let pos = d.locate(offset).unwrap();
            assert_eq!(d.position_offset(&pos), Some(offset), "offset {offset}");
        }
        assert!(d.locate(d.len() + 1).is_none());
    }

    #[test]
    fn test_locate_end_stays_in_block() {
        let d = doc();
        // End of the first block (offset 19) must not attach to block 1.
        let pos = d.locate_end(19).unwrap();
        assert_eq!(pos.block, 0);
        assert_eq!(pos.offset, 19);
        // A start at the same offset attaches to block 1.
        let pos = d.locate(19).unwrap();
        assert_eq!(pos.block, 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_wrap_splits_runs() {
        let mut d = doc();
        let start = d.locate(10).unwrap();
        let end = d.locate_end(19).unwrap();
        d.wrap_range(&start, &end, "h1", HighlightColor::Yellow).unwrap();

        assert_eq!(d.blocks[0].runs.len(), 2);
        assert_eq!(d.blocks[0].runs[0], Run::Text("The quick ".to_string()));
        assert_eq!(
            d.blocks[0].runs[1],
            Run::Marker {
                highlight_id: "h1".to_string(),
                color: HighlightColor::Yellow,
                text: "brown fox".to_string(),
            }
        );
        // Flattened text is unchanged by wrapping.
        assert_eq!(d.flatten(), doc().flatten());
    }

    #[test]
    fn test_wrap_across_blocks_fails() {
        let mut d = doc();
        let start = d.locate(16).unwrap();
        let end = d.locate_end(25).unwrap();
        assert_eq!(
            d.wrap_range(&start, &end, "h1", HighlightColor::Yellow),
            Err(WrapError::CrossesBlockBoundary)
        );
        assert_eq!(d, doc());
    }

    #[test]
    fn test_wrap_overlapping_marker_fails() {
        let mut d = doc();
        let start = d.locate(10).unwrap();
        let end = d.locate_end(19).unwrap();
        d.wrap_range(&start, &end, "h1", HighlightColor::Yellow).unwrap();

        let start = d.locate(4).unwrap();
        let end = d.locate_end(15).unwrap();
        assert_eq!(
            d.wrap_range(&start, &end, "h2", HighlightColor::Green),
            Err(WrapError::OverlapsMarker)
        );
    }

    #[test]
    fn test_unwrap_merges_adjacent_text() {
        let mut d = doc();
        let start = d.locate(10).unwrap();
        let end = d.locate_end(19).unwrap();
        d.wrap_range(&start, &end, "h1", HighlightColor::Yellow).unwrap();

        assert!(d.unwrap_marker("h1"));
        assert_eq!(d, doc());
        assert!(!d.unwrap_marker("h1"));
    }

    #[test]
    fn test_marker_at() {
        let mut d = doc();
        let start = d.locate(10).unwrap();
        let end = d.locate_end(19).unwrap();
        d.wrap_range(&start, &end, "h1", HighlightColor::Yellow).unwrap();

        let inside = d.locate(12).unwrap();
        assert_eq!(d.marker_at(&inside), Some("h1"));
        let outside = d.locate(2).unwrap();
        assert_eq!(d.marker_at(&outside), None);
    }

    #[test]
    fn test_text_between_walks_structure() {
        let mut d = doc();
        let start = d.locate(10).unwrap();
        let end = d.locate_end(19).unwrap();
        d.wrap_range(&start, &end, "h1", HighlightColor::Yellow).unwrap();

        let start = d.locate(4).unwrap();
        let end = d.locate_end(25).unwrap();
        assert_eq!(
            d.text_between(&start, &end).unwrap(),
            "quick brown fox jumps"
        );
    }
}

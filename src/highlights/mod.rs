//! Highlight module
//!
//! The core entity and its wire representation.
//!
//! A highlight records the exact text selected, its offsets into the
//! flattened content at capture time, and bounded prefix/suffix context used
//! to re-locate the span after the content re-renders. The tuple
//! `(page, start_offset, end_offset)` is the deduplication signature: two
//! records sharing it for one owner are the same highlight.

mod types;
mod wire;

pub use types::{
    ContentKind, DedupKey, Highlight, HighlightColor, PageRef, CONTEXT_LEN, LOCAL_ID_PREFIX,
};
pub use wire::HighlightRecord;

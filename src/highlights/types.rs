//! Highlight types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bytes of context captured on each side of a selection, clamped to char
/// boundaries.
pub const CONTEXT_LEN: usize = 30;

/// Prefix marking ids that have not yet been assigned by the remote store.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Kind of content unit a highlight is anchored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Topic,
    Section,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Topic => "topic",
            ContentKind::Section => "section",
        }
    }
}

/// Structured identifier for a logical content unit.
///
/// Distinct content units never share offset spaces. The opaque composite
/// form (`"topic:intro"`) exists only at the wire and cache-key boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub content_id: String,
    pub kind: ContentKind,
}

impl PageRef {
    pub fn topic(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            kind: ContentKind::Topic,
        }
    }

    pub fn section(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            kind: ContentKind::Section,
        }
    }

    /// Opaque composite key for the wire and cache boundary.
    pub fn to_key(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.content_id)
    }

    /// Parse a composite key back into a structured reference.
    ///
    /// Lenient: an unknown or missing kind prefix parses as a topic with the
    /// full string as the content id, so a stale cache key never aborts a
    /// load.
    pub fn parse_key(key: &str) -> Self {
        match key.split_once(':') {
            Some(("topic", id)) => PageRef::topic(id),
            Some(("section", id)) => PageRef::section(id),
            _ => PageRef::topic(key),
        }
    }
}

/// Highlight palette. Lowercase on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Orange,
}

impl HighlightColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Orange => "orange",
        }
    }

    /// Parse a wire color, defaulting to yellow for unknown values.
    pub fn parse(value: &str) -> Self {
        match value {
            "green" => HighlightColor::Green,
            "blue" => HighlightColor::Blue,
            "pink" => HighlightColor::Pink,
            "orange" => HighlightColor::Orange,
            _ => HighlightColor::Yellow,
        }
    }
}

/// Deduplication signature: two records with the same signature for the same
/// owner collapse to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub page: PageRef,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// A persisted, re-locatable user annotation over a substring of rendered
/// content
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    /// Locally generated (provisional) until the remote store assigns a
    /// durable id. Ids are never reused.
    pub id: String,
    pub owner_id: String,
    pub page: PageRef,
    /// The exact substring selected at capture time.
    pub text: String,
    /// Byte offset into the page's flattened text at capture time. Not
    /// guaranteed valid on subsequent renders.
    pub start_offset: usize,
    pub end_offset: usize,
    /// Up to [`CONTEXT_LEN`] bytes immediately before the selection.
    pub prefix_context: String,
    /// Up to [`CONTEXT_LEN`] bytes immediately after the selection.
    pub suffix_context: String,
    pub color: HighlightColor,
    pub created_at: DateTime<Utc>,
}

impl Highlight {
    /// Create a provisional highlight with a locally generated id.
    ///
    /// `end_offset` is derived from the text so the offset invariant holds by
    /// construction.
    pub fn new_local(
        owner_id: &str,
        page: PageRef,
        text: impl Into<String>,
        start_offset: usize,
        prefix_context: impl Into<String>,
        suffix_context: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let end_offset = start_offset + text.len();
        Self {
            id: format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4()),
            owner_id: owner_id.to_string(),
            page,
            text,
            start_offset,
            end_offset,
            prefix_context: prefix_context.into(),
            suffix_context: suffix_context.into(),
            color: HighlightColor::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_color(mut self, color: HighlightColor) -> Self {
        self.color = color;
        self
    }

    /// Whether the id is still locally generated, awaiting remote assignment.
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            page: self.page.clone(),
            start_offset: self.start_offset,
            end_offset: self.end_offset,
        }
    }
}

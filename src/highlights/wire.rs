//! Flat wire representation
//!
//! Shared by the remote store and the durable cache. Field names are flat
//! snake_case; the page reference collapses to its opaque composite key at
//! this boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Highlight, HighlightColor, PageRef};

/// One highlight as stored remotely or in a cache snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightRecord {
    pub id: String,
    pub owner_id: String,
    pub page_id: String,
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub color: String,
    #[serde(default)]
    pub prefix_context: String,
    #[serde(default)]
    pub suffix_context: String,
    pub created_at: DateTime<Utc>,
}

impl HighlightRecord {
    pub fn from_highlight(h: &Highlight) -> Self {
        Self {
            id: h.id.clone(),
            owner_id: h.owner_id.clone(),
            page_id: h.page.to_key(),
            text: h.text.clone(),
            start_offset: h.start_offset,
            end_offset: h.end_offset,
            color: h.color.as_str().to_string(),
            prefix_context: h.prefix_context.clone(),
            suffix_context: h.suffix_context.clone(),
            created_at: h.created_at,
        }
    }

    /// Validate and convert. Records missing an id or text are rejected so a
    /// partially trusted store entry never reaches the in-memory list.
    pub fn into_highlight(self) -> Option<Highlight> {
        if self.id.is_empty() || self.text.is_empty() {
            return None;
        }
        Some(Highlight {
            id: self.id,
            owner_id: self.owner_id,
            page: PageRef::parse_key(&self.page_id),
            text: self.text,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            prefix_context: self.prefix_context,
            suffix_context: self.suffix_context,
            color: HighlightColor::parse(&self.color),
            created_at: self.created_at,
        })
    }
}

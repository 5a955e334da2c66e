//! Cross-component change notification

use crate::highlights::PageRef;

/// Advisory "highlights changed" event.
///
/// Subscribers (a progress summary view, for instance) must re-query the
/// coordinator rather than trust this payload as complete state.
#[derive(Debug, Clone)]
pub struct HighlightsChanged {
    pub owner_id: String,
    /// The affected page, when the change was scoped to one.
    pub page: Option<PageRef>,
}

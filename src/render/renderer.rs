//! Marker reconciliation

use std::collections::HashSet;

use tracing::debug;

use crate::anchor::resolve_in_document;
use crate::content::TextDocument;
use crate::highlights::Highlight;

/// Result of one reconciliation pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Markers newly applied this pass.
    pub applied: usize,
    /// Markers removed this pass.
    pub removed: usize,
    /// Highlight ids that could not be rendered (anchor miss or a range the
    /// structure cannot wrap). Skipping is silent; the pass never fails.
    pub skipped: Vec<String>,
}

/// Tracks which highlight ids are currently applied to one container
#[derive(Debug, Default)]
pub struct SpanRenderer {
    applied: HashSet<String>,
}

impl SpanRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids currently tracked as applied.
    pub fn applied_ids(&self) -> &HashSet<String> {
        &self.applied
    }

    /// Reconcile the document's markers against the desired highlight set.
    ///
    /// Removes markers for ids no longer desired, applies markers for ids
    /// desired but not yet applied, and never re-applies a tracked id.
    pub fn reconcile(
        &mut self,
        doc: &mut TextDocument,
        desired: &[Highlight],
    ) -> ReconcileOutcome {
        let desired_ids: HashSet<&str> = desired.iter().map(|h| h.id.as_str()).collect();
        let mut outcome = ReconcileOutcome::default();

        let stale: Vec<String> = self
            .applied
            .iter()
            .filter(|id| !desired_ids.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            doc.unwrap_marker(&id);
            self.applied.remove(&id);
            outcome.removed += 1;
        }

        for highlight in desired {
            if self.applied.contains(&highlight.id) {
                continue;
            }
            let Some((start, end)) = resolve_in_document(highlight, doc) else {
                outcome.skipped.push(highlight.id.clone());
                continue;
            };
            match doc.wrap_range(&start, &end, &highlight.id, highlight.color) {
                Ok(()) => {
                    self.applied.insert(highlight.id.clone());
                    outcome.applied += 1;
                }
                Err(err) => {
                    debug!(id = %highlight.id, %err, "cannot wrap resolved range, skipping");
                    outcome.skipped.push(highlight.id.clone());
                }
            }
        }

        outcome
    }

    /// Forget all tracking, e.g. when the container was rebuilt from scratch.
    pub fn reset(&mut self) {
        self.applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlights::PageRef;

    fn doc() -> TextDocument {
        TextDocument::from_paragraphs(&["The quick brown fox jumps over the lazy dog"])
    }

    fn highlight(id: &str, text: &str, start: usize, prefix: &str, suffix: &str) -> Highlight {
        let mut h =
            Highlight::new_local("owner-1", PageRef::topic("intro"), text, start, prefix, suffix);
        h.id = id.to_string();
        h
    }

    #[test]
    fn test_apply_and_remove() {
        let mut d = doc();
        let mut renderer = SpanRenderer::new();
        let h = highlight("h1", "brown fox", 10, "The quick ", " jumps ov");

        let outcome = renderer.reconcile(&mut d, std::slice::from_ref(&h));
        assert_eq!(outcome.applied, 1);
        assert!(d.contains_marker("h1"));

        let outcome = renderer.reconcile(&mut d, &[]);
        assert_eq!(outcome.removed, 1);
        assert!(!d.contains_marker("h1"));
        assert_eq!(d, doc());
    }

    #[test]
    fn test_idempotent_apply() {
        let mut d = doc();
        let mut renderer = SpanRenderer::new();
        let h = highlight("h1", "brown fox", 10, "The quick ", " jumps ov");

        renderer.reconcile(&mut d, std::slice::from_ref(&h));
        let second = renderer.reconcile(&mut d, std::slice::from_ref(&h));

        assert_eq!(second, ReconcileOutcome::default());
        assert_eq!(d.marker_ids(), vec!["h1".to_string()]);
    }

    #[test]
    fn test_anchor_miss_skips_silently() {
        let mut d = doc();
        let mut renderer = SpanRenderer::new();
        let gone = highlight("h1", "purple cat", 10, "", "");
        let ok = highlight("h2", "lazy dog", 35, "over the ", "");

        let outcome = renderer.reconcile(&mut d, &[gone, ok]);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, vec!["h1".to_string()]);
        assert!(d.contains_marker("h2"));
    }

    #[test]
    fn test_cross_block_range_skipped() {
        let mut d =
            TextDocument::from_paragraphs(&["The quick brown ", "fox jumps over the lazy dog"]);
        let mut renderer = SpanRenderer::new();
        // "brown fox" spans the block boundary; the pass keeps going.
        let crossing = highlight("h1", "brown fox", 10, "The quick ", " jumps ov");
        let ok = highlight("h2", "lazy dog", 35, "over the ", "");

        let outcome = renderer.reconcile(&mut d, &[crossing, ok]);
        assert_eq!(outcome.skipped, vec!["h1".to_string()]);
        assert_eq!(outcome.applied, 1);
        assert!(!d.contains_marker("h1"));
        assert!(d.contains_marker("h2"));
    }

    #[test]
    fn test_id_rewrite_swaps_marker() {
        let mut d = doc();
        let mut renderer = SpanRenderer::new();
        let provisional = highlight("local-1", "brown fox", 10, "The quick ", " jumps ov");
        renderer.reconcile(&mut d, std::slice::from_ref(&provisional));

        // After remote promotion the same highlight arrives under its new id.
        let promoted = highlight("remote-1", "brown fox", 10, "The quick ", " jumps ov");
        let outcome = renderer.reconcile(&mut d, std::slice::from_ref(&promoted));
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.applied, 1);
        assert_eq!(d.marker_ids(), vec!["remote-1".to_string()]);
    }

    #[test]
    fn test_reset_forgets_tracking() {
        let mut d = doc();
        let mut renderer = SpanRenderer::new();
        let h = highlight("h1", "brown fox", 10, "The quick ", " jumps ov");
        renderer.reconcile(&mut d, std::slice::from_ref(&h));

        // Fresh render of the same content from scratch.
        let mut d = doc();
        renderer.reset();
        let outcome = renderer.reconcile(&mut d, std::slice::from_ref(&h));
        assert_eq!(outcome.applied, 1);
        assert!(d.contains_marker("h1"));
    }
}

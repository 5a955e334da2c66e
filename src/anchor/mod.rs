//! Anchor resolution
//!
//! Stored offsets go stale the moment content re-renders: a different topic
//! loads, markup is regenerated, whitespace is normalized. Resolution
//! searches the *current* flattened text with a layered fallback, trading
//! specificity for robustness: an exact context match survives reflow and
//! minor edits; bare text survives aggressive changes at the cost of possible
//! misplacement when the same phrase repeats. That imprecision is accepted
//! behavior, not a defect.

mod resolver;

pub use resolver::{resolve_in_document, resolve_range, ResolveStrategy, ResolvedRange};

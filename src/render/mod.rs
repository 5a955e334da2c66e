//! Span rendering
//!
//! Applies and removes highlight markers over a rendered container,
//! reconciling against the set already applied so repeated passes never
//! double-wrap a highlight or leak markers.

mod renderer;

pub use renderer::{ReconcileOutcome, SpanRenderer};

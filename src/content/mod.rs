//! Rendered-content model and selection capture
//!
//! A server-side stand-in for the rendering environment: ordered blocks of
//! text runs that can be flattened to a single string, addressed by absolute
//! byte offset, and wrapped with highlight markers. Any environment offering
//! the same four capabilities (enumerate text in document order, translate an
//! absolute offset to a concrete position, wrap a concrete range, surface a
//! selection as concrete positions) can stand in for [`TextDocument`].

mod document;
mod selection;

pub use document::{Block, Position, Run, TextDocument, WrapError};
pub use selection::{capture_selection, CaptureOptions, CaptureOutcome, CapturedSelection};

//! Subrayado
//!
//! Re-locatable text highlights for dynamically rendered content. A reader
//! selects text, the selection is captured with surrounding context, and the
//! highlight survives reloads, re-renders, and identity changes: stored
//! offsets go stale the moment content re-renders, so highlights are
//! re-anchored by approximate content matching and synchronized across an
//! in-memory list, a durable per-owner cache, and a remote store that is only
//! reachable when authenticated.
//!
//! # Modules
//!
//! - `content`: rendered-content model and selection capture
//! - `anchor`: layered anchor resolution against re-rendered content
//! - `render`: marker application and removal with idempotent reconciliation
//! - `cache`: durable per-owner highlight snapshots
//! - `remote`: remote persistence adapter and its SQLite implementation
//! - `sync`: the coordinator owning the in-memory list and all mutations

pub mod anchor;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod highlights;
pub mod identity;
pub mod remote;
pub mod render;
pub mod sync;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use highlights::{
    ContentKind, DedupKey, Highlight, HighlightColor, HighlightRecord, PageRef,
};
pub use identity::OwnerIdentity;

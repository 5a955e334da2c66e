//! Durable highlight cache
//!
//! An origin-scoped, per-owner snapshot of highlights, written after every
//! mutation and read at startup for instant, offline-capable restoration.
//! Every operation is best-effort: storage unavailability degrades to empty
//! reads and no-op writes, never to an error the caller must handle.

mod store;

pub use store::{CacheStore, JsonFileCache, MemoryCache, OwnerBackup};

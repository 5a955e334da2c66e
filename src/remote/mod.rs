//! Remote persistence adapter
//!
//! CRUD over a remote store keyed by owner identity, reachable only when
//! authenticated. Every call is fallible and every caller recovers locally:
//! a failed insert leaves the record provisional in the cache, a failed
//! delete never reverts a local removal.

use async_trait::async_trait;
use thiserror::Error;

use crate::highlights::HighlightRecord;

mod sqlite;

pub use sqlite::SqliteRemote;

/// Remote store errors
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// CRUD interface over the remote highlight store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All highlights for an owner, creation-time ascending.
    async fn list_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<HighlightRecord>>;

    /// Insert a highlight under an owner. The store assigns a durable id and
    /// returns the stored record, or `None` when it declines the insert.
    async fn insert(
        &self,
        owner_id: &str,
        record: &HighlightRecord,
    ) -> RemoteResult<Option<HighlightRecord>>;

    /// Delete by id. Returns whether a record was deleted.
    async fn delete(&self, id: &str) -> RemoteResult<bool>;

    /// Delete everything an owner has. Returns whether anything was deleted.
    async fn delete_all_by_owner(&self, owner_id: &str) -> RemoteResult<bool>;
}

//! SQLite-backed remote store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::highlights::HighlightRecord;

use super::{RemoteResult, RemoteStore};

/// Repository over a SQLite highlight table
#[derive(Debug, Clone)]
pub struct SqliteRemote {
    pool: SqlitePool,
}

impl SqliteRemote {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a database URL and initialize the schema.
    pub async fn connect(url: &str) -> RemoteResult<Self> {
        let pool = SqlitePool::connect(url).await?;
        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Open an in-memory store. A single connection keeps every caller on
    /// the same database.
    pub async fn in_memory() -> RemoteResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Initialize the highlights table
    pub async fn init(&self) -> RemoteResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS highlights (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                page_id TEXT NOT NULL,
                text TEXT NOT NULL,
                start_offset INTEGER NOT NULL,
                end_offset INTEGER NOT NULL,
                color TEXT NOT NULL,
                prefix_context TEXT NOT NULL DEFAULT '',
                suffix_context TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_highlights_owner ON highlights(owner_id);
            CREATE INDEX IF NOT EXISTS idx_highlights_page ON highlights(owner_id, page_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SqliteRemote {
    async fn list_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<HighlightRecord>> {
        let rows = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT id, owner_id, page_id, text, start_offset, end_offset,
                   color, prefix_context, suffix_context, created_at
            FROM highlights
            WHERE owner_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HighlightRow::into_record).collect()
    }

    async fn insert(
        &self,
        owner_id: &str,
        record: &HighlightRecord,
    ) -> RemoteResult<Option<HighlightRecord>> {
        // The store owns id assignment; whatever id the client generated is
        // provisional and never persisted.
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO highlights (
                id, owner_id, page_id, text, start_offset, end_offset,
                color, prefix_context, suffix_context, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&record.page_id)
        .bind(&record.text)
        .bind(record.start_offset as i64)
        .bind(record.end_offset as i64)
        .bind(&record.color)
        .bind(&record.prefix_context)
        .bind(&record.suffix_context)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let mut stored = record.clone();
        stored.id = id;
        stored.owner_id = owner_id.to_string();
        Ok(Some(stored))
    }

    async fn delete(&self, id: &str) -> RemoteResult<bool> {
        let result = sqlx::query("DELETE FROM highlights WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_by_owner(&self, owner_id: &str) -> RemoteResult<bool> {
        let result = sqlx::query("DELETE FROM highlights WHERE owner_id = ?")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct HighlightRow {
    id: String,
    owner_id: String,
    page_id: String,
    text: String,
    start_offset: i64,
    end_offset: i64,
    color: String,
    prefix_context: String,
    suffix_context: String,
    created_at: String,
}

impl HighlightRow {
    fn into_record(self) -> RemoteResult<HighlightRecord> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)?.with_timezone(&Utc);

        Ok(HighlightRecord {
            id: self.id,
            owner_id: self.owner_id,
            page_id: self.page_id,
            text: self.text,
            start_offset: self.start_offset.max(0) as usize,
            end_offset: self.end_offset.max(0) as usize,
            color: self.color,
            prefix_context: self.prefix_context,
            suffix_context: self.suffix_context,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlights::{Highlight, PageRef};

    async fn setup_store() -> SqliteRemote {
        SqliteRemote::in_memory().await.unwrap()
    }

    fn record(owner: &str, text: &str, start: usize) -> HighlightRecord {
        HighlightRecord::from_highlight(&Highlight::new_local(
            owner,
            PageRef::topic("intro"),
            text,
            start,
            "prefix ",
            " suffix",
        ))
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = setup_store().await;
        let local = record("owner-1", "brown fox", 10);

        let stored = store.insert("owner-1", &local).await.unwrap().unwrap();
        assert!(!stored.id.starts_with("local-"));
        assert_ne!(stored.id, local.id);
        assert_eq!(stored.text, "brown fox");
    }

    #[tokio::test]
    async fn test_list_orders_by_creation_time() {
        let store = setup_store().await;
        let mut first = record("owner-1", "first", 0);
        let mut second = record("owner-1", "second", 10);
        first.created_at = "2024-01-01T00:00:00Z".parse().unwrap();
        second.created_at = "2024-06-01T00:00:00Z".parse().unwrap();

        // Insert newest first; the listing must still come back ascending.
        store.insert("owner-1", &second).await.unwrap();
        store.insert("owner-1", &first).await.unwrap();

        let listed = store.list_by_owner("owner-1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].text, "first");
        assert_eq!(listed[1].text, "second");
    }

    #[tokio::test]
    async fn test_list_scoped_to_owner() {
        let store = setup_store().await;
        store.insert("owner-1", &record("owner-1", "mine", 0)).await.unwrap();
        store.insert("owner-2", &record("owner-2", "theirs", 0)).await.unwrap();

        let listed = store.list_by_owner("owner-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner_id, "owner-1");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = setup_store().await;
        let stored = store
            .insert("owner-1", &record("owner-1", "brown fox", 10))
            .await
            .unwrap()
            .unwrap();

        assert!(store.delete(&stored.id).await.unwrap());
        assert!(!store.delete(&stored.id).await.unwrap());
        assert!(store.list_by_owner("owner-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_by_owner() {
        let store = setup_store().await;
        store.insert("owner-1", &record("owner-1", "one", 0)).await.unwrap();
        store.insert("owner-1", &record("owner-1", "two", 10)).await.unwrap();
        store.insert("owner-2", &record("owner-2", "keep", 0)).await.unwrap();

        assert!(store.delete_all_by_owner("owner-1").await.unwrap());
        assert!(store.list_by_owner("owner-1").await.unwrap().is_empty());
        assert_eq!(store.list_by_owner("owner-2").await.unwrap().len(), 1);
    }
}

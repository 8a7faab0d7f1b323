//! SQLite memory store implementation.
//!
//! Implements `MemoryStore` from `adabrain-core` using sqlx with split
//! read/write pools. Recall ranks a user's snippets by how many of the
//! query's terms they contain, most recent first on ties, and always
//! returns up to `limit` snippets even when nothing overlaps.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::Row;

use adabrain_core::memory::store::MemoryStore;
use adabrain_types::error::MemoryError;
use adabrain_types::memory::MemoryRecord;

use super::pool::{DatabasePool, database_url};

/// SQLite-backed implementation of `MemoryStore`.
pub struct SqliteMemoryStore {
    pool: DatabasePool,
}

impl SqliteMemoryStore {
    /// Create a store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, MemoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoryError::Unavailable(format!("{}: {e}", parent.display())))?;
        }
        let pool = DatabasePool::new(&database_url(path))
            .await
            .map_err(|e| MemoryError::Unavailable(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

/// Internal row type for ranking.
struct SnippetRow {
    content: String,
    created_at: DateTime<Utc>,
}

impl SnippetRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, MemoryError> {
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::Query(e.to_string()))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| MemoryError::Query(e.to_string()))?;
        Ok(Self {
            content,
            created_at: parse_datetime(&created_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, MemoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MemoryError::Query(format!("invalid datetime: {e}")))
}

/// Lowercased alphanumeric terms of `text`.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Order `rows` by query-term overlap, then recency, keeping `limit`.
fn rank(rows: Vec<SnippetRow>, query: &str, limit: usize) -> Vec<String> {
    let wanted = terms(query);
    let mut scored: Vec<(usize, SnippetRow)> = rows
        .into_iter()
        .map(|row| {
            let score = terms(&row.content).intersection(&wanted).count();
            (score, row)
        })
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| b.created_at.cmp(&a.created_at)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, row)| row.content)
        .collect()
}

impl MemoryStore for SqliteMemoryStore {
    async fn count(&self) -> Result<u64, MemoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_memories")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| MemoryError::Query(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    async fn query(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, MemoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT content, created_at FROM user_memories WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| MemoryError::Query(e.to_string()))?;

        let snippets = rows
            .iter()
            .map(SnippetRow::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rank(snippets, query, limit))
    }

    async fn add(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        sqlx::query(
            r#"INSERT INTO user_memories (id, user_id, content, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.content)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| MemoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn open_store() -> (tempfile::TempDir, SqliteMemoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteMemoryStore::open(&dir.path().join("nested").join("memories.db"))
            .await
            .unwrap();
        (dir, store)
    }

    fn record_at(user_id: &str, content: &str, minutes_ago: i64) -> MemoryRecord {
        let mut record = MemoryRecord::new(user_id, content);
        record.created_at = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let (_dir, store) = open_store().await;
        assert_eq!(store.count().await.unwrap(), 0);

        store.add(&MemoryRecord::new("u1", "likes tea")).await.unwrap();
        store.add(&MemoryRecord::new("u2", "likes coffee")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_query_is_scoped_to_user() {
        let (_dir, store) = open_store().await;
        store.add(&MemoryRecord::new("u1", "likes tea")).await.unwrap();
        store.add(&MemoryRecord::new("u2", "likes coffee")).await.unwrap();

        let snippets = store.query("u1", "what do I like?", 3).await.unwrap();
        assert_eq!(snippets, vec!["likes tea".to_string()]);
        assert!(store.query("u3", "anything", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_ranks_by_overlap_then_recency() {
        let (_dir, store) = open_store().await;
        store.add(&record_at("u1", "has a cat named Moon", 30)).await.unwrap();
        store.add(&record_at("u1", "drinks green tea every morning", 20)).await.unwrap();
        store.add(&record_at("u1", "works night shifts", 10)).await.unwrap();
        store.add(&record_at("u1", "prefers tea over coffee", 5)).await.unwrap();

        let snippets = store.query("u1", "Tea in the morning?", 3).await.unwrap();
        assert_eq!(
            snippets,
            vec![
                "drinks green tea every morning".to_string(),
                "prefers tea over coffee".to_string(),
                "works night shifts".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_query_respects_limit() {
        let (_dir, store) = open_store().await;
        for i in 0..5 {
            store.add(&MemoryRecord::new("u1", &format!("fact {i}"))).await.unwrap();
        }
        assert_eq!(store.query("u1", "fact", 2).await.unwrap().len(), 2);
        assert!(store.query("u1", "fact", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memories_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.db");

        let store = SqliteMemoryStore::open(&path).await.unwrap();
        store.add(&MemoryRecord::new("u1", "likes tea")).await.unwrap();
        store.close().await;

        let reopened = SqliteMemoryStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[test]
    fn test_terms_are_lowercase_words() {
        let t = terms("Tea, TEA and biscuits!");
        assert_eq!(t.len(), 3);
        assert!(t.contains("tea"));
        assert!(t.contains("biscuits"));
    }
}

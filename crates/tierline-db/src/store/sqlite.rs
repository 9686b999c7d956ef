//! # SQLite Cache Store
//!
//! File-backed [`CacheStore`] over the `cache_entries` table.
//!
//! ```text
//! cache_entries
//! ┌──────────────────────────┬──────────┬───────────────┬───────────────┐
//! │ key (PK)                 │ value    │ expires_at_ms │ created_at_ms │
//! ├──────────────────────────┼──────────┼───────────────┼───────────────┤
//! │ filter_3f9a…             │ {json}   │ 1700003600000 │ 1700000000000 │
//! │ taxonomy_terms_b01c…     │ {json}   │ 1700001800000 │ 1700000000000 │
//! └──────────────────────────┴──────────┴───────────────┴───────────────┘
//! ```
//!
//! Expired rows still occupy space until [`CacheStore::purge_expired`] runs
//! but are never returned by `get`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::debug;

use super::{expiry_ms, CacheStore};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct SqliteCacheStore {
    pool: SqlitePool,
}

impl SqliteCacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCacheStore { pool }
    }

    /// Number of stored rows, expired ones included.
    pub async fn len(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len().await? == 0)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> DbResult<Option<Vec<u8>>> {
        let now = Utc::now().timestamp_millis();

        let value: Option<Vec<u8>> = sqlx::query_scalar(
            r#"
            SELECT value FROM cache_entries
            WHERE key = ?1 AND expires_at_ms > ?2
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        debug!(key = %key, hit = value.is_some(), "Cache lookup");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DbResult<()> {
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, expires_at_ms, created_at_ms)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at_ms = excluded.expires_at_ms,
                created_at_ms = excluded.created_at_ms
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expiry_ms(now, ttl))
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), ttl_secs = ttl.as_secs(), "Cache entry stored");
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> DbResult<u64> {
        // substr() keeps `_` and `%` in prefixes literal, unlike LIKE.
        let result = sqlx::query(
            r#"
            DELETE FROM cache_entries
            WHERE substr(key, 1, length(?1)) = ?1
            "#,
        )
        .bind(prefix)
        .execute(&self.pool)
        .await?;

        debug!(prefix = %prefix, deleted = result.rows_affected(), "Cache prefix swept");
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> DbResult<u64> {
        let now = Utc::now().timestamp_millis();

        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at_ms <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        debug!(purged = result.rows_affected(), "Expired cache entries purged");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn store() -> SqliteCacheStore {
        Database::new(DbConfig::in_memory()).await.unwrap().cache()
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = store().await;
        cache
            .set("filter_a", b"payload", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("filter_a").await.unwrap(), Some(b"payload".to_vec()));
        assert_eq!(cache.get("filter_b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = store().await;
        let ttl = Duration::from_secs(60);
        cache.set("k", b"one", ttl).await.unwrap();
        cache.set("k", b"two", ttl).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = store().await;
        cache.set("k", b"stale", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);

        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert!(cache.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_prefix_is_literal() {
        let cache = store().await;
        let ttl = Duration::from_secs(60);
        cache.set("filter_1", b"a", ttl).await.unwrap();
        cache.set("filter_2", b"b", ttl).await.unwrap();
        cache.set("filterX3", b"c", ttl).await.unwrap();
        cache.set("taxonomy_terms_1", b"d", ttl).await.unwrap();

        assert_eq!(cache.delete_by_prefix("filter_").await.unwrap(), 2);
        assert_eq!(cache.get("filterX3").await.unwrap(), Some(b"c".to_vec()));
        assert_eq!(cache.get("taxonomy_terms_1").await.unwrap(), Some(b"d".to_vec()));
    }
}

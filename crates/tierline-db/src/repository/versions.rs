//! # Taxonomy Version Repository
//!
//! SQLite-backed [`VersionStore`].
//!
//! ## Stamp Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  first read ──► INSERT … ON CONFLICT DO NOTHING (now)  ──► T0           │
//! │  later reads ─────────────────────────────────────────► T0 (stable)   │
//! │  touch ──────► UPSERT MAX(now, previous + 1)          ──► T1 > T0       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use tierline_core::TaxonomyVersion;

use crate::error::DbResult;
use crate::store::VersionStore;

#[derive(Debug, Clone)]
pub struct TaxonomyVersionRepository {
    pool: SqlitePool,
}

impl TaxonomyVersionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TaxonomyVersionRepository { pool }
    }

    /// Reads a stamp without initialising it.
    pub async fn get(&self, taxonomy: &str) -> DbResult<Option<i64>> {
        let stamp: Option<i64> =
            sqlx::query_scalar("SELECT last_modified_ms FROM taxonomy_versions WHERE taxonomy = ?1")
                .bind(taxonomy)
                .fetch_optional(&self.pool)
                .await?;
        Ok(stamp)
    }
}

#[async_trait]
impl VersionStore for TaxonomyVersionRepository {
    async fn current_or_init(&self, taxonomy: &str, now_ms: i64) -> DbResult<i64> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO taxonomy_versions (taxonomy, last_modified_ms, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(taxonomy) DO NOTHING
            "#,
        )
        .bind(taxonomy)
        .bind(now_ms)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            debug!(taxonomy = %taxonomy, stamp = now_ms, "Taxonomy stamp initialised");
        }

        let stamp: i64 =
            sqlx::query_scalar("SELECT last_modified_ms FROM taxonomy_versions WHERE taxonomy = ?1")
                .bind(taxonomy)
                .fetch_one(&self.pool)
                .await?;
        Ok(stamp)
    }

    async fn bump(&self, taxonomy: &str, now_ms: i64) -> DbResult<i64> {
        let stamp: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO taxonomy_versions (taxonomy, last_modified_ms, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(taxonomy) DO UPDATE SET
                last_modified_ms = MAX(excluded.last_modified_ms, taxonomy_versions.last_modified_ms + 1),
                updated_at = excluded.updated_at
            RETURNING last_modified_ms
            "#,
        )
        .bind(taxonomy)
        .bind(now_ms)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(taxonomy = %taxonomy, stamp, "Taxonomy stamp bumped");
        Ok(stamp)
    }

    async fn all(&self) -> DbResult<Vec<TaxonomyVersion>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT taxonomy, last_modified_ms FROM taxonomy_versions ORDER BY taxonomy",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(taxonomy, stamp)| TaxonomyVersion::new(taxonomy, stamp))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> TaxonomyVersionRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().versions()
    }

    #[tokio::test]
    async fn test_first_read_persists_now() {
        let repo = repo().await;
        assert_eq!(repo.get("categories").await.unwrap(), None);
        assert_eq!(repo.current_or_init("categories", 1_000).await.unwrap(), 1_000);
        assert_eq!(repo.current_or_init("categories", 9_000).await.unwrap(), 1_000);
        assert_eq!(repo.get("categories").await.unwrap(), Some(1_000));
    }

    #[tokio::test]
    async fn test_bump_is_strictly_increasing() {
        let repo = repo().await;
        repo.current_or_init("categories", 1_000).await.unwrap();

        assert_eq!(repo.bump("categories", 5_000).await.unwrap(), 5_000);
        assert_eq!(repo.bump("categories", 5_000).await.unwrap(), 5_001);
        assert_eq!(repo.bump("categories", 10).await.unwrap(), 5_002);
    }

    #[tokio::test]
    async fn test_bump_unknown_taxonomy_inserts() {
        let repo = repo().await;
        assert_eq!(repo.bump("tags", 77).await.unwrap(), 77);
        assert_eq!(
            repo.all().await.unwrap(),
            vec![TaxonomyVersion::new("tags", 77)]
        );
    }
}

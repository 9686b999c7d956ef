//! # Database Pool Management
//!
//! Connection pool, embedded migrations and repository access.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig::new(path)          ← from TierlineConfig [database]          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await  ← pool + migrations/sqlite/*.sql          │
//! │       │                                                                 │
//! │       ├──► db.tiers()     DiscountConfigRepository                     │
//! │       ├──► db.versions()  TaxonomyVersionRepository (VersionStore)     │
//! │       └──► db.cache()     SqliteCacheStore (CacheStore)                │
//! │                                                                         │
//! │  Repositories are cheap clones over the same SqlitePool.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! Storefront requests read tiers and cache rows concurrently while the
//! admin side writes, so WAL is enabled for file databases.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::tiers::DiscountConfigRepository;
use crate::repository::versions::TaxonomyVersionRepository;
use crate::store::sqlite::SqliteCacheStore;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how many connections the pool may open.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/tierline/tierline.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Default: 5. Always 1 in memory.
    pub max_connections: u32,
    /// How long a request waits for a free connection.
    pub acquire_timeout: Duration,
    /// How long SQLite retries a write against a locked file.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    /// A file database at `path`. The literal `:memory:` gives
    /// [`DbConfig::in_memory`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let database_path = path.into();
        if database_path.as_os_str() == IN_MEMORY_PATH {
            return DbConfig::in_memory();
        }
        DbConfig {
            database_path,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// An isolated database that disappears with the pool.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool
    /// holds exactly one.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Ignored for in-memory databases.
    pub fn max_connections(mut self, max: u32) -> Self {
        if !self.is_in_memory() {
            self.max_connections = max.max(1);
        }
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
        } else {
            SqliteConnectOptions::from_str(&format!(
                "sqlite://{}?mode=rwc",
                self.database_path.display()
            ))
            .map(|o| o.journal_mode(SqliteJournalMode::Wal).create_if_missing(true))
        }
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle over the pool. Clones share connections.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool, then applies pending migrations unless disabled.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            in_memory = config.is_in_memory(),
            "Opening tierline database"
        );

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout);

        // The in-memory database lives exactly as long as its connection.
        if config.is_in_memory() {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn migrate(&self) -> DbResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!(known = MIGRATOR.migrations.len(), "Schema up to date");
        Ok(())
    }

    /// Number of migrations recorded as applied.
    pub async fn applied_migrations(&self) -> DbResult<usize> {
        let applied: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(usize::try_from(applied).unwrap_or(0))
    }

    /// Per-product discount tier slots.
    pub fn tiers(&self) -> DiscountConfigRepository {
        DiscountConfigRepository::new(self.pool.clone())
    }

    /// Per-taxonomy version stamps.
    pub fn versions(&self) -> TaxonomyVersionRepository {
        TaxonomyVersionRepository::new(self.pool.clone())
    }

    /// The SQLite-backed cache store.
    pub fn cache(&self) -> SqliteCacheStore {
        SqliteCacheStore::new(self.pool.clone())
    }

    /// `true` when the database answers a trivial query.
    pub async fn is_reachable(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "Tierline database unreachable");
                false
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Tierline database closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.is_reachable().await);
        assert_eq!(db.applied_migrations().await.unwrap(), MIGRATOR.migrations.len());

        // A second run finds nothing to do.
        db.migrate().await.unwrap();
        assert_eq!(db.applied_migrations().await.unwrap(), MIGRATOR.migrations.len());
    }

    #[tokio::test]
    async fn test_closed_database_is_unreachable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.is_reachable().await);
    }

    #[test]
    fn test_memory_path_stays_single_connection() {
        let config = DbConfig::new(":memory:").max_connections(10);
        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);

        let config = DbConfig::new("/tmp/tierline.db")
            .max_connections(10)
            .run_migrations(false);
        assert_eq!(config.max_connections, 10);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
    }
}

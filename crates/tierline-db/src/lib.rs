//! # tierline-db: Persistence Layer for Tierline
//!
//! SQLite storage for discount tiers, taxonomy version stamps and cache
//! entries, plus the store traits the service layer programs against.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tierline Data Flow                               │
//! │                                                                         │
//! │  tierline-service (DiscountService, FilterQueryService, ...)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tierline-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌─────────────────┐   ┌───────────────┐  │   │
//! │  │   │   Database    │   │  Repositories   │   │    Stores     │  │   │
//! │  │   │   (pool.rs)   │   │  tiers.rs       │   │  CacheStore   │  │   │
//! │  │   │  SqlitePool   │◄──│  versions.rs    │   │  VersionStore │  │   │
//! │  │   │  migrations   │   │                 │   │  sqlite/memory│  │   │
//! │  │   └───────────────┘   └─────────────────┘   └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tierline_db::{Database, DbConfig, CacheStore};
//!
//! let db = Database::new(DbConfig::new("tierline.db")).await?;
//! let table = db.tiers().load_table(500).await?;
//! db.cache().delete_by_prefix("filter_").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{DiscountConfigRepository, TaxonomyVersionRepository};
pub use store::memory::{MemoryCacheStore, MemoryVersionStore};
pub use store::sqlite::SqliteCacheStore;
pub use store::{CacheStore, VersionStore};

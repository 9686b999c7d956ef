//! # Store Traits
//!
//! The two shared resources the filtered catalog depends on.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            CacheStore                          VersionStore             │
//! │   get / set / delete_by_prefix       current_or_init / bump / all       │
//! │         │              │                    │               │           │
//! │         ▼              ▼                    ▼               ▼           │
//! │  SqliteCacheStore  MemoryCacheStore  TaxonomyVersion-  MemoryVersion-   │
//! │  (cache_entries)   (tests)           Repository        Store (tests)    │
//! │                                      (taxonomy_versions)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No store offers locking. Two requests may recompute the same missed key
//! and the last write wins.

use async_trait::async_trait;
use std::time::Duration;

use tierline_core::TaxonomyVersion;

use crate::error::DbResult;

pub mod memory;
pub mod sqlite;

/// Opaque byte cache with TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value when present and not yet expired.
    async fn get(&self, key: &str) -> DbResult<Option<Vec<u8>>>;

    /// Stores `value` under `key` for `ttl`, overwriting unconditionally.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DbResult<()>;

    /// Removes every entry whose key starts with `prefix`. Returns the count.
    async fn delete_by_prefix(&self, prefix: &str) -> DbResult<u64>;

    /// Removes expired entries. Returns the count.
    async fn purge_expired(&self) -> DbResult<u64>;
}

/// Per-taxonomy last-modified stamps in Unix milliseconds.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Returns the stamp, persisting `now_ms` if the taxonomy has none yet.
    async fn current_or_init(&self, taxonomy: &str, now_ms: i64) -> DbResult<i64>;

    /// Stores `max(now_ms, current + 1)` and returns it.
    async fn bump(&self, taxonomy: &str, now_ms: i64) -> DbResult<i64>;

    /// Every known taxonomy, ordered by name.
    async fn all(&self) -> DbResult<Vec<TaxonomyVersion>>;
}

/// `ttl` added to `now_ms`, saturating.
pub(crate) fn expiry_ms(now_ms: i64, ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(ttl_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_saturates() {
        assert_eq!(expiry_ms(1_000, Duration::from_secs(1)), 2_000);
        assert_eq!(expiry_ms(1_000, Duration::MAX), i64::MAX);
    }
}

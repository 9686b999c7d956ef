//! # In-Memory Stores
//!
//! Process-local [`CacheStore`] and [`VersionStore`] backends for tests and
//! single-process embeddings.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;

use tierline_core::TaxonomyVersion;

use super::{expiry_ms, CacheStore, VersionStore};
use crate::error::DbResult;

// =============================================================================
// Memory Cache Store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, (Vec<u8>, i64)>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys, expired ones included, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> DbResult<Option<Vec<u8>>> {
        let now = Utc::now().timestamp_millis();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> DbResult<()> {
        let expires_at = expiry_ms(Utc::now().timestamp_millis(), ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_vec(), expires_at));
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> DbResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn purge_expired(&self) -> DbResult<u64> {
        let now = Utc::now().timestamp_millis();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

// =============================================================================
// Memory Version Store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    stamps: RwLock<BTreeMap<String, i64>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn current_or_init(&self, taxonomy: &str, now_ms: i64) -> DbResult<i64> {
        let mut stamps = self.stamps.write().await;
        Ok(*stamps.entry(taxonomy.to_string()).or_insert(now_ms))
    }

    async fn bump(&self, taxonomy: &str, now_ms: i64) -> DbResult<i64> {
        let mut stamps = self.stamps.write().await;
        let next = match stamps.get(taxonomy) {
            Some(current) => TaxonomyVersion::next_stamp(*current, now_ms),
            None => now_ms,
        };
        stamps.insert(taxonomy.to_string(), next);
        Ok(next)
    }

    async fn all(&self) -> DbResult<Vec<TaxonomyVersion>> {
        Ok(self
            .stamps
            .read()
            .await
            .iter()
            .map(|(taxonomy, stamp)| TaxonomyVersion::new(taxonomy.clone(), *stamp))
            .collect())
    }
}

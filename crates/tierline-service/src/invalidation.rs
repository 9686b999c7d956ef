//! # Invalidation Tracker
//!
//! Keeps the per-taxonomy stamps that every cached catalog key embeds.
//!
//! ## Why Touching Is Enough
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  stamp_for("categories") = T0   key = H(query, T0)  ──► cached         │
//! │                                                                         │
//! │  term edited ──► touch("categories") = T1 > T0                         │
//! │                                                                         │
//! │  stamp_for("categories") = T1   key = H(query, T1)  ──► miss           │
//! │                                                                         │
//! │  The T0 entries are never read again and expire on their own.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use tierline_core::{ContentEvent, TaxonomyVersion, FILTER_KEY_PREFIXES};
use tierline_db::{CacheStore, VersionStore};

use crate::clock::Clock;
use crate::error::ServiceResult;
use crate::host::ContentRepository;

/// What a full filter cache clear did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClearReport {
    pub removed_entries: u64,
    pub touched: Vec<TaxonomyVersion>,
}

pub struct InvalidationTracker {
    versions: Arc<dyn VersionStore>,
    cache: Arc<dyn CacheStore>,
    content: Arc<dyn ContentRepository>,
    clock: Arc<dyn Clock>,
}

impl InvalidationTracker {
    pub fn new(
        versions: Arc<dyn VersionStore>,
        cache: Arc<dyn CacheStore>,
        content: Arc<dyn ContentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        InvalidationTracker {
            versions,
            cache,
            content,
            clock,
        }
    }

    /// Marks `taxonomy` as modified now. Returns the new stamp.
    pub async fn touch(&self, taxonomy: &str) -> ServiceResult<i64> {
        let stamp = self.versions.bump(taxonomy, self.clock.now_ms()).await?;
        info!(taxonomy = %taxonomy, stamp, "Taxonomy touched");
        Ok(stamp)
    }

    /// Current stamp of `taxonomy`, starting the series at "now".
    pub async fn stamp_for(&self, taxonomy: &str) -> ServiceResult<i64> {
        Ok(self
            .versions
            .current_or_init(taxonomy, self.clock.now_ms())
            .await?)
    }

    /// Applies a host mutation. Returns the taxonomies it touched.
    pub async fn on_event(&self, event: &ContentEvent) -> ServiceResult<Vec<TaxonomyVersion>> {
        if event.is_ignored() {
            debug!(?event, "Content event ignored");
            return Ok(Vec::new());
        }

        let taxonomies = match (event.taxonomy(), event.content_type()) {
            (Some(taxonomy), _) => vec![taxonomy.to_string()],
            (None, Some(content_type)) => self.content.taxonomies_for(content_type).await?,
            (None, None) => Vec::new(),
        };

        let mut touched = Vec::with_capacity(taxonomies.len());
        for taxonomy in taxonomies {
            let stamp = self.touch(&taxonomy).await?;
            touched.push(TaxonomyVersion::new(taxonomy, stamp));
        }
        Ok(touched)
    }

    /// Drops every cached term list and listing and touches every known
    /// taxonomy.
    pub async fn clear_all(&self) -> ServiceResult<ClearReport> {
        let mut removed_entries = 0;
        for prefix in FILTER_KEY_PREFIXES {
            removed_entries += self.cache.delete_by_prefix(prefix).await?;
        }

        let mut touched = Vec::new();
        for version in self.versions.all().await? {
            let stamp = self.touch(&version.taxonomy).await?;
            touched.push(TaxonomyVersion::new(version.taxonomy, stamp));
        }

        info!(
            removed_entries,
            taxonomies = touched.len(),
            "Filter cache cleared"
        );
        Ok(ClearReport {
            removed_entries,
            touched,
        })
    }
}

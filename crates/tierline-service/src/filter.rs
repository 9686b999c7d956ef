//! # Filter Query Service
//!
//! Term lists and filtered listings for the storefront's taxonomy filter,
//! cached under stamp-versioned keys.
//!
//! ## Listing Request
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  get_filtered_listing(taxonomy, term, content_type, page_size)         │
//! │       │                                                                 │
//! │       ▼ validate ──────────────────────────────► InvalidInput           │
//! │  stamp = tracker.stamp_for(taxonomy)   (failure → serve uncached)      │
//! │  key   = CacheKey::listing(query, stamp)                               │
//! │       │                                                                 │
//! │       ├── hit, same stamp ─────────────────────► cached payload         │
//! │       ▼ miss                                                            │
//! │  unknown taxonomy ─────────────────────────────► empty-state payload   │
//! │  phase 1: query_ids      (ids only)                                    │
//! │       ├── no ids ──────────────────────────────► empty-state payload   │
//! │  phase 2: get_by_ids     (full records, re-ordered by phase 1)         │
//! │  render ─► { html, found_count } ─► cache.set(key, ttl)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A broken cache or version store only costs latency. Reads and writes
//! that fail are logged and the request is computed from the host.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use tierline_core::validation::{
    validate_content_type, validate_page_size, validate_taxonomy, validate_term_slug,
};
use tierline_core::{
    order_by_ids, selected_term, CacheKey, CachedEnvelope, ContentEvent, ContentId, ListingPayload,
    ListingQuery, TaxonomyVersion, Term, TermListing, TermQuery,
};
use tierline_db::CacheStore;

use crate::config::TierlineConfig;
use crate::error::ServiceResult;
use crate::host::{ContentRepository, ListingRenderer};
use crate::invalidation::InvalidationTracker;

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSettings {
    pub cache_enabled: bool,
    pub terms_ttl: Duration,
    pub listing_ttl: Duration,
    /// Terms shown before the "more" toggle.
    pub term_limit: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        FilterSettings::from_config(&TierlineConfig::default())
    }
}

impl FilterSettings {
    pub fn from_config(config: &TierlineConfig) -> Self {
        FilterSettings {
            cache_enabled: config.cache.enabled,
            terms_ttl: config.cache.terms_ttl(),
            listing_ttl: config.cache.listing_ttl(),
            term_limit: config.listing.term_limit,
        }
    }
}

// =============================================================================
// Filter Query Service
// =============================================================================

pub struct FilterQueryService {
    content: Arc<dyn ContentRepository>,
    cache: Arc<dyn CacheStore>,
    tracker: Arc<InvalidationTracker>,
    renderer: Arc<dyn ListingRenderer>,
    settings: FilterSettings,
}

impl FilterQueryService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        cache: Arc<dyn CacheStore>,
        tracker: Arc<InvalidationTracker>,
        renderer: Arc<dyn ListingRenderer>,
        settings: FilterSettings,
    ) -> Self {
        FilterQueryService {
            content,
            cache,
            tracker,
            renderer,
            settings,
        }
    }

    pub fn tracker(&self) -> &InvalidationTracker {
        &self.tracker
    }

    // =========================================================================
    // Terms
    // =========================================================================

    /// Terms of a taxonomy. An unknown taxonomy has none.
    pub async fn list_terms(&self, query: &TermQuery) -> ServiceResult<Vec<Term>> {
        let mut query = query.clone();
        query.taxonomy = validate_taxonomy(&query.taxonomy)?;

        let slot = self
            .stamp(&query.taxonomy)
            .await
            .map(|stamp| (CacheKey::terms(&query, stamp), stamp));

        let query = &query;
        self.cached(slot, self.settings.terms_ttl, move || self.compute_terms(query))
            .await
    }

    async fn compute_terms(&self, query: &TermQuery) -> ServiceResult<Vec<Term>> {
        if !self.content.taxonomy_exists(&query.taxonomy).await? {
            debug!(taxonomy = %query.taxonomy, "Unknown taxonomy, no terms");
            return Ok(Vec::new());
        }
        Ok(self.content.list_terms(query).await?)
    }

    /// The filter bar: terms by count, with `active` highlighted.
    pub async fn term_listing(
        &self,
        taxonomy: &str,
        active: Option<&str>,
    ) -> ServiceResult<TermListing> {
        let terms = self.list_terms(&TermQuery::new(taxonomy)).await?;
        Ok(TermListing::new(terms, active, self.settings.term_limit))
    }

    /// Touches `taxonomy` and recomputes its default term list.
    pub async fn refresh_terms(&self, taxonomy: &str) -> ServiceResult<Vec<Term>> {
        let taxonomy = validate_taxonomy(taxonomy)?;
        self.tracker.touch(&taxonomy).await?;
        self.list_terms(&TermQuery::new(taxonomy)).await
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Phase one of a listing: matching ids, uncached.
    pub async fn query_content(&self, query: &ListingQuery) -> ServiceResult<Vec<ContentId>> {
        let query = validate_listing(query)?;
        Ok(self.content.query_ids(&query).await?)
    }

    /// Rendered listing for one filter click.
    pub async fn get_filtered_listing(
        &self,
        taxonomy: &str,
        term: Option<&str>,
        content_type: &str,
        page_size: u32,
    ) -> ServiceResult<ListingPayload> {
        let mut query = ListingQuery::new(taxonomy, content_type, page_size);
        if let Some(term) = term {
            query = query.with_term(term);
        }
        self.listing(&query).await
    }

    pub async fn listing(&self, query: &ListingQuery) -> ServiceResult<ListingPayload> {
        let query = validate_listing(query)?;

        let slot = self
            .stamp(&query.taxonomy)
            .await
            .map(|stamp| (CacheKey::listing(&query, stamp), stamp));

        let query = &query;
        self.cached(slot, self.settings.listing_ttl, move || self.compute_listing(query))
            .await
    }

    async fn compute_listing(&self, query: &ListingQuery) -> ServiceResult<ListingPayload> {
        if !self.content.taxonomy_exists(&query.taxonomy).await? {
            debug!(taxonomy = %query.taxonomy, "Unknown taxonomy, empty listing");
            return Ok(ListingPayload::empty(self.renderer.render_empty(query)));
        }

        let ids = self.content.query_ids(query).await?;
        if ids.is_empty() {
            return Ok(ListingPayload::empty(self.renderer.render_empty(query)));
        }

        let records = order_by_ids(&ids, self.content.get_by_ids(&ids).await?);
        let html = self.renderer.render_items(query, &records);

        debug!(
            taxonomy = %query.taxonomy,
            term = ?query.term,
            found = ids.len(),
            loaded = records.len(),
            "Listing computed"
        );
        Ok(ListingPayload::found(html, ids.len() as u64))
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub async fn on_content_event(
        &self,
        event: &ContentEvent,
    ) -> ServiceResult<Vec<TaxonomyVersion>> {
        self.tracker.on_event(event).await
    }

    // =========================================================================
    // Cache Plumbing
    // =========================================================================

    /// The stamp to key on, or `None` to bypass the cache.
    async fn stamp(&self, taxonomy: &str) -> Option<i64> {
        if !self.settings.cache_enabled {
            return None;
        }
        match self.tracker.stamp_for(taxonomy).await {
            Ok(stamp) => Some(stamp),
            Err(e) => {
                warn!(taxonomy = %taxonomy, error = %e, "Version store unavailable, serving uncached");
                None
            }
        }
    }

    async fn cached<T, F, Fut>(
        &self,
        slot: Option<(CacheKey, i64)>,
        ttl: Duration,
        compute: F,
    ) -> ServiceResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<T>>,
    {
        let Some((key, stamp)) = slot else {
            return compute().await;
        };

        match self.cache.get(key.as_str()).await {
            Ok(Some(bytes)) => match CachedEnvelope::<T>::open(&bytes, stamp) {
                Ok(Some(value)) => {
                    debug!(key = %key, "Cache hit");
                    return Ok(value);
                }
                Ok(None) => debug!(key = %key, "Cached entry has a stale stamp"),
                Err(e) => warn!(key = %key, error = %e, "Cached entry unreadable"),
            },
            Ok(None) => debug!(key = %key, "Cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Cache read failed, serving uncached"),
        }

        let value = compute().await?;

        match CachedEnvelope::new(stamp, &value).encode() {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(key.as_str(), &bytes, ttl).await {
                    warn!(key = %key, error = %e, "Cache write failed");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Result not cacheable"),
        }

        Ok(value)
    }
}

fn validate_listing(query: &ListingQuery) -> ServiceResult<ListingQuery> {
    Ok(ListingQuery {
        taxonomy: validate_taxonomy(&query.taxonomy)?,
        term: query
            .term
            .as_deref()
            .and_then(selected_term)
            .map(validate_term_slug)
            .transpose()?,
        content_type: validate_content_type(&query.content_type)?,
        page_size: validate_page_size(query.page_size)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::host::PlainListingRenderer;
    use crate::testing::{FailingCache, FakeContent, FixedClock};
    use tierline_core::LISTING_KEY_PREFIX;
    use tierline_db::{MemoryCacheStore, MemoryVersionStore};

    struct Fixture {
        service: FilterQueryService,
        content: Arc<FakeContent>,
        cache: Arc<MemoryCacheStore>,
    }

    fn content() -> FakeContent {
        FakeContent::new()
            .with_taxonomy(
                "blog",
                "categories",
                vec![
                    Term::new("news", "News", 3),
                    Term::new("guides", "Guides", 9),
                    Term::new("empty", "Empty", 0),
                ],
            )
            .with_post(5, "blog", &[("categories", "news")])
            .with_post(4, "blog", &[("categories", "guides")])
            .with_post(3, "blog", &[("categories", "news")])
    }

    fn build(content: Arc<FakeContent>, cache: Arc<dyn CacheStore>) -> FilterQueryService {
        let clock = Arc::new(FixedClock::at(1_000));
        let tracker = InvalidationTracker::new(
            Arc::new(MemoryVersionStore::new()),
            cache.clone(),
            content.clone(),
            clock,
        );
        FilterQueryService::new(
            content,
            cache,
            Arc::new(tracker),
            Arc::new(PlainListingRenderer::default()),
            FilterSettings::default(),
        )
    }

    fn fixture() -> Fixture {
        let content = Arc::new(content());
        let cache = Arc::new(MemoryCacheStore::new());
        Fixture {
            service: build(content.clone(), cache.clone()),
            content,
            cache,
        }
    }

    #[tokio::test]
    async fn test_listing_two_phase_keeps_id_order() {
        let f = fixture();
        let payload = f
            .service
            .get_filtered_listing("categories", Some("news"), "blog", 10)
            .await
            .unwrap();

        assert_eq!(payload.found_count, 2);
        assert!(!payload.no_results);
        let five = payload.html.find("post-5").unwrap();
        let three = payload.html.find("post-3").unwrap();
        assert!(five < three);
        assert!(!payload.html.contains("post-4"));
    }

    #[tokio::test]
    async fn test_repeated_listing_is_served_from_cache() {
        let f = fixture();
        let first = f
            .service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap();
        let calls = f.content.calls();

        let second = f
            .service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(f.content.calls(), calls);
        assert_eq!(first.found_count, 3);
    }

    #[tokio::test]
    async fn test_touch_forces_recompute_under_new_key() {
        let f = fixture();
        f.service
            .get_filtered_listing("categories", Some("news"), "blog", 10)
            .await
            .unwrap();
        let keys_before = f.cache.keys().await;
        let (_, ids_before, _) = f.content.calls();

        f.service.tracker().touch("categories").await.unwrap();
        f.service
            .get_filtered_listing("categories", Some("news"), "blog", 10)
            .await
            .unwrap();

        let (_, ids_after, _) = f.content.calls();
        assert_eq!(ids_after, ids_before + 1);

        let keys_after = f.cache.keys().await;
        assert_eq!(keys_after.len(), keys_before.len() + 1);
        assert!(keys_after.iter().all(|k| k.starts_with(LISTING_KEY_PREFIX)));
    }

    #[tokio::test]
    async fn test_no_matches_yield_empty_state() {
        let f = fixture();
        let payload = f
            .service
            .get_filtered_listing("categories", Some("missing"), "blog", 10)
            .await
            .unwrap();

        assert!(payload.no_results);
        assert_eq!(payload.found_count, 0);
        assert!(payload.html.contains("no-posts-found"));
        let (_, _, record_queries) = f.content.calls();
        assert_eq!(record_queries, 0);
    }

    #[tokio::test]
    async fn test_unknown_taxonomy_is_empty_not_error() {
        let f = fixture();
        let payload = f
            .service
            .get_filtered_listing("colours", None, "blog", 10)
            .await
            .unwrap();
        assert!(payload.no_results);

        let terms = f.service.list_terms(&TermQuery::new("colours")).await.unwrap();
        assert!(terms.is_empty());
    }

    #[tokio::test]
    async fn test_all_term_lists_everything() {
        let f = fixture();
        let all = f
            .service
            .get_filtered_listing("categories", Some("all"), "blog", 10)
            .await
            .unwrap();
        let none = f
            .service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap();
        assert_eq!(all, none);
        assert_eq!(f.content.calls().1, 1);
    }

    #[tokio::test]
    async fn test_raw_all_term_shares_the_unfiltered_entry() {
        let f = fixture();
        let unfiltered = f
            .service
            .listing(&ListingQuery::new("categories", "blog", 10))
            .await
            .unwrap();
        let calls = f.content.calls();

        for term in ["all", " ALL ", ""] {
            let raw = ListingQuery {
                term: Some(term.to_string()),
                ..ListingQuery::new("categories", "blog", 10)
            };
            assert_eq!(f.service.listing(&raw).await.unwrap(), unfiltered);
        }
        assert_eq!(f.content.calls(), calls);
        assert_eq!(unfiltered.found_count, 3);
    }

    #[tokio::test]
    async fn test_invalid_requests_are_rejected() {
        let f = fixture();
        assert!(matches!(
            f.service.get_filtered_listing("Bad Tax", None, "blog", 10).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service.get_filtered_listing("categories", None, "blog", 0).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service
                .get_filtered_listing("categories", Some("two words"), "blog", 10)
                .await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_outage_degrades_to_uncached() {
        let content = Arc::new(content());
        let service = build(content.clone(), Arc::new(FailingCache));

        let first = service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap();
        let second = service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(content.calls().1, 2);
    }

    #[tokio::test]
    async fn test_host_outage_is_reported() {
        let f = fixture();
        f.content.set_unavailable(true);
        let err = f
            .service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_terms_cached_and_refreshed() {
        let f = fixture();
        let terms = f.service.list_terms(&TermQuery::new("categories")).await.unwrap();
        let slugs: Vec<_> = terms.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["guides", "news"]);

        f.service.list_terms(&TermQuery::new("categories")).await.unwrap();
        assert_eq!(f.content.calls().0, 1);

        f.service.refresh_terms("categories").await.unwrap();
        assert_eq!(f.content.calls().0, 2);
    }

    #[tokio::test]
    async fn test_term_listing_marks_active() {
        let f = fixture();
        let listing = f.service.term_listing("categories", Some("news")).await.unwrap();
        assert!(listing.is_active("news"));
        assert!(!listing.has_more());

        let listing = f.service.term_listing("categories", Some("nope")).await.unwrap();
        assert!(listing.is_all_active());
    }

    #[tokio::test]
    async fn test_content_event_invalidates_listing() {
        let f = fixture();
        f.service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap();

        f.service
            .on_content_event(&ContentEvent::ContentSaved {
                content_type: "blog".into(),
                autosave: false,
            })
            .await
            .unwrap();
        f.service
            .get_filtered_listing("categories", None, "blog", 10)
            .await
            .unwrap();
        assert_eq!(f.content.calls().1, 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_queries() {
        let content = Arc::new(content());
        let cache = Arc::new(MemoryCacheStore::new());
        let tracker = InvalidationTracker::new(
            Arc::new(MemoryVersionStore::new()),
            cache.clone(),
            content.clone(),
            Arc::new(FixedClock::at(1)),
        );
        let settings = FilterSettings {
            cache_enabled: false,
            ..FilterSettings::default()
        };
        let service = FilterQueryService::new(
            content.clone(),
            cache.clone(),
            Arc::new(tracker),
            Arc::new(PlainListingRenderer::default()),
            settings,
        );

        service.get_filtered_listing("categories", None, "blog", 10).await.unwrap();
        service.get_filtered_listing("categories", None, "blog", 10).await.unwrap();
        assert_eq!(content.calls().1, 2);
        assert!(cache.keys().await.is_empty());
    }
}

//! # Tierline Facade
//!
//! Builds every service from a [`TierlineConfig`] and the host's
//! collaborators, over one SQLite database.
//!
//! ```rust,ignore
//! let config = TierlineConfig::load_or_default(None);
//! let tierline = Tierline::open(config, HostCollaborators::new(products, cart, content)).await?;
//!
//! let rate = tierline.discounts().resolve_discount(60, 42).await?;
//! let payload = tierline
//!     .filters()
//!     .get_filtered_listing("categories", Some("news"), "blog", 10)
//!     .await?;
//! ```

use std::sync::Arc;
use tracing::info;

use tierline_core::PriceFormat;
use tierline_db::{CacheStore, Database, DbConfig};

use crate::clock::{Clock, SystemClock};
use crate::config::TierlineConfig;
use crate::discount::DiscountService;
use crate::error::ServiceResult;
use crate::filter::{FilterQueryService, FilterSettings};
use crate::host::{
    CartRepository, ContentRepository, ListingRenderer, PlainListingRenderer, ProductRepository,
};
use crate::invalidation::InvalidationTracker;
use crate::recalc::CartRecalculator;

/// The host side of the wiring.
pub struct HostCollaborators {
    pub products: Arc<dyn ProductRepository>,
    pub cart: Arc<dyn CartRepository>,
    pub content: Arc<dyn ContentRepository>,
    /// Defaults to [`PlainListingRenderer`] with the configured empty message.
    pub renderer: Option<Arc<dyn ListingRenderer>>,
    pub clock: Option<Arc<dyn Clock>>,
}

impl HostCollaborators {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        cart: Arc<dyn CartRepository>,
        content: Arc<dyn ContentRepository>,
    ) -> Self {
        HostCollaborators {
            products,
            cart,
            content,
            renderer: None,
            clock: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ListingRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

pub struct Tierline {
    config: TierlineConfig,
    db: Database,
    cache: Arc<dyn CacheStore>,
    discounts: Arc<DiscountService>,
    recalculator: CartRecalculator,
    filters: FilterQueryService,
}

impl Tierline {
    pub async fn open(config: TierlineConfig, host: HostCollaborators) -> ServiceResult<Self> {
        config.validate()?;

        let db = Database::new(DbConfig::new(&config.database.path)).await?;

        let clock = host.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let renderer = host.renderer.unwrap_or_else(|| {
            Arc::new(PlainListingRenderer::new(config.listing.empty_message.clone()))
        });
        let cache: Arc<dyn CacheStore> = Arc::new(db.cache());

        let discounts = Arc::new(DiscountService::new(host.products, Arc::new(db.tiers())));
        let recalculator = CartRecalculator::new(host.cart, discounts.clone());

        let tracker = Arc::new(InvalidationTracker::new(
            Arc::new(db.versions()),
            cache.clone(),
            host.content.clone(),
            clock,
        ));
        let filters = FilterQueryService::new(
            host.content,
            cache.clone(),
            tracker,
            renderer,
            FilterSettings::from_config(&config),
        );

        info!(
            db = %config.database.path,
            cache_enabled = config.cache.enabled,
            "Tierline ready"
        );

        Ok(Tierline {
            config,
            db,
            cache,
            discounts,
            recalculator,
            filters,
        })
    }

    pub fn config(&self) -> &TierlineConfig {
        &self.config
    }

    pub fn price_format(&self) -> &PriceFormat {
        &self.config.pricing
    }

    pub fn discounts(&self) -> &DiscountService {
        &self.discounts
    }

    pub fn recalculator(&self) -> &CartRecalculator {
        &self.recalculator
    }

    pub fn filters(&self) -> &FilterQueryService {
        &self.filters
    }

    pub fn tracker(&self) -> &InvalidationTracker {
        self.filters.tracker()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Removes expired cache rows. Returns how many were dropped.
    pub async fn purge_expired(&self) -> ServiceResult<u64> {
        let removed = self.cache.purge_expired().await?;
        info!(removed, "Expired cache entries purged");
        Ok(removed)
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

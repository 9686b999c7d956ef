//! # tierline-service: Storefront Services for Tierline
//!
//! Volume discounts, guarded cart recalculation and cached taxonomy
//! filters, driven by the host framework through a handful of traits.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tierline Services                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 Tierline (app.rs, wiring facade)                 │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │DiscountService │  │CartRecalculator│  │  FilterQueryService    │    │
//! │  │                │  │                │  │                        │    │
//! │  │ resolve, quote │  │ guarded passes │  │ terms + listings       │    │
//! │  │ save config    │  │ over the cart  │  │ stamp-versioned cache  │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          │                   │                       │                  │
//! │          ▼                   ▼                       ▼                  │
//! │   ProductRepository    CartRepository      ContentRepository           │
//! │   (host)               (host)              InvalidationTracker         │
//! │                                            CacheStore / VersionStore   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`app`] - `Tierline` facade built from configuration
//! - [`config`] - TOML + environment configuration
//! - [`discount`] - Discount resolution and quotes
//! - [`error`] - Service error types
//! - [`filter`] - Cached term lists and listings
//! - [`host`] - Host collaborator traits and the plain renderer
//! - [`invalidation`] - Taxonomy stamps and cache sweeps
//! - [`recalc`] - Cart recalculation entry point

// =============================================================================
// Module Declarations
// =============================================================================

pub mod app;
pub mod clock;
pub mod config;
pub mod discount;
pub mod error;
pub mod filter;
pub mod host;
pub mod invalidation;
pub mod recalc;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use app::{HostCollaborators, Tierline};
pub use clock::{Clock, SystemClock};
pub use config::TierlineConfig;
pub use discount::{DiscountConfigSource, DiscountService, SavedConfiguration};
pub use error::{ServiceError, ServiceResult};
pub use filter::{FilterQueryService, FilterSettings};
pub use host::{
    CartRepository, ContentRepository, HostError, HostResult, ListingRenderer,
    PlainListingRenderer, ProductInfo, ProductRepository,
};
pub use invalidation::{ClearReport, InvalidationTracker};
pub use recalc::{CartRecalculator, PassReport};

// =============================================================================
// Tracing
// =============================================================================

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Call once from the embedding binary.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tierline=debug,sqlx=warn"));

    // Already installed by the host: keep theirs.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

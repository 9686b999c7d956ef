//! # tierline-core: Pure Pricing and Catalog Rules
//!
//! Everything in Tierline that has a rule worth testing lives here, as pure
//! functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tierline Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Host storefront (collaborator)                   │   │
//! │  │   product metadata • cart lines • content queries • rendering   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ traits                                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tierline-service                             │   │
//! │  │   DiscountService • CartRecalculator • FilterQueryService       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ tierline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ discount │ │ pricing  │ │ catalog  │ │ cache_key/format │  │   │
//! │  │   │RuleTable │ │ CartLine │ │  Term    │ │ CacheKey         │  │   │
//! │  │   │ Engine   │ │  Guard   │ │ Listing  │ │ PriceFormat      │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tierline-db (persistence)                       │   │
//! │  │        discount tiers • taxonomy versions • cache entries       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`discount`] - Discount rates, rule slots, rule tables, the engine
//! - [`pricing`] - Cart lines, the line pricer and the recalculation guard
//! - [`catalog`] - Terms, listing queries, content records, events
//! - [`cache_key`] - Versioned, hashed cache keys and payload envelopes
//! - [`format`] - Storefront price formatting
//! - [`money`] - Integer money
//! - [`validation`] - Request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tierline_core::{Money, PricingSubject, RuleTable};
//!
//! let subject = PricingSubject::variant(501, 500);
//! let table = RuleTable::default_for(subject.owner());
//!
//! let rate = table.resolve(60);                  // 45%
//! let unit = Money::from_cents(2000);
//! assert_eq!(unit.apply_discount(rate).cents(), 1100);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache_key;
pub mod catalog;
pub mod discount;
pub mod error;
pub mod format;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cache_key::{CacheKey, CachedEnvelope};
pub use catalog::*;
pub use discount::{
    DiscountEngine, DiscountQuote, DiscountRate, DiscountRule, RuleSource, RuleTable, TierSlot,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use format::PriceFormat;
pub use money::Money;
pub use pricing::{
    CartLine, CartLinePricer, LineDiscount, PassDecision, RecalculationGuard, RequestContext,
    SkipReason,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of rule slots a product's configuration can hold.
pub const MAX_RULE_SLOTS: usize = 7;

/// The slot whose range is always unbounded above.
pub const OPEN_ENDED_SLOT: u8 = 7;

/// Prefix of every cached term list key.
pub const TERMS_KEY_PREFIX: &str = "taxonomy_terms_";

/// Prefix of every cached listing key.
pub const LISTING_KEY_PREFIX: &str = "filter_";

/// All prefixes swept by a full filter cache clear.
pub const FILTER_KEY_PREFIXES: [&str; 2] = [TERMS_KEY_PREFIX, LISTING_KEY_PREFIX];

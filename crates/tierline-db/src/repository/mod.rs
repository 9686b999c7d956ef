//! # Repository Module
//!
//! SQLite repositories for Tierline.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DiscountService ──► db.tiers()     ──► discount_tiers                 │
//! │                      load_table / save_slots / clear                    │
//! │                                                                         │
//! │  InvalidationTracker ──► db.versions() ──► taxonomy_versions           │
//! │                          current_or_init / bump / all                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`DiscountConfigRepository`] - Per-product tier slots
//! - [`TaxonomyVersionRepository`] - Per-taxonomy version stamps

pub mod tiers;
pub mod versions;

pub use tiers::DiscountConfigRepository;
pub use versions::TaxonomyVersionRepository;

use crate::error::{DbError, DbResult};
use tierline_core::SubjectId;

/// Host ids are unsigned, SQLite integers are signed.
pub(crate) fn subject_to_sql(id: SubjectId) -> DbResult<i64> {
    i64::try_from(id).map_err(|_| DbError::SubjectOutOfRange(id))
}

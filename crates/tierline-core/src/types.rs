//! # Domain Types
//!
//! Identity types shared by the pricing and catalog halves of Tierline.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌───────────────────┐    │
//! │  │ PricingSubject  │   │ TaxonomyVersion  │   │    ContentId      │    │
//! │  │  ─────────────  │   │  ──────────────  │   │  ──────────────   │    │
//! │  │  id             │   │  taxonomy        │   │  host post id     │    │
//! │  │  parent_id?     │   │  last_modified   │   │                   │    │
//! │  │  owner() ─────► │   │  (ms stamp)      │   │                   │    │
//! │  └─────────────────┘   └──────────────────┘   └───────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Host product / variant identifier.
pub type SubjectId = u64;

/// Host content (post) identifier.
pub type ContentId = u64;

// =============================================================================
// Pricing Subject
// =============================================================================

/// A product or variant whose price may be discounted.
///
/// ## Ownership Rule
/// Variants never carry their own discount configuration. When `parent_id`
/// is set every lookup goes through the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PricingSubject {
    pub id: SubjectId,
    pub parent_id: Option<SubjectId>,
}

impl PricingSubject {
    pub const fn product(id: SubjectId) -> Self {
        PricingSubject {
            id,
            parent_id: None,
        }
    }

    pub const fn variant(id: SubjectId, parent_id: SubjectId) -> Self {
        PricingSubject {
            id,
            parent_id: Some(parent_id),
        }
    }

    /// The id whose rule table applies.
    pub const fn owner(&self) -> SubjectId {
        match self.parent_id {
            Some(parent) => parent,
            None => self.id,
        }
    }

    pub const fn is_variant(&self) -> bool {
        self.parent_id.is_some()
    }
}

// =============================================================================
// Taxonomy Version
// =============================================================================

/// The last-modified stamp of one taxonomy.
///
/// Stamps are Unix milliseconds and strictly increase on every touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyVersion {
    pub taxonomy: String,
    pub last_modified: i64,
}

impl TaxonomyVersion {
    pub fn new(taxonomy: impl Into<String>, last_modified: i64) -> Self {
        TaxonomyVersion {
            taxonomy: taxonomy.into(),
            last_modified,
        }
    }

    /// The stamp as a timestamp, for display.
    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_modified).single()
    }

    /// The next stamp after a touch at `now_ms`.
    ///
    /// Always strictly greater than the current one, even when the clock
    /// has not advanced.
    pub fn next_stamp(current: i64, now_ms: i64) -> i64 {
        now_ms.max(current.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_prefers_parent() {
        assert_eq!(PricingSubject::product(10).owner(), 10);
        assert_eq!(PricingSubject::variant(11, 10).owner(), 10);
        assert!(PricingSubject::variant(11, 10).is_variant());
    }

    #[test]
    fn test_next_stamp_is_monotonic() {
        assert_eq!(TaxonomyVersion::next_stamp(1_000, 5_000), 5_000);
        assert_eq!(TaxonomyVersion::next_stamp(5_000, 5_000), 5_001);
        assert_eq!(TaxonomyVersion::next_stamp(9_000, 5_000), 9_001);
    }

    #[test]
    fn test_last_modified_at() {
        let version = TaxonomyVersion::new("categories", 1_700_000_000_000);
        let at = version.last_modified_at().unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
    }
}

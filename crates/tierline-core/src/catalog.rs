//! # Catalog Types
//!
//! Terms, listing queries and content records for the filtered catalog.
//!
//! ## Two Shapes of Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  TermQuery { taxonomy, order_by, order, hide_empty }                    │
//! │      └──► Vec<Term { slug, name, count }>  ──► TermListing (filter bar) │
//! │                                                                         │
//! │  ListingQuery { taxonomy, term?, content_type, page_size }              │
//! │      ├──► phase 1: Vec<ContentId>          (ids only, ordered)          │
//! │      └──► phase 2: Vec<ContentRecord>      (same order)                 │
//! │                 └──► ListingPayload { html, found_count, no_results }   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ContentId;

// =============================================================================
// Terms
// =============================================================================

/// A taxonomy term with its content count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub slug: String,
    pub name: String,
    pub count: u64,
}

impl Term {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, count: u64) -> Self {
        Term {
            slug: slug.into(),
            name: name.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermOrderBy {
    Name,
    Slug,
    #[default]
    Count,
}

impl TermOrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermOrderBy::Name => "name",
            TermOrderBy::Slug => "slug",
            TermOrderBy::Count => "count",
        }
    }

    /// Unknown values fall back to `count`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => TermOrderBy::Name,
            "slug" => TermOrderBy::Slug,
            _ => TermOrderBy::Count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Unknown values fall back to `DESC`.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a term list lookup.
///
/// Defaults to count-descending with empty terms hidden.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermQuery {
    pub taxonomy: String,
    pub order_by: TermOrderBy,
    pub order: SortOrder,
    pub hide_empty: bool,
}

impl TermQuery {
    pub fn new(taxonomy: impl Into<String>) -> Self {
        TermQuery {
            taxonomy: taxonomy.into(),
            order_by: TermOrderBy::Count,
            order: SortOrder::Desc,
            hide_empty: true,
        }
    }

    pub fn order_by(mut self, order_by: TermOrderBy, order: SortOrder) -> Self {
        self.order_by = order_by;
        self.order = order;
        self
    }

    pub fn hide_empty(mut self, hide_empty: bool) -> Self {
        self.hide_empty = hide_empty;
        self
    }
}

// =============================================================================
// Term Listing
// =============================================================================

/// Presentation model of the filter bar.
///
/// The first `limit` terms are visible, the rest sit behind a "more"
/// toggle. `active` is `None` when "all" is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermListing {
    pub visible: Vec<Term>,
    pub hidden: Vec<Term>,
    pub active: Option<String>,
}

impl TermListing {
    pub fn new(mut terms: Vec<Term>, active: Option<&str>, limit: usize) -> Self {
        let hidden = if terms.len() > limit {
            terms.split_off(limit)
        } else {
            Vec::new()
        };

        // An active slug that isn't in the list selects "all".
        let active = active
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .filter(|slug| terms.iter().chain(hidden.iter()).any(|t| t.slug == *slug))
            .map(str::to_string);

        TermListing {
            visible: terms,
            hidden,
            active,
        }
    }

    pub fn has_more(&self) -> bool {
        !self.hidden.is_empty()
    }

    pub fn is_all_active(&self) -> bool {
        self.active.is_none()
    }

    pub fn is_active(&self, slug: &str) -> bool {
        self.active.as_deref() == Some(slug)
    }

    pub fn len(&self) -> usize {
        self.visible.len() + self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Listings
// =============================================================================

/// Parameters of a filtered content listing.
///
/// `term = None` lists everything in the taxonomy's content type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingQuery {
    pub taxonomy: String,
    pub term: Option<String>,
    pub content_type: String,
    pub page_size: u32,
}

impl ListingQuery {
    pub fn new(taxonomy: impl Into<String>, content_type: impl Into<String>, page_size: u32) -> Self {
        ListingQuery {
            taxonomy: taxonomy.into(),
            term: None,
            content_type: content_type.into(),
            page_size,
        }
    }

    /// Selects a term. `"all"` and blank slugs mean no term.
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = selected_term(&term.into()).map(str::to_string);
        self
    }
}

/// The trimmed slug a filter selection names, or `None` for `"all"` and
/// blank selections.
pub fn selected_term(term: &str) -> Option<&str> {
    let trimmed = term.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(trimmed)
    }
}

/// A fully loaded content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub content_type: String,
}

/// The rendered listing returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPayload {
    pub html: String,
    pub found_count: u64,
    /// Zero items matched. The html holds a visible empty-state block.
    pub no_results: bool,
}

impl ListingPayload {
    pub fn found(html: String, found_count: u64) -> Self {
        ListingPayload {
            html,
            found_count,
            no_results: false,
        }
    }

    pub fn empty(html: String) -> Self {
        ListingPayload {
            html,
            found_count: 0,
            no_results: true,
        }
    }
}

/// Restores the phase-one id order on phase-two records.
///
/// Records whose id was not asked for are dropped, as are ids the host
/// could no longer load.
pub fn order_by_ids(ids: &[ContentId], records: Vec<ContentRecord>) -> Vec<ContentRecord> {
    let mut by_id: std::collections::HashMap<ContentId, ContentRecord> =
        records.into_iter().map(|r| (r.id, r)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

// =============================================================================
// Content Events
// =============================================================================

/// A host mutation that may invalidate cached catalog results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContentEvent {
    TermCreated { taxonomy: String },
    TermEdited { taxonomy: String },
    TermDeleted { taxonomy: String },
    ContentSaved { content_type: String, autosave: bool },
    ContentDeleted { content_type: String },
}

impl ContentEvent {
    /// The taxonomy a term event names directly.
    pub fn taxonomy(&self) -> Option<&str> {
        match self {
            ContentEvent::TermCreated { taxonomy }
            | ContentEvent::TermEdited { taxonomy }
            | ContentEvent::TermDeleted { taxonomy } => Some(taxonomy),
            _ => None,
        }
    }

    /// The content type a content event names.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            ContentEvent::ContentSaved { content_type, .. }
            | ContentEvent::ContentDeleted { content_type } => Some(content_type),
            _ => None,
        }
    }

    /// Autosaves never invalidate anything.
    pub fn is_ignored(&self) -> bool {
        matches!(self, ContentEvent::ContentSaved { autosave: true, .. })
    }
}

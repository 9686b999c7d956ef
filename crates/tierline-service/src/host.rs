//! # Host Collaborators
//!
//! Everything Tierline needs from the storefront framework it runs inside.
//!
//! ## Seams
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   DiscountService ────────► ProductRepository   get(id)                 │
//! │                                                                         │
//! │   CartRecalculator ───────► CartRepository      get_lines               │
//! │                                                 set_line_price          │
//! │                                                 record_discount         │
//! │                                                                         │
//! │   FilterQueryService ─────► ContentRepository   list_terms              │
//! │   InvalidationTracker ────►                     query_ids / get_by_ids  │
//! │                                                 taxonomies_for          │
//! │                                                                         │
//! │   FilterQueryService ─────► ListingRenderer     render_items / empty    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;

use tierline_core::{
    CartLine, ContentId, ContentRecord, LineDiscount, ListingQuery, Money, PricingSubject,
    SubjectId, Term, TermQuery,
};

// =============================================================================
// Host Errors
// =============================================================================

pub type HostResult<T> = Result<T, HostError>;

/// Failures a host collaborator may report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The host could not answer (database down, timeout).
    #[error("{0}")]
    Unavailable(String),
}

impl HostError {
    pub fn product_not_found(id: SubjectId) -> Self {
        HostError::NotFound {
            entity: "Product",
            id: id.to_string(),
        }
    }

    pub fn line_not_found(key: &str) -> Self {
        HostError::NotFound {
            entity: "Cart line",
            id: key.to_string(),
        }
    }
}

// =============================================================================
// Products
// =============================================================================

/// What the host knows about a product or variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductInfo {
    pub id: SubjectId,
    /// Pre-sale price, when the host keeps one apart from the current price.
    pub regular_price: Option<Money>,
    pub current_price: Money,
    /// Set for variants.
    pub parent_id: Option<SubjectId>,
}

impl ProductInfo {
    pub fn subject(&self) -> PricingSubject {
        PricingSubject {
            id: self.id,
            parent_id: self.parent_id,
        }
    }

    /// The price a discount is computed from.
    pub fn base_price(&self) -> Money {
        self.regular_price.unwrap_or(self.current_price)
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fails with [`HostError::NotFound`] for an unknown id.
    async fn get(&self, id: SubjectId) -> HostResult<ProductInfo>;
}

// =============================================================================
// Cart
// =============================================================================

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Lines of the cart being recalculated.
    ///
    /// Hosts report the annotation written by [`record_discount`] back as
    /// `original_price` / `applied_discount`. Without it a line that has no
    /// distinct regular price would be discounted again on the next pass.
    ///
    /// A recorded `original_price` wins over `current_price`. When the
    /// product price changes under a line, the host drops the annotation
    /// (both fields `None`) and reports the new price as `current_price`.
    ///
    /// [`record_discount`]: CartRepository::record_discount
    async fn get_lines(&self) -> HostResult<Vec<CartLine>>;

    async fn set_line_price(&self, key: &str, price: Money) -> HostResult<()>;

    /// Stores (or clears) the struck-through original and rate for display.
    async fn record_discount(&self, key: &str, discount: Option<LineDiscount>) -> HostResult<()>;
}

// =============================================================================
// Content
// =============================================================================

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn taxonomy_exists(&self, taxonomy: &str) -> HostResult<bool>;

    async fn list_terms(&self, query: &TermQuery) -> HostResult<Vec<Term>>;

    /// Phase one: matching ids only, newest first, at most `page_size`.
    async fn query_ids(&self, query: &ListingQuery) -> HostResult<Vec<ContentId>>;

    /// Phase two: full records for `ids`. Order does not matter.
    async fn get_by_ids(&self, ids: &[ContentId]) -> HostResult<Vec<ContentRecord>>;

    /// Taxonomies attached to a content type.
    async fn taxonomies_for(&self, content_type: &str) -> HostResult<Vec<String>>;
}

// =============================================================================
// Rendering
// =============================================================================

/// Turns loaded records into the html fragment a listing request returns.
pub trait ListingRenderer: Send + Sync {
    fn render_items(&self, query: &ListingQuery, records: &[ContentRecord]) -> String;

    /// Visible empty-state block for zero matches.
    fn render_empty(&self, query: &ListingQuery) -> String;
}

/// Minimal markup: a title link and an excerpt per record.
#[derive(Debug, Clone)]
pub struct PlainListingRenderer {
    empty_message: String,
}

impl PlainListingRenderer {
    pub fn new(empty_message: impl Into<String>) -> Self {
        PlainListingRenderer {
            empty_message: empty_message.into(),
        }
    }
}

impl Default for PlainListingRenderer {
    fn default() -> Self {
        PlainListingRenderer::new("Записи не найдены")
    }
}

impl ListingRenderer for PlainListingRenderer {
    fn render_items(&self, query: &ListingQuery, records: &[ContentRecord]) -> String {
        let mut html = String::new();
        for record in records {
            html.push_str(&format!(
                r#"<div class="listing-item post-{} type-{}"><h3><a href="{}">{}</a></h3><div>{}</div></div>"#,
                record.id,
                escape_html(&query.content_type),
                escape_html(&record.url),
                escape_html(&record.title),
                escape_html(&record.excerpt),
            ));
        }
        html
    }

    fn render_empty(&self, _query: &ListingQuery) -> String {
        format!(
            r#"<div class="no-posts-found">{}</div>"#,
            escape_html(&self.empty_message)
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

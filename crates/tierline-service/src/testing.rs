//! In-test host fakes that count how often they are called.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tierline_core::{
    CartLine, ContentId, ContentRecord, LineDiscount, ListingQuery, Money, SubjectId, Term,
    TermQuery,
};
use tierline_db::{CacheStore, DbError, DbResult};

use crate::clock::Clock;
use crate::host::{
    CartRepository, ContentRepository, HostError, HostResult, ProductInfo, ProductRepository,
};

// =============================================================================
// Clock
// =============================================================================

#[derive(Debug)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn at(ms: i64) -> Self {
        FixedClock(AtomicI64::new(ms))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Default)]
pub struct FakeProducts {
    products: HashMap<SubjectId, ProductInfo>,
    unavailable: bool,
}

impl FakeProducts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, id: SubjectId, regular: Option<i64>, current: i64) -> Self {
        self.products.insert(
            id,
            ProductInfo {
                id,
                regular_price: regular.map(Money::from_cents),
                current_price: Money::from_cents(current),
                parent_id: None,
            },
        );
        self
    }

    pub fn with_variant(mut self, id: SubjectId, parent: SubjectId, current: i64) -> Self {
        self.products.insert(
            id,
            ProductInfo {
                id,
                regular_price: None,
                current_price: Money::from_cents(current),
                parent_id: Some(parent),
            },
        );
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl ProductRepository for FakeProducts {
    async fn get(&self, id: SubjectId) -> HostResult<ProductInfo> {
        if self.unavailable {
            return Err(HostError::Unavailable("product store offline".into()));
        }
        self.products
            .get(&id)
            .copied()
            .ok_or_else(|| HostError::product_not_found(id))
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Keeps prices and annotations between passes like a host cart session.
#[derive(Debug, Default)]
pub struct FakeCart {
    lines: Mutex<Vec<CartLine>>,
    pub price_writes: AtomicUsize,
    fail_price_write: AtomicBool,
    fail_discount_write: AtomicBool,
}

impl FakeCart {
    pub fn new(lines: Vec<CartLine>) -> Self {
        FakeCart {
            lines: Mutex::new(lines),
            price_writes: AtomicUsize::new(0),
            fail_price_write: AtomicBool::new(false),
            fail_discount_write: AtomicBool::new(false),
        }
    }

    /// The next `set_line_price` fails with `Unavailable`.
    pub fn fail_next_price_write(&self) {
        self.fail_price_write.store(true, Ordering::SeqCst);
    }

    /// The next `record_discount` fails with `Unavailable`.
    pub fn fail_next_discount_write(&self) {
        self.fail_discount_write.store(true, Ordering::SeqCst);
    }

    pub fn set_quantity(&self, key: &str, quantity: u32) {
        let mut lines = self.lines.lock().unwrap();
        if let Some(line) = lines.iter_mut().find(|l| l.key == key) {
            line.quantity = quantity;
        }
    }

    pub fn line(&self, key: &str) -> CartLine {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.key == key)
            .cloned()
            .unwrap()
    }

    pub fn writes(&self) -> usize {
        self.price_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CartRepository for FakeCart {
    async fn get_lines(&self) -> HostResult<Vec<CartLine>> {
        Ok(self.lines.lock().unwrap().clone())
    }

    async fn set_line_price(&self, key: &str, price: Money) -> HostResult<()> {
        if self.fail_price_write.swap(false, Ordering::SeqCst) {
            return Err(HostError::Unavailable("cart session write failed".into()));
        }
        let mut lines = self.lines.lock().unwrap();
        let line = lines
            .iter_mut()
            .find(|l| l.key == key)
            .ok_or_else(|| HostError::line_not_found(key))?;
        line.current_price = price;
        self.price_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn record_discount(&self, key: &str, discount: Option<LineDiscount>) -> HostResult<()> {
        if self.fail_discount_write.swap(false, Ordering::SeqCst) {
            return Err(HostError::Unavailable("cart session write failed".into()));
        }
        let mut lines = self.lines.lock().unwrap();
        let line = lines
            .iter_mut()
            .find(|l| l.key == key)
            .ok_or_else(|| HostError::line_not_found(key))?;
        line.original_price = discount.map(|d| d.original_price);
        line.applied_discount = discount.map(|d| d.rate);
        Ok(())
    }
}

// =============================================================================
// Content
// =============================================================================

#[derive(Debug, Clone)]
pub struct FakePost {
    pub record: ContentRecord,
    /// (taxonomy, slug)
    pub terms: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct FakeContent {
    terms: HashMap<String, Vec<Term>>,
    /// Newest first.
    posts: Vec<FakePost>,
    taxonomies: HashMap<String, Vec<String>>,
    unavailable: AtomicBool,
    pub term_queries: AtomicUsize,
    pub id_queries: AtomicUsize,
    pub record_queries: AtomicUsize,
}

impl FakeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_taxonomy(mut self, content_type: &str, taxonomy: &str, terms: Vec<Term>) -> Self {
        self.terms.insert(taxonomy.to_string(), terms);
        self.taxonomies
            .entry(content_type.to_string())
            .or_default()
            .push(taxonomy.to_string());
        self
    }

    pub fn with_post(mut self, id: ContentId, content_type: &str, terms: &[(&str, &str)]) -> Self {
        self.posts.push(FakePost {
            record: ContentRecord {
                id,
                title: format!("Post {id}"),
                url: format!("/{content_type}/{id}"),
                excerpt: String::new(),
                content_type: content_type.to_string(),
            },
            terms: terms
                .iter()
                .map(|(t, s)| (t.to_string(), s.to_string()))
                .collect(),
        });
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.term_queries.load(Ordering::SeqCst),
            self.id_queries.load(Ordering::SeqCst),
            self.record_queries.load(Ordering::SeqCst),
        )
    }

    fn check(&self) -> HostResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(HostError::Unavailable("content store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentRepository for FakeContent {
    async fn taxonomy_exists(&self, taxonomy: &str) -> HostResult<bool> {
        self.check()?;
        Ok(self.terms.contains_key(taxonomy))
    }

    async fn list_terms(&self, query: &TermQuery) -> HostResult<Vec<Term>> {
        self.term_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut terms = self.terms.get(&query.taxonomy).cloned().unwrap_or_default();
        if query.hide_empty {
            terms.retain(|t| t.count > 0);
        }
        terms.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(terms)
    }

    async fn query_ids(&self, query: &ListingQuery) -> HostResult<Vec<ContentId>> {
        self.id_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .posts
            .iter()
            .filter(|p| p.record.content_type == query.content_type)
            .filter(|p| match &query.term {
                Some(slug) => p
                    .terms
                    .iter()
                    .any(|(t, s)| *t == query.taxonomy && s == slug),
                None => true,
            })
            .take(query.page_size as usize)
            .map(|p| p.record.id)
            .collect())
    }

    async fn get_by_ids(&self, ids: &[ContentId]) -> HostResult<Vec<ContentRecord>> {
        self.record_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        // Deliberately reversed: callers must restore the id order.
        Ok(self
            .posts
            .iter()
            .rev()
            .filter(|p| ids.contains(&p.record.id))
            .map(|p| p.record.clone())
            .collect())
    }

    async fn taxonomies_for(&self, content_type: &str) -> HostResult<Vec<String>> {
        self.check()?;
        Ok(self.taxonomies.get(content_type).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Cache
// =============================================================================

/// A cache backend that is always down.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> DbResult<Option<Vec<u8>>> {
        Err(DbError::ConnectionFailed("cache offline".into()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> DbResult<()> {
        Err(DbError::ConnectionFailed("cache offline".into()))
    }

    async fn delete_by_prefix(&self, _prefix: &str) -> DbResult<u64> {
        Err(DbError::ConnectionFailed("cache offline".into()))
    }

    async fn purge_expired(&self) -> DbResult<u64> {
        Err(DbError::ConnectionFailed("cache offline".into()))
    }
}

//! # Cache Keys
//!
//! Derives cache keys for term lists and listings, and wraps cached values
//! in a versioned envelope.
//!
//! ## Key Versioning
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  (taxonomy, orderBy, order, hideEmpty, term, contentType, pageSize,     │
//! │   stamp(taxonomy))                                                      │
//! │        │                                                                │
//! │        ▼ length-prefixed fields → SHA-256 → hex                         │
//! │  "filter_3f9a…"   /   "taxonomy_terms_b01c…"                           │
//! │                                                                         │
//! │  Touch(taxonomy) ──► new stamp ──► new key. Old keys are never looked  │
//! │  up again and simply expire.                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::catalog::{ListingQuery, SortOrder, TermQuery};
use crate::error::CoreResult;
use crate::{LISTING_KEY_PREFIX, TERMS_KEY_PREFIX};

/// Listings are always ordered newest first.
const LISTING_ORDER_BY: &str = "date";

// =============================================================================
// Cache Key
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of a term list lookup at `stamp`.
    pub fn terms(query: &TermQuery, stamp: i64) -> Self {
        Self::build(
            TERMS_KEY_PREFIX,
            &[
                query.taxonomy.as_bytes(),
                query.order_by.as_str().as_bytes(),
                query.order.as_str().as_bytes(),
                bool_field(query.hide_empty),
                b"",
                b"",
                &0u32.to_le_bytes(),
                &stamp.to_le_bytes(),
            ],
        )
    }

    /// Key of a rendered listing at `stamp`.
    pub fn listing(query: &ListingQuery, stamp: i64) -> Self {
        Self::build(
            LISTING_KEY_PREFIX,
            &[
                query.taxonomy.as_bytes(),
                LISTING_ORDER_BY.as_bytes(),
                SortOrder::Desc.as_str().as_bytes(),
                bool_field(false),
                query.term.as_deref().unwrap_or("").as_bytes(),
                query.content_type.as_bytes(),
                &query.page_size.to_le_bytes(),
                &stamp.to_le_bytes(),
            ],
        )
    }

    fn build(prefix: &str, fields: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for field in fields {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        CacheKey(format!("{}{}", prefix, hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn bool_field(value: bool) -> &'static [u8] {
    if value {
        b"1"
    } else {
        b"0"
    }
}

// =============================================================================
// Cached Envelope
// =============================================================================

/// A cached value tagged with the stamp it was computed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEnvelope<T> {
    pub version: i64,
    pub value: T,
}

impl<T> CachedEnvelope<T> {
    pub fn new(version: i64, value: T) -> Self {
        CachedEnvelope { version, value }
    }
}

impl<T: Serialize> CachedEnvelope<T> {
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<T: DeserializeOwned> CachedEnvelope<T> {
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decodes and returns the value only when it was stored at `version`.
    pub fn open(bytes: &[u8], version: i64) -> CoreResult<Option<T>> {
        let envelope = Self::decode(bytes)?;
        Ok((envelope.version == version).then_some(envelope.value))
    }
}

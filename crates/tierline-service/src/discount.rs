//! # Discount Service
//!
//! Resolves volume discounts for host products.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  resolve_discount(quantity, subject_id)                                │
//! │       │                                                                 │
//! │       ├── quantity ≤ 0 ─────────────────────► InvalidInput              │
//! │       ▼                                                                 │
//! │  ProductRepository::get(subject_id)                                    │
//! │       ├── NotFound ─────────────────────────► 0%                        │
//! │       ├── Unavailable ──────────────────────► Unavailable               │
//! │       ▼                                                                 │
//! │  PricingSubject { id, parent_id } ── owner() ─► parent for variants   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DiscountConfigSource::load_table(owner)   (default bands if unset)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DiscountEngine::resolve ─► first matching band, else 0%               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use tierline_core::discount::{parse_slots, SlotRejection};
use tierline_core::validation::validate_quantity;
use tierline_core::{
    DiscountEngine, DiscountQuote, DiscountRate, PricingSubject, RuleTable, SubjectId, TierSlot,
    ValidationError,
};
use tierline_db::{DbResult, DiscountConfigRepository};

use crate::error::ServiceResult;
use crate::host::{HostError, ProductRepository};

// =============================================================================
// Configuration Source
// =============================================================================

/// Where per-product rule slots live.
#[async_trait]
pub trait DiscountConfigSource: Send + Sync {
    /// The owner's table, or the default bands when nothing valid is stored.
    async fn load_table(&self, owner: SubjectId) -> DbResult<RuleTable>;

    /// Replaces the owner's slots. Returns how many were stored.
    async fn save_slots(&self, owner: SubjectId, slots: &[TierSlot]) -> DbResult<usize>;
}

#[async_trait]
impl DiscountConfigSource for DiscountConfigRepository {
    async fn load_table(&self, owner: SubjectId) -> DbResult<RuleTable> {
        DiscountConfigRepository::load_table(self, owner).await
    }

    async fn save_slots(&self, owner: SubjectId, slots: &[TierSlot]) -> DbResult<usize> {
        DiscountConfigRepository::save_slots(self, owner, slots).await
    }
}

// =============================================================================
// Discount Service
// =============================================================================

/// Outcome of saving a product's slots from the admin form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedConfiguration {
    pub stored: usize,
    /// Stored slots that will not take part in lookups.
    pub rejected: Vec<SlotRejection>,
}

pub struct DiscountService {
    products: Arc<dyn ProductRepository>,
    tiers: Arc<dyn DiscountConfigSource>,
}

impl DiscountService {
    pub fn new(products: Arc<dyn ProductRepository>, tiers: Arc<dyn DiscountConfigSource>) -> Self {
        DiscountService { products, tiers }
    }

    /// The table that prices `subject`: its parent's for a variant.
    pub async fn table_for(&self, subject: &PricingSubject) -> ServiceResult<RuleTable> {
        Ok(self.tiers.load_table(subject.owner()).await?)
    }

    /// Resolves the rate for an already identified subject.
    pub async fn resolve_for_subject(
        &self,
        quantity: u32,
        subject: &PricingSubject,
    ) -> ServiceResult<DiscountRate> {
        let table = self.table_for(subject).await?;
        let rate = DiscountEngine::resolve(quantity, subject, &table);

        debug!(
            subject_id = subject.id,
            owner = subject.owner(),
            quantity,
            rate = %rate,
            source = ?table.source(),
            "Discount resolved"
        );
        Ok(rate)
    }

    /// Discount for `quantity` units of `subject_id`.
    ///
    /// An unknown product resolves to 0%.
    pub async fn resolve_discount(
        &self,
        quantity: i64,
        subject_id: SubjectId,
    ) -> ServiceResult<DiscountRate> {
        let quantity = validate_quantity(quantity)?;

        let product = match self.products.get(subject_id).await {
            Ok(product) => product,
            Err(HostError::NotFound { .. }) => {
                debug!(subject_id, "Unknown product, no discount");
                return Ok(DiscountRate::zero());
            }
            Err(err) => return Err(err.into()),
        };

        self.resolve_for_subject(quantity, &product.subject()).await
    }

    /// Price preview for the product page.
    pub async fn quote(&self, subject_id: SubjectId, quantity: i64) -> ServiceResult<DiscountQuote> {
        let quantity = validate_quantity(quantity)?;
        let product = self.products.get(subject_id).await?;
        let rate = self.resolve_for_subject(quantity, &product.subject()).await?;

        Ok(DiscountQuote::compute(product.base_price(), rate, quantity))
    }

    /// Stores the admin form's slots for a product.
    ///
    /// Variants have no configuration of their own and are refused.
    pub async fn save_configuration(
        &self,
        subject_id: SubjectId,
        slots: &[TierSlot],
    ) -> ServiceResult<SavedConfiguration> {
        let product = self.products.get(subject_id).await?;
        if product.parent_id.is_some() {
            return Err(ValidationError::invalid_format(
                "subject_id",
                "variants use their parent's discount configuration",
            )
            .into());
        }

        let stored = self.tiers.save_slots(subject_id, slots).await?;
        let rejected = parse_slots(slots)
            .rejected
            .into_iter()
            .filter(|r| {
                slots
                    .iter()
                    .find(|s| s.slot == r.slot)
                    .map_or(true, |s| !is_blank(s))
            })
            .collect::<Vec<_>>();

        info!(
            subject_id,
            stored,
            rejected = rejected.len(),
            "Discount configuration updated"
        );
        Ok(SavedConfiguration { stored, rejected })
    }
}

fn is_blank(slot: &TierSlot) -> bool {
    slot.min.trim().is_empty() && slot.max.trim().is_empty() && slot.percentage.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::FakeProducts;
    use tierline_core::Money;
    use tierline_db::{Database, DbConfig};

    async fn service(products: FakeProducts) -> DiscountService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        DiscountService::new(Arc::new(products), Arc::new(db.tiers()))
    }

    fn catalog() -> FakeProducts {
        FakeProducts::new()
            .with_product(10, Some(10_000), 8_000)
            .with_product(20, None, 2_000)
            .with_variant(21, 20, 2_500)
    }

    #[tokio::test]
    async fn test_unconfigured_product_uses_default_bands() {
        let service = service(catalog()).await;

        assert_eq!(service.resolve_discount(3, 10).await.unwrap(), DiscountRate::zero());
        assert_eq!(service.resolve_discount(150, 10).await.unwrap(), DiscountRate::from_bps(4650));
        assert_eq!(service.resolve_discount(900, 10).await.unwrap(), DiscountRate::from_bps(5000));
    }

    #[tokio::test]
    async fn test_sixty_units_cost_fifty_five_percent() {
        let service = service(catalog()).await;
        let quote = service.quote(10, 60).await.unwrap();

        assert_eq!(quote.rate, DiscountRate::from_bps(4500));
        assert_eq!(quote.original_unit, Money::from_cents(10_000));
        assert_eq!(quote.discounted_unit, Money::from_cents(5_500));
        assert_eq!(quote.savings_total, Money::from_cents(4_500 * 60));
        assert!(quote.has_discount);
    }

    #[tokio::test]
    async fn test_comma_decimal_percentage() {
        let service = service(catalog()).await;
        service
            .save_configuration(10, &[TierSlot::new(1, "1", "100", "12,5")])
            .await
            .unwrap();

        assert_eq!(service.resolve_discount(7, 10).await.unwrap(), DiscountRate::from_bps(1250));
    }

    #[tokio::test]
    async fn test_variant_inherits_parent_table() {
        let products = catalog();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tiers = db.tiers();

        // A stray configuration stored under the variant id must be ignored.
        tiers.save_slots(21, &[TierSlot::new(1, "1", "100", "90")]).await.unwrap();
        tiers.save_slots(20, &[TierSlot::new(1, "1", "100", "10")]).await.unwrap();

        let service = DiscountService::new(Arc::new(products), Arc::new(tiers));
        assert_eq!(service.resolve_discount(5, 21).await.unwrap(), DiscountRate::from_bps(1000));

        let quote = service.quote(21, 5).await.unwrap();
        assert_eq!(quote.original_unit, Money::from_cents(2_500));
        assert_eq!(quote.discounted_unit, Money::from_cents(2_250));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let service = service(catalog()).await;

        assert_eq!(service.resolve_discount(60, 404).await.unwrap(), DiscountRate::zero());
        assert!(service.quote(404, 60).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_non_positive_quantity_is_rejected() {
        let service = service(catalog()).await;

        for quantity in [0, -3] {
            assert!(matches!(
                service.resolve_discount(quantity, 10).await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_host_outage_is_distinct() {
        let service = service(catalog().unavailable()).await;
        let err = service.resolve_discount(5, 10).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_save_reports_rejected_slots() {
        let service = service(catalog()).await;
        let saved = service
            .save_configuration(
                10,
                &[
                    TierSlot::new(1, "5", "2", "3"),
                    TierSlot::new(2, "", "", ""),
                    TierSlot::new(3, "10", "20", "4"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(saved.stored, 2);
        assert_eq!(saved.rejected.len(), 1);
        assert_eq!(saved.rejected[0].slot, 1);
        assert_eq!(service.resolve_discount(15, 10).await.unwrap(), DiscountRate::from_bps(400));
    }

    #[tokio::test]
    async fn test_variants_cannot_be_configured() {
        let service = service(catalog()).await;
        let err = service
            .save_configuration(21, &[TierSlot::new(1, "1", "5", "3")])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}

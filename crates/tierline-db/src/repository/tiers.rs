//! # Discount Tier Repository
//!
//! Stores the up-to-seven raw rule slots of each product and turns them
//! into a [`RuleTable`] on read.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  load_table(owner)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT slot, min_qty, max_qty, percentage  (ORDER BY slot)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RuleTable::from_slots  ── rejected slots ──► warn! (slot, reason)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Configured table, or the default bands when nothing survived          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Variants are never looked up here directly: callers pass the owner id.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use tierline_core::discount::normalize_slot;
use tierline_core::{RuleTable, SubjectId, TierSlot, MAX_RULE_SLOTS};

use super::subject_to_sql;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct DiscountConfigRepository {
    pool: SqlitePool,
}

impl DiscountConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountConfigRepository { pool }
    }

    /// Raw stored slots of `subject_id`, ordered by slot number.
    pub async fn load_slots(&self, subject_id: SubjectId) -> DbResult<Vec<TierSlot>> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            r#"
            SELECT slot, min_qty, max_qty, percentage
            FROM discount_tiers
            WHERE subject_id = ?1
            ORDER BY slot
            "#,
        )
        .bind(subject_to_sql(subject_id)?)
        .fetch_all(&self.pool)
        .await?;

        let slots = rows
            .into_iter()
            .filter_map(|(slot, min, max, percentage)| {
                u8::try_from(slot).ok().map(|slot| TierSlot {
                    slot,
                    min,
                    max,
                    percentage,
                })
            })
            .collect::<Vec<_>>();

        debug!(subject_id, slots = slots.len(), "Loaded tier slots");
        Ok(slots)
    }

    /// The rule table owned by `owner`.
    ///
    /// Slots that fail to parse are logged and skipped.
    pub async fn load_table(&self, owner: SubjectId) -> DbResult<RuleTable> {
        let slots = self.load_slots(owner).await?;
        let (table, rejected) = RuleTable::from_slots(owner, &slots);

        for rejection in &rejected {
            warn!(
                subject_id = owner,
                slot = rejection.slot,
                reason = %rejection.reason,
                "Discount slot excluded"
            );
        }

        debug!(
            subject_id = owner,
            rules = table.rules().len(),
            source = ?table.source(),
            "Resolved rule table"
        );
        Ok(table)
    }

    /// Replaces every slot of `subject_id`.
    ///
    /// Slots are normalised before storage and fully blank slots are not
    /// stored. Runs in one transaction so readers see the old or the new
    /// table, never a mix.
    pub async fn save_slots(&self, subject_id: SubjectId, slots: &[TierSlot]) -> DbResult<usize> {
        let id = subject_to_sql(subject_id)?;
        let now = Utc::now();

        if let Some(bad) = slots
            .iter()
            .find(|s| s.slot == 0 || s.slot as usize > MAX_RULE_SLOTS)
        {
            return Err(DbError::InvalidSlot {
                subject_id,
                slot: bad.slot,
                max: MAX_RULE_SLOTS,
            });
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM discount_tiers WHERE subject_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let mut stored = 0;
        for slot in slots.iter().map(normalize_slot) {
            if slot.min.is_empty() && slot.max.is_empty() && slot.percentage.is_empty() {
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO discount_tiers (subject_id, slot, min_qty, max_qty, percentage, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(subject_id, slot) DO UPDATE SET
                    min_qty = excluded.min_qty,
                    max_qty = excluded.max_qty,
                    percentage = excluded.percentage,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(id)
            .bind(slot.slot as i64)
            .bind(&slot.min)
            .bind(&slot.max)
            .bind(&slot.percentage)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            stored += 1;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(subject_id, stored, "Discount configuration saved");
        Ok(stored)
    }

    /// Removes the configuration of `subject_id`. Returns removed slots.
    pub async fn clear(&self, subject_id: SubjectId) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM discount_tiers WHERE subject_id = ?1")
            .bind(subject_to_sql(subject_id)?)
            .execute(&self.pool)
            .await?;

        info!(subject_id, removed = result.rows_affected(), "Discount configuration cleared");
        Ok(result.rows_affected())
    }

    /// Products that have at least one stored slot.
    pub async fn configured_subjects(&self) -> DbResult<Vec<SubjectId>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT subject_id FROM discount_tiers ORDER BY subject_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| SubjectId::try_from(id).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use tierline_core::{DiscountRate, RuleSource};

    async fn repo() -> DiscountConfigRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().tiers()
    }

    #[tokio::test]
    async fn test_unconfigured_subject_gets_default_table() {
        let repo = repo().await;
        let table = repo.load_table(42).await.unwrap();
        assert!(table.is_default());
        assert_eq!(table.resolve(150), DiscountRate::from_bps(4650));
    }

    #[tokio::test]
    async fn test_save_normalises_and_loads() {
        let repo = repo().await;
        let stored = repo
            .save_slots(
                10,
                &[
                    TierSlot::new(1, " 2 ", "9", "12,5"),
                    TierSlot::new(2, "", "", ""),
                    TierSlot::new(7, "10", "999999", "20"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(stored, 2);

        let slots = repo.load_slots(10).await.unwrap();
        assert_eq!(slots[0], TierSlot::new(1, "2", "9", "12.5"));
        assert_eq!(slots[1], TierSlot::new(7, "10", "", "20"));

        let table = repo.load_table(10).await.unwrap();
        assert_eq!(table.source(), RuleSource::Configured);
        assert_eq!(table.resolve(5), DiscountRate::from_bps(1250));
        assert_eq!(table.resolve(1_000_000), DiscountRate::from_bps(2000));
        assert_eq!(table.resolve(1), DiscountRate::zero());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_slots() {
        let repo = repo().await;
        repo.save_slots(10, &[TierSlot::new(1, "1", "5", "3"), TierSlot::new(2, "6", "9", "4")])
            .await
            .unwrap();
        repo.save_slots(10, &[TierSlot::new(1, "1", "5", "7")]).await.unwrap();

        let slots = repo.load_slots(10).await.unwrap();
        assert_eq!(slots, vec![TierSlot::new(1, "1", "5", "7")]);
    }

    #[tokio::test]
    async fn test_invalid_stored_slots_fall_back_to_default() {
        let repo = repo().await;
        repo.save_slots(11, &[TierSlot::new(1, "abc", "5", "3")])
            .await
            .unwrap();
        assert!(repo.load_table(11).await.unwrap().is_default());
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_slot() {
        let repo = repo().await;
        let err = repo
            .save_slots(12, &[TierSlot::new(8, "1", "2", "3")])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidSlot { slot: 8, .. }));
    }

    #[tokio::test]
    async fn test_clear_and_configured_subjects() {
        let repo = repo().await;
        repo.save_slots(3, &[TierSlot::new(1, "1", "5", "3")]).await.unwrap();
        repo.save_slots(1, &[TierSlot::new(1, "1", "5", "3")]).await.unwrap();
        assert_eq!(repo.configured_subjects().await.unwrap(), vec![1, 3]);

        assert_eq!(repo.clear(3).await.unwrap(), 1);
        assert_eq!(repo.configured_subjects().await.unwrap(), vec![1]);
        assert!(repo.load_table(3).await.unwrap().is_default());
    }
}

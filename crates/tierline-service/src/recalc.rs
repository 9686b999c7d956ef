//! # Cart Recalculation
//!
//! Entry point the host calls from its cart-totals hook.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  recalculate(&mut guard)                                               │
//! │       │                                                                 │
//! │       ▼ guard.begin_pass()                                              │
//! │  Skip ─────────────────────────────► PassReport { skipped: Some(..) }  │
//! │       │                               cart untouched                   │
//! │  Recalculate                                                            │
//! │       │                                                                 │
//! │       ▼ for each line                                                   │
//! │  pricing_subject() ─► owner table (loaded once per owner per pass)     │
//! │       │                                                                 │
//! │       ▼ CartLinePricer::apply                                           │
//! │  record_discount(key, annotation)  then  set_line_price(key, price)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use tierline_core::{
    CartLine, CartLinePricer, DiscountEngine, Money, PassDecision, RecalculationGuard, RuleTable,
    SkipReason, SubjectId,
};

use crate::discount::DiscountService;
use crate::error::ServiceResult;
use crate::host::CartRepository;

/// Result of one pass over the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub pass: u32,
    pub skipped: Option<SkipReason>,
    /// Priced lines. Empty when the pass was skipped.
    pub lines: Vec<CartLine>,
}

impl PassReport {
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    pub fn discounted_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.discount().is_some()).count()
    }

    pub fn total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |sum, line| sum + line.line_total())
    }
}

pub struct CartRecalculator {
    cart: Arc<dyn CartRepository>,
    discounts: Arc<DiscountService>,
}

impl CartRecalculator {
    pub fn new(cart: Arc<dyn CartRepository>, discounts: Arc<DiscountService>) -> Self {
        CartRecalculator { cart, discounts }
    }

    /// Runs one guarded pass.
    ///
    /// The guard belongs to the current request. The host creates a new one
    /// (or resets it) for every request.
    pub async fn recalculate(&self, guard: &mut RecalculationGuard) -> ServiceResult<PassReport> {
        let pass = match guard.begin_pass() {
            PassDecision::Skip { pass, reason } => {
                info!(pass, ?reason, "Cart recalculation pass skipped");
                return Ok(PassReport {
                    pass,
                    skipped: Some(reason),
                    lines: Vec::new(),
                });
            }
            PassDecision::Recalculate { pass } => pass,
        };

        let lines = self.cart.get_lines().await?;
        let mut tables: HashMap<SubjectId, RuleTable> = HashMap::new();
        let mut priced = Vec::with_capacity(lines.len());

        for line in lines {
            let subject = line.pricing_subject();
            let owner = subject.owner();
            if !tables.contains_key(&owner) {
                let table = self.discounts.table_for(&subject).await?;
                tables.insert(owner, table);
            }

            let rate = match tables.get(&owner) {
                Some(table) if line.quantity > 0 => {
                    DiscountEngine::resolve(line.quantity, &subject, table)
                }
                _ => Default::default(),
            };

            let line = CartLinePricer::apply(&line, rate);
            self.write_line(&line).await?;

            debug!(
                line = %line.key,
                quantity = line.quantity,
                rate = %rate,
                price = %line.effective_price,
                "Cart line priced"
            );
            priced.push(line);
        }

        let report = PassReport {
            pass,
            skipped: None,
            lines: priced,
        };
        info!(
            pass,
            lines = report.lines.len(),
            discounted = report.discounted_lines(),
            "Cart recalculated"
        );
        Ok(report)
    }

    /// The cart must hold the base price somewhere after either write fails:
    /// a discounted price is only written once its original is recorded, and
    /// an annotation is only cleared once the base price is back.
    async fn write_line(&self, line: &CartLine) -> ServiceResult<()> {
        match line.discount() {
            Some(discount) => {
                self.cart.record_discount(&line.key, Some(discount)).await?;
                self.cart.set_line_price(&line.key, line.effective_price).await?;
            }
            None => {
                self.cart.set_line_price(&line.key, line.effective_price).await?;
                self.cart.record_discount(&line.key, None).await?;
            }
        }
        Ok(())
    }
}

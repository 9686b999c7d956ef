//! # Cart Line Pricing
//!
//! Applies a resolved discount to cart lines and bounds how often a request
//! may re-run the recalculation pass.
//!
//! ## One Request, Several Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  request ──► RecalculationGuard::new(ctx)        (pass counter = 0)     │
//! │                  │                                                      │
//! │   host fires ──► begin_pass() ─► Recalculate { pass: 1 }                │
//! │   totals hook        │               │                                  │
//! │                      │               ▼                                  │
//! │                      │     CartLinePricer::apply(line, rate)            │
//! │                      │       base = regular price, never the           │
//! │                      │       previously discounted one                 │
//! │                      │                                                  │
//! │   fires again ──► begin_pass() ─► Skip { pass: 2 } (admin, no async)   │
//! │                                  or Recalculate { pass: 2 } (same      │
//! │                                  result as pass 1)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotence
//! `apply(apply(line, r), r) == apply(line, r)` because the base price is
//! read from the regular price (or the original price recorded by the
//! first pass), never from the effective price.

use serde::{Deserialize, Serialize};

use crate::discount::DiscountRate;
use crate::money::Money;
use crate::types::{PricingSubject, SubjectId};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the host cart, as seen by the pricer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Host cart line key.
    pub key: String,

    /// Product id (the parent when the line holds a variant).
    pub subject_id: SubjectId,

    pub variant_id: Option<SubjectId>,

    pub quantity: u32,

    /// Pre-discount price, when the host has a distinct one.
    pub regular_price: Option<Money>,

    /// Price the host currently holds for the line.
    pub current_price: Money,

    /// Base price recorded by the last pricing pass.
    pub original_price: Option<Money>,

    /// Price after the applied discount.
    pub effective_price: Money,

    /// `None` when no discount applies.
    pub applied_discount: Option<DiscountRate>,
}

impl CartLine {
    pub fn new(
        key: impl Into<String>,
        subject_id: SubjectId,
        quantity: u32,
        current_price: Money,
    ) -> Self {
        CartLine {
            key: key.into(),
            subject_id,
            variant_id: None,
            quantity,
            regular_price: None,
            current_price,
            original_price: None,
            effective_price: current_price,
            applied_discount: None,
        }
    }

    pub fn with_variant(mut self, variant_id: SubjectId) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    pub fn with_regular_price(mut self, regular_price: Money) -> Self {
        self.regular_price = Some(regular_price);
        self
    }

    /// The subject whose rule table prices this line.
    pub fn pricing_subject(&self) -> PricingSubject {
        match self.variant_id {
            Some(variant) => PricingSubject::variant(variant, self.subject_id),
            None => PricingSubject::product(self.subject_id),
        }
    }

    /// Regular price, else the original recorded by an earlier pass, else
    /// the current price.
    ///
    /// A recorded original is trusted as is. Hosts clear it when the
    /// product is repriced.
    pub fn base_price(&self) -> Money {
        self.regular_price
            .or(self.original_price)
            .unwrap_or(self.current_price)
    }

    /// The discount annotation for downstream display.
    pub fn discount(&self) -> Option<LineDiscount> {
        match (self.applied_discount, self.original_price) {
            (Some(rate), Some(original_price)) if !rate.is_zero() => Some(LineDiscount {
                original_price,
                rate,
            }),
            _ => None,
        }
    }

    /// `-12.5%`, or `None` when nothing is discounted.
    pub fn discount_badge(&self) -> Option<String> {
        self.discount().map(|d| format!("-{}", d.rate))
    }

    /// `effective_price × quantity`
    pub fn line_total(&self) -> Money {
        self.effective_price.multiply_quantity(self.quantity as i64)
    }
}

/// What the host shows next to a discounted line: the struck-through
/// original and the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiscount {
    pub original_price: Money,
    pub rate: DiscountRate,
}

// =============================================================================
// Cart Line Pricer
// =============================================================================

pub struct CartLinePricer;

impl CartLinePricer {
    /// Prices a line at `rate`, returning the updated line.
    ///
    /// ```rust
    /// use tierline_core::{CartLine, CartLinePricer, DiscountRate, Money};
    ///
    /// let line = CartLine::new("a", 1, 60, Money::from_cents(10000));
    /// let priced = CartLinePricer::apply(&line, DiscountRate::from_bps(4500));
    /// assert_eq!(priced.effective_price.cents(), 5500);
    /// assert_eq!(priced.discount_badge().as_deref(), Some("-45%"));
    /// ```
    pub fn apply(line: &CartLine, rate: DiscountRate) -> CartLine {
        let mut priced = line.clone();
        Self::apply_in_place(&mut priced, rate);
        priced
    }

    pub fn apply_in_place(line: &mut CartLine, rate: DiscountRate) {
        let base = line.base_price();
        line.original_price = Some(base);

        if rate.is_zero() {
            line.effective_price = base;
            line.applied_discount = None;
        } else {
            line.effective_price = base.apply_discount(rate);
            line.applied_discount = Some(rate);
        }
        line.current_price = line.effective_price;
    }
}

// =============================================================================
// Recalculation Guard
// =============================================================================

/// What the host told us about the request being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// The request is an administrative (back-office) page.
    pub admin: bool,
    /// An explicit asynchronous action is in flight.
    pub async_action: bool,
}

impl RequestContext {
    pub const fn storefront() -> Self {
        RequestContext {
            admin: false,
            async_action: false,
        }
    }

    pub const fn admin() -> Self {
        RequestContext {
            admin: true,
            async_action: false,
        }
    }

    pub const fn with_async_action(mut self) -> Self {
        self.async_action = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// A repeated pass in an admin request with no async action in flight.
    RepeatedAdminPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDecision {
    Recalculate { pass: u32 },
    Skip { pass: u32, reason: SkipReason },
}

impl PassDecision {
    pub fn pass(&self) -> u32 {
        match self {
            PassDecision::Recalculate { pass } | PassDecision::Skip { pass, .. } => *pass,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, PassDecision::Skip { .. })
    }
}

/// Request-scoped pass counter.
///
/// Create one per request. It is never shared across requests.
#[derive(Debug, Clone)]
pub struct RecalculationGuard {
    context: RequestContext,
    passes: u32,
}

impl RecalculationGuard {
    pub fn new(context: RequestContext) -> Self {
        RecalculationGuard { context, passes: 0 }
    }

    pub fn context(&self) -> RequestContext {
        self.context
    }

    /// Passes started so far in this request.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Counts a new pass and decides whether it should recompute.
    pub fn begin_pass(&mut self) -> PassDecision {
        self.passes = self.passes.saturating_add(1);
        let pass = self.passes;

        if pass > 1 && self.context.admin && !self.context.async_action {
            PassDecision::Skip {
                pass,
                reason: SkipReason::RepeatedAdminPass,
            }
        } else {
            PassDecision::Recalculate { pass }
        }
    }

    /// Starts over for a new request context.
    pub fn reset(&mut self, context: RequestContext) {
        self.context = context;
        self.passes = 0;
    }
}

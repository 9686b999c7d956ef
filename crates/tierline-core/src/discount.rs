//! # Discount Rules
//!
//! Tier lookup for quantity-based volume discounts.
//!
//! ## From Stored Slots to a Discount
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  host admin form                                                        │
//! │  slot 1..7 { min, max, percentage }  (raw strings, "12,5" allowed)     │
//! │        │                                                                │
//! │        ▼ parse_slots()          one normalisation step: trim, , → .     │
//! │  Vec<DiscountRule> + Vec<SlotRejection>                                 │
//! │        │                                                                │
//! │        ▼ RuleTable::from_slots() (empty → default seven bands)          │
//! │  RuleTable { owner, rules, source }                                     │
//! │        │                                                                │
//! │        ▼ DiscountEngine::resolve(quantity, subject, table)              │
//! │  DiscountRate (first matching rule, else 0%)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overlapping Ranges
//! Overlaps are tolerated. Rules are scanned in slot order and the FIRST
//! rule whose `min ≤ quantity ≤ max` holds wins.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PricingSubject, SubjectId};
use crate::{MAX_RULE_SLOTS, OPEN_ENDED_SLOT};

// =============================================================================
// Discount Rate
// =============================================================================

/// A discount percentage stored as basis points.
///
/// ## Basis Points
/// - 1 bps = 0.01%
/// - 1250 bps = 12.5%
/// - 10000 bps = 100%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Largest possible rate (100%).
    pub const MAX_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the rate as a percentage (12.5 for 1250 bps).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses a decimal percentage, accepting a decimal comma.
    ///
    /// ```rust
    /// use tierline_core::discount::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::parse("12,5").unwrap().bps(), 1250);
    /// assert_eq!(DiscountRate::parse(" 46.5 ").unwrap().bps(), 4650);
    /// assert!(DiscountRate::parse("").is_err());
    /// assert!(DiscountRate::parse("abc").is_err());
    /// ```
    ///
    /// Values are rounded to the nearest basis point and must lie in
    /// `[0, 100]`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = normalize_decimal(raw);
        if normalized.is_empty() {
            return Err(ValidationError::required("percentage"));
        }

        let value: f64 = normalized
            .parse()
            .map_err(|_| ValidationError::invalid_format("percentage", "not a number"))?;
        if !value.is_finite() {
            return Err(ValidationError::invalid_format("percentage", "not a number"));
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "percentage".to_string(),
                min: 0,
                max: 100,
            });
        }

        Ok(DiscountRate((value * 100.0).round() as u32))
    }
}

/// Renders `12.5%`, `3%`, `46.5%` (no trailing zeros).
impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

/// Trims whitespace and turns a decimal comma into a period.
pub fn normalize_decimal(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

// =============================================================================
// Discount Rule
// =============================================================================

/// One quantity band with its discount.
///
/// `max = None` is the unbounded sentinel (`[800–∞]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub min: u32,
    pub max: Option<u32>,
    pub rate: DiscountRate,
}

impl DiscountRule {
    pub const fn new(min: u32, max: Option<u32>, rate: DiscountRate) -> Self {
        DiscountRule { min, max, rate }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min && self.max.map_or(true, |max| quantity <= max)
    }
}

// =============================================================================
// Stored Slots
// =============================================================================

/// A raw rule slot exactly as the host admin form stores it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierSlot {
    /// Slot number, 1..=7.
    pub slot: u8,
    pub min: String,
    pub max: String,
    pub percentage: String,
}

impl TierSlot {
    pub fn new(
        slot: u8,
        min: impl Into<String>,
        max: impl Into<String>,
        percentage: impl Into<String>,
    ) -> Self {
        TierSlot {
            slot,
            min: min.into(),
            max: max.into(),
            percentage: percentage.into(),
        }
    }

    /// Slot 7 never has an upper bound.
    pub fn is_open_ended(&self) -> bool {
        self.slot == OPEN_ENDED_SLOT
    }
}

/// A slot that was excluded from the rule table, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRejection {
    pub slot: u8,
    pub reason: ValidationError,
}

/// Output of [`parse_slots`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSlots {
    /// Valid rules in slot order.
    pub rules: Vec<DiscountRule>,
    pub rejected: Vec<SlotRejection>,
}

/// Parses a single slot into a rule.
///
/// ## Rules
/// - `min` is an integer ≥ 1
/// - `percentage` is a decimal in (0, 100], decimal comma allowed
/// - slots 1-6 need an integer `max` ≥ `min`
/// - slot 7 ignores `max` and is unbounded
pub fn parse_slot(slot: &TierSlot) -> Result<DiscountRule, ValidationError> {
    if slot.slot == 0 || slot.slot as usize > MAX_RULE_SLOTS {
        return Err(ValidationError::OutOfRange {
            field: "slot".to_string(),
            min: 1,
            max: MAX_RULE_SLOTS as i64,
        });
    }

    let min = parse_bound("min", &slot.min)?;
    if min == 0 {
        return Err(ValidationError::must_be_positive("min"));
    }

    let rate = DiscountRate::parse(&slot.percentage)?;
    if rate.is_zero() {
        return Err(ValidationError::must_be_positive("percentage"));
    }

    let max = if slot.is_open_ended() {
        None
    } else {
        let max = parse_bound("max", &slot.max)?;
        if max < min {
            return Err(ValidationError::OutOfRange {
                field: "max".to_string(),
                min: min as i64,
                max: u32::MAX as i64,
            });
        }
        Some(max)
    };

    Ok(DiscountRule::new(min, max, rate))
}

fn parse_bound(field: &str, raw: &str) -> Result<u32, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| ValidationError::invalid_format(field, "not a whole number"))
}

/// Parses every stored slot, keeping valid rules in slot order.
///
/// ```rust
/// use tierline_core::discount::{parse_slots, TierSlot};
///
/// let parsed = parse_slots(&[
///     TierSlot::new(1, "5", "10", "3"),
///     TierSlot::new(2, "", "20", "6"),
/// ]);
/// assert_eq!(parsed.rules.len(), 1);
/// assert_eq!(parsed.rejected[0].slot, 2);
/// ```
pub fn parse_slots(slots: &[TierSlot]) -> ParsedSlots {
    let mut ordered: Vec<&TierSlot> = slots.iter().collect();
    ordered.sort_by_key(|s| s.slot);

    let mut parsed = ParsedSlots::default();
    for slot in ordered {
        match parse_slot(slot) {
            Ok(rule) => parsed.rules.push(rule),
            Err(reason) => parsed.rejected.push(SlotRejection {
                slot: slot.slot,
                reason,
            }),
        }
    }
    parsed
}

/// Canonicalises a slot before it is stored.
///
/// Trims every field, turns decimal commas into periods and clears the max
/// of the open-ended slot. Invalid values are kept as entered so the admin
/// form can show them back.
pub fn normalize_slot(slot: &TierSlot) -> TierSlot {
    TierSlot {
        slot: slot.slot,
        min: slot.min.trim().to_string(),
        max: if slot.is_open_ended() {
            String::new()
        } else {
            slot.max.trim().to_string()
        },
        percentage: normalize_decimal(&slot.percentage),
    }
}

// =============================================================================
// Rule Table
// =============================================================================

/// Where a table's rules came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Built from the owner's stored slots.
    Configured,
    /// The owner had no usable configuration.
    Default,
}

/// The default seven bands used when an owner has no configuration.
pub const DEFAULT_RULES: [DiscountRule; 7] = [
    DiscountRule::new(5, Some(10), DiscountRate::from_bps(300)),
    DiscountRule::new(11, Some(20), DiscountRate::from_bps(600)),
    DiscountRule::new(21, Some(59), DiscountRate::from_bps(1250)),
    DiscountRule::new(60, Some(119), DiscountRate::from_bps(4500)),
    DiscountRule::new(120, Some(239), DiscountRate::from_bps(4650)),
    DiscountRule::new(240, Some(799), DiscountRate::from_bps(4800)),
    DiscountRule::new(800, None, DiscountRate::from_bps(5000)),
];

/// Immutable ordered rules owned by one pricing subject.
///
/// Rebuilt wholesale whenever the owner's configuration changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    owner: SubjectId,
    rules: Vec<DiscountRule>,
    source: RuleSource,
}

impl RuleTable {
    pub fn configured(owner: SubjectId, rules: Vec<DiscountRule>) -> Self {
        RuleTable {
            owner,
            rules,
            source: RuleSource::Configured,
        }
    }

    pub fn default_for(owner: SubjectId) -> Self {
        RuleTable {
            owner,
            rules: DEFAULT_RULES.to_vec(),
            source: RuleSource::Default,
        }
    }

    /// Builds a table from stored slots.
    ///
    /// Falls back to the default bands when no slot survives parsing.
    /// Rejected slots are returned so the caller can log them.
    pub fn from_slots(owner: SubjectId, slots: &[TierSlot]) -> (Self, Vec<SlotRejection>) {
        let parsed = parse_slots(slots);
        let table = if parsed.rules.is_empty() {
            RuleTable::default_for(owner)
        } else {
            RuleTable::configured(owner, parsed.rules)
        };
        (table, parsed.rejected)
    }

    pub fn owner(&self) -> SubjectId {
        self.owner
    }

    pub fn rules(&self) -> &[DiscountRule] {
        &self.rules
    }

    pub fn source(&self) -> RuleSource {
        self.source
    }

    pub fn is_default(&self) -> bool {
        self.source == RuleSource::Default
    }

    /// First rule containing `quantity` wins. No match is 0%.
    pub fn resolve(&self, quantity: u32) -> DiscountRate {
        self.rules
            .iter()
            .find(|rule| rule.contains(quantity))
            .map(|rule| rule.rate)
            .unwrap_or_default()
    }
}

// =============================================================================
// Discount Engine
// =============================================================================

/// Resolves a quantity for a pricing subject.
///
/// The table must be the one owned by [`PricingSubject::owner`]. A table
/// loaded for a variant's own id yields no discount rather than a rate the
/// variant was never meant to carry.
pub struct DiscountEngine;

impl DiscountEngine {
    pub fn resolve(quantity: u32, subject: &PricingSubject, table: &RuleTable) -> DiscountRate {
        if table.owner() != subject.owner() {
            return DiscountRate::zero();
        }
        table.resolve(quantity)
    }
}

// =============================================================================
// Discount Quote
// =============================================================================

/// A price preview for a quantity, as the product page shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountQuote {
    pub rate: DiscountRate,
    pub quantity: u32,
    pub original_unit: Money,
    pub discounted_unit: Money,
    /// `(original_unit - discounted_unit) × quantity`
    pub savings_total: Money,
    pub has_discount: bool,
}

impl DiscountQuote {
    pub fn compute(unit_price: Money, rate: DiscountRate, quantity: u32) -> Self {
        let discounted_unit = unit_price.apply_discount(rate);
        let savings_total = (unit_price - discounted_unit).multiply_quantity(quantity as i64);
        DiscountQuote {
            rate,
            quantity,
            original_unit: unit_price,
            discounted_unit,
            savings_total,
            has_discount: !rate.is_zero(),
        }
    }
}

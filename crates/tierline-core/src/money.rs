//! # Money Module
//!
//! Provides the `Money` type used for every price a cart line carries.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VOLUME DISCOUNTS ON FLOATS                                             │
//! │                                                                         │
//! │  1999.99 × (1 - 0.125) = 1749.99125  → what does the cart show?        │
//! │  Re-applying the same pass on a float result drifts every time.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + basis-point rates                  │
//! │    199999 cents × 1250 bps → discount 25000 cents (rounded once)       │
//! │    The discounted price is always base - discount, never compounded    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tierline_core::money::Money;
//! use tierline_core::discount::DiscountRate;
//!
//! let unit = Money::from_cents(10000);           // 100.00
//! let rate = DiscountRate::from_bps(4500);       // 45%
//! assert_eq!(unit.apply_discount(rate).cents(), 5500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use crate::discount::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (kopecks, cents).
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  ProductInfo.regular_price ──► CartLine.original_price                  │
/// │                                      │                                  │
/// │                                      ▼ apply_discount(rate)             │
/// │                               CartLine.effective_price ──► host cart    │
/// │                                                                         │
/// │  DiscountQuote.original_unit / discounted_unit / savings_total          │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use tierline_core::money::Money;
    ///
    /// let price = Money::from_cents(123456); // 1 234.56
    /// assert_eq!(price.cents(), 123456);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the amount a discount rate takes off this price.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, i.e. half-up rounding
    /// to the nearest minor unit. i128 prevents overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use tierline_core::money::Money;
    /// use tierline_core::discount::DiscountRate;
    ///
    /// let price = Money::from_cents(999);            // 9.99
    /// let rate = DiscountRate::from_bps(1250);      // 12.5%
    /// // 9.99 × 12.5% = 1.24875 → 1.25
    /// assert_eq!(price.discount_amount(rate).cents(), 125);
    /// ```
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        let off = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(off as i64)
    }

    /// Applies a discount rate and returns the discounted price.
    ///
    /// ```text
    /// base 100.00
    ///      │
    ///      ▼
    /// apply_discount(45%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// effective 55.00
    /// ```
    ///
    /// A zero rate returns the price unchanged.
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        Money(self.0 - self.discount_amount(rate).0)
    }

    /// Line total for `qty` units, clamped to the i64 range.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `1234.56` rendering for logs.
///
/// Storefront-facing output goes through [`crate::format::PriceFormat`].
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(123456);
        assert_eq!(money.cents(), 123456);
        assert_eq!(money.major(), 1234);
        assert_eq!(money.minor_part(), 56);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_apply_discount_forty_five_percent() {
        let base = Money::from_cents(10000);
        let discounted = base.apply_discount(DiscountRate::from_bps(4500));
        assert_eq!(discounted.cents(), 5500);
    }

    #[test]
    fn test_apply_discount_rounds_half_up() {
        // 9.99 × 12.5% = 1.24875 → 1.25 off
        let base = Money::from_cents(999);
        assert_eq!(base.apply_discount(DiscountRate::from_bps(1250)).cents(), 874);
    }

    #[test]
    fn test_apply_zero_discount_is_identity() {
        let base = Money::from_cents(4321);
        assert_eq!(base.apply_discount(DiscountRate::zero()), base);
        assert!(base.discount_amount(DiscountRate::zero()).is_zero());
    }

    #[test]
    fn test_full_discount_is_free() {
        let base = Money::from_cents(4321);
        assert!(base.apply_discount(DiscountRate::from_bps(10000)).is_zero());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!(b.multiply_quantity(3).cents(), 750);
        assert_eq!(b.multiply_quantity(i64::MAX / 100).cents(), i64::MAX);

        let mut total = Money::zero();
        total += a;
        assert_eq!(total, a);
    }
}

//! # Price Formatting
//!
//! One storefront price formatter, parameterised by configuration.
//!
//! ```rust
//! use tierline_core::{Money, PriceFormat};
//!
//! let format = PriceFormat::default();
//! assert_eq!(format.format(Money::from_cents(123400)), "1 234 руб.");
//! assert_eq!(format.format(Money::from_cents(123456)), "1 234.56 руб.");
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFormat {
    /// Inserted between groups of three major-unit digits.
    pub thousands_separator: String,
    /// Appended after the amount, including any leading space.
    pub currency_suffix: String,
    /// Render `1234.00` as `1234`.
    pub trim_zero_fraction: bool,
}

impl Default for PriceFormat {
    fn default() -> Self {
        PriceFormat {
            thousands_separator: " ".to_string(),
            currency_suffix: " руб.".to_string(),
            trim_zero_fraction: true,
        }
    }
}

impl PriceFormat {
    pub fn format(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let major = group_digits(amount.major().unsigned_abs(), &self.thousands_separator);
        let minor = amount.minor_part();

        if minor == 0 && self.trim_zero_fraction {
            format!("{sign}{major}{}", self.currency_suffix)
        } else {
            format!("{sign}{major}.{minor:02}{}", self.currency_suffix)
        }
    }
}

fn group_digits(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format() {
        let format = PriceFormat::default();
        assert_eq!(format.format(Money::from_cents(0)), "0 руб.");
        assert_eq!(format.format(Money::from_cents(99900)), "999 руб.");
        assert_eq!(format.format(Money::from_cents(100000)), "1 000 руб.");
        assert_eq!(format.format(Money::from_cents(123456789)), "1 234 567.89 руб.");
        assert_eq!(format.format(Money::from_cents(-55050)), "-550.50 руб.");
    }

    #[test]
    fn test_keep_zero_fraction() {
        let format = PriceFormat {
            thousands_separator: ",".to_string(),
            currency_suffix: String::new(),
            trim_zero_fraction: false,
        };
        assert_eq!(format.format(Money::from_cents(123400)), "1,234.00");
    }
}

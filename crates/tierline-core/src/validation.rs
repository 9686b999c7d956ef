//! # Validation Module
//!
//! Request validation for the two exposed operations.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  host request (price preview, filter click)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE: quantity / taxonomy / slug / page size checks            │
//! │           │    rejected → ServiceError::InvalidInput                   │
//! │           ▼                                                             │
//! │  discount::parse_slots: stored rule slots (excluded, never rejected)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tierline_core::validation::{validate_quantity, validate_taxonomy};
//!
//! assert_eq!(validate_quantity(60).unwrap(), 60);
//! assert!(validate_quantity(0).is_err());
//! assert_eq!(validate_taxonomy(" categories ").unwrap(), "categories");
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest taxonomy name the host accepts.
pub const MAX_TAXONOMY_LEN: usize = 32;

/// Longest content type name the host accepts.
pub const MAX_CONTENT_TYPE_LEN: usize = 20;

/// Longest term slug the host accepts.
pub const MAX_SLUG_LEN: usize = 200;

/// Largest listing page a single request may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart or preview quantity.
///
/// ## Rules
/// - Must be positive
/// - Must fit the rule bounds (u32)
pub fn validate_quantity(quantity: i64) -> ValidationResult<u32> {
    if quantity <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }
    u32::try_from(quantity).map_err(|_| ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: u32::MAX as i64,
    })
}

/// Parses a quantity sent as text by a storefront form.
pub fn parse_quantity(raw: &str) -> ValidationResult<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("quantity"));
    }
    let quantity: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::invalid_format("quantity", "not a whole number"))?;
    validate_quantity(quantity)
}

/// Validates a listing page size.
pub fn validate_page_size(page_size: u32) -> ValidationResult<u32> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }
    Ok(page_size)
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a taxonomy name.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Lowercase letters, digits, `_` and `-` only
///
/// ## Returns
/// The trimmed name.
pub fn validate_taxonomy(taxonomy: &str) -> ValidationResult<String> {
    validate_key("taxonomy", taxonomy, MAX_TAXONOMY_LEN)
}

/// Validates a content type name. Same character rules as taxonomies.
pub fn validate_content_type(content_type: &str) -> ValidationResult<String> {
    validate_key("content_type", content_type, MAX_CONTENT_TYPE_LEN)
}

/// Validates a term slug.
///
/// Slugs may carry percent-encoded non-ASCII names, so only length and
/// whitespace are checked.
pub fn validate_term_slug(slug: &str) -> ValidationResult<String> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ValidationError::required("term"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::TooLong {
            field: "term".to_string(),
            max: MAX_SLUG_LEN,
        });
    }
    if slug.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format("term", "must not contain spaces"));
    }
    Ok(slug.to_string())
}

fn validate_key(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(ValidationError::invalid_format(
            field,
            "must contain only lowercase letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(1).unwrap(), 1);
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(i64::MAX),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 60 ").unwrap(), 60);
        assert!(matches!(
            parse_quantity(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_quantity("2.5"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(parse_quantity("-1").is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert_eq!(validate_page_size(10).unwrap(), 10);
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_validate_taxonomy() {
        assert_eq!(validate_taxonomy("product_cat").unwrap(), "product_cat");
        assert!(validate_taxonomy("").is_err());
        assert!(validate_taxonomy("Categories").is_err());
        assert!(validate_taxonomy("a".repeat(33).as_str()).is_err());
        assert!(validate_content_type("blog").is_ok());
    }

    #[test]
    fn test_validate_term_slug() {
        assert_eq!(validate_term_slug(" news ").unwrap(), "news");
        assert!(validate_term_slug("%d0%bd%d0%be").is_ok());
        assert!(validate_term_slug("two words").is_err());
        assert!(validate_term_slug("  ").is_err());
    }
}

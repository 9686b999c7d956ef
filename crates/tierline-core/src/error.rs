//! # Error Types
//!
//! ```text
//! quantity "abc"      ──► ValidationError::InvalidFormat ──► request refused
//! slot "0" .. "-5"    ──► ValidationError                ──► slot excluded
//! cache row garbled   ──► CoreError::Payload             ──► treated as a miss
//! ```
//!
//! `ValidationError` surfaces to the host through `ServiceError::InvalidInput`.
//!
//! Overlapping tier ranges are deliberately NOT an error. They are resolved
//! by first-match-wins in [`crate::discount::RuleTable::resolve`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    /// Written by an incompatible build, or truncated by the backend.
    #[error("Cached payload is unreadable: {0}")]
    Payload(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Payload(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Why a request or a rule slot was refused.
///
/// `field` names the offending input as the host submitted it
/// (`quantity`, `min`, `percentage`, `term`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Not parseable as a number.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Slugs and taxonomy names are capped.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::invalid_format("quantity", "not a whole number");
        assert_eq!(err.to_string(), "quantity has invalid format: not a whole number");

        let err = ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "percentage must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::must_be_positive("quantity").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_json_error_becomes_payload_error() {
        let err = serde_json::from_slice::<u32>(b"not json").unwrap_err();
        let core_err: CoreError = err.into();
        assert!(matches!(core_err, CoreError::Payload(_)));
    }
}

//! # Service Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Service Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Request      │  │  Collaborators  │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidInput   │  │  Unavailable    │  │  InvalidConfig          │ │
//! │  │  NotFound       │  │  Storage        │  │  ConfigLoadFailed       │ │
//! │  │                 │  │                 │  │  ConfigSaveFailed / Io  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cache trouble never shows up here. A failing cache or version store is
//! logged and the request is served uncached.

use thiserror::Error;

use tierline_core::ValidationError;
use tierline_db::DbError;

use crate::host::HostError;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    /// The caller sent something unusable (non-positive quantity, bad slug).
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// A host repository could not be reached.
    ///
    /// Kept apart from the other kinds so a caller can show a "results
    /// unavailable" state instead of failing the page.
    #[error("Host unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<HostError> for ServiceError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotFound { entity, id } => ServiceError::NotFound {
                entity: entity.to_string(),
                id,
            },
            HostError::Unavailable(message) => ServiceError::Unavailable(message),
        }
    }
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ServiceError {
    fn from(err: toml::ser::Error) -> Self {
        ServiceError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ServiceError {
    /// True when a collaborator or the database could not be reached.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ServiceError::Unavailable(_) => true,
            ServiceError::Storage(db) => db.is_unavailable(),
            _ => false,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidConfig(_)
                | ServiceError::ConfigLoadFailed(_)
                | ServiceError::ConfigSaveFailed(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_errors_keep_their_kind() {
        let err: ServiceError = HostError::product_not_found(7).into();
        assert!(err.is_not_found());
        assert!(err.to_string().contains('7'));

        let err: ServiceError = HostError::Unavailable("timeout".into()).into();
        assert!(err.is_unavailable());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_config_errors() {
        assert!(ServiceError::InvalidConfig("page_size".into()).is_config_error());
        assert!(!ServiceError::Unavailable("down".into()).is_config_error());
        assert!(!ServiceError::InvalidInput(ValidationError::must_be_positive("quantity"))
            .is_config_error());
    }
}

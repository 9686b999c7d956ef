//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / MigrateError         slot or id checks before a write   │
//! │       │                                   │                             │
//! │       └───────────────┬───────────────────┘                             │
//! │                       ▼                                                 │
//! │  DbError (this module)                                                 │
//! │       │                                                                 │
//! │       ├── discount tiers ──► ServiceError::Storage                     │
//! │       └── cache / stamps ──► logged, request served uncached           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use tierline_core::SubjectId;

#[derive(Debug, Error)]
pub enum DbError {
    // =========================================================================
    // Data Errors
    // =========================================================================
    /// A row the query relies on was not there.
    #[error("Missing row in {table}")]
    MissingRow { table: &'static str },

    /// Write refused before reaching SQLite: slots are numbered 1..=7.
    #[error("Product {subject_id}: slot {slot} outside 1..={max}")]
    InvalidSlot {
        subject_id: SubjectId,
        slot: u8,
        max: usize,
    },

    /// Host id above the SQLite integer range.
    #[error("Subject id {0} does not fit a SQLite integer")]
    SubjectOutOfRange(SubjectId),

    /// SQLite rejected a row through a CHECK constraint.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// The database file could not be opened, or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// True for errors that mean the backend itself is unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_) | DbError::PoolExhausted | DbError::Internal(_)
        )
    }
}

/// ## Mapping
/// ```text
/// RowNotFound                 → MissingRow
/// Database, CHECK failed      → ConstraintViolation
/// Database, anything else     → QueryFailed
/// PoolTimedOut                → PoolExhausted
/// PoolClosed                  → ConnectionFailed
/// Other                       → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::MissingRow { table: "unknown" },
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("CHECK constraint failed") {
                    DbError::ConstraintViolation(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

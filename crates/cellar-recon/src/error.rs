//! # Reconciliation Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Recon Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │     Store       │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  blank store_id │  │  Constraint     │  │  LoadFailed             │ │
//! │  │  empty items    │  │  Unavailable    │  │  SaveFailed             │ │
//! │  │  NaN quantity   │  │  Failed         │  │  Invalid                │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │        raised               raised                 raised              │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────────────────────────────┐  │
//! │  │    Notifier     │  │  Catalog sync step failures                 │  │
//! │  │  logged only    │  │  recorded in CatalogSyncSummary::steps      │  │
//! │  └─────────────────┘  └─────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use cellar_core::ValidationError;
use cellar_db::DbError;

/// Result type alias for engine operations.
pub type ReconResult<T> = Result<T, ReconError>;

/// Result type alias for port calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the engine's public operations.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Input rejected before any I/O.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A store call failed; the operation was aborted.
    #[error("Persistence failed: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ReconError {
    /// True when retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconError::Store(err) if err.is_retryable())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReconError::Validation(_))
    }
}

impl From<DbError> for ReconError {
    fn from(err: DbError) -> Self {
        ReconError::Store(err.into())
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Failure reported by a store port, independent of the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness or reference constraint rejected the write.
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// The backend could not be reached (closed pool, timeout).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Anything else.
    #[error("Store operation failed: {0}")]
    Failed(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                StoreError::Constraint(err.to_string())
            }
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Failed(other.to_string()),
        }
    }
}

// =============================================================================
// Notifier Errors
// =============================================================================

/// A notification could not be handed off.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Notification failed: {0}")]
pub struct NotifierError(pub String);

// =============================================================================
// Configuration Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: StoreError = DbError::duplicate("products.product_code", "GIN").into();
        assert!(matches!(err, StoreError::Constraint(_)));

        let err: StoreError = DbError::PoolExhausted.into();
        assert!(err.is_retryable());

        let err: StoreError = DbError::QueryFailed("syntax".into()).into();
        assert_eq!(err, StoreError::Failed("Query failed: syntax".into()));
    }

    #[test]
    fn test_recon_error_categories() {
        let err: ReconError = ValidationError::required("store_id").into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());

        let err: ReconError = DbError::ConnectionFailed("closed".into()).into();
        assert!(err.is_retryable());
    }
}

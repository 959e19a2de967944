//! # Error Types
//!
//! Domain-specific error types for cellar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cellar-core errors (this file)                                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cellar-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  cellar-recon errors (separate crate)                                  │
//! │  └── ReconError       - What callers of the engine see                 │
//! │                                                                         │
//! │  Flow: ValidationError → ReconError → caller                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any store is touched, so a validation failure never leaves
/// partial work behind.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// A required collection is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must not be below zero.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Quantity or percentage is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("store_id");
        assert_eq!(err.to_string(), "store_id is required");

        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items must not be empty");

        let err = ValidationError::OutOfRange {
            field: "tolerance".to_string(),
            min: 0.0,
            max: 100.0,
        };
        assert_eq!(err.to_string(), "tolerance must be between 0 and 100");
    }
}

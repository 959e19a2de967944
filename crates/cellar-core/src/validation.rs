//! # Validation Module
//!
//! Input validation for the reconciliation entry points.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / upload handler)                                 │
//! │  └── Shape checks, deserialization                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Store and product identifiers                                     │
//! │  ├── Finite quantities                                                 │
//! │  └── Non-empty batches                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE (store_id, product_code)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check here runs before any store is touched.

use crate::error::ValidationError;
use crate::types::{IncomingItem, ManualCountEntry};
use crate::{MAX_PRODUCT_CODE_LEN, MAX_PRODUCT_NAME_LEN, MAX_TOLERANCE_PERCENT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifiers
// =============================================================================

/// Validates a store identifier (must not be blank).
pub fn validate_store_id(store_id: &str) -> ValidationResult<()> {
    if store_id.trim().is_empty() {
        return Err(ValidationError::required("store_id"));
    }

    Ok(())
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be blank
/// - At most 64 characters
/// - No control characters
///
/// ## Example
/// ```rust
/// use cellar_core::validation::validate_product_code;
///
/// assert!(validate_product_code("JAM-700").is_ok());
/// assert!(validate_product_code("  ").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("product_code"));
    }

    if code.chars().count() > MAX_PRODUCT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "product_code".to_string(),
            max: MAX_PRODUCT_CODE_LEN,
        });
    }

    if code.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "product_code".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional display name, if one was given.
pub fn validate_product_name(name: Option<&str>) -> ValidationResult<()> {
    match name {
        Some(name) if name.chars().count() > MAX_PRODUCT_NAME_LEN => {
            Err(ValidationError::TooLong {
                field: "product_name".to_string(),
                max: MAX_PRODUCT_NAME_LEN,
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// Validates that a quantity is a real number.
///
/// POS feeds may legitimately report negative quantities (returns), so only
/// NaN and infinities are rejected here.
pub fn validate_quantity(field: &str, quantity: f64) -> ValidationResult<()> {
    if !quantity.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a counted quantity: finite and not negative.
pub fn validate_count_quantity(quantity: f64) -> ValidationResult<()> {
    validate_quantity("count_quantity", quantity)?;

    if quantity < 0.0 {
        return Err(ValidationError::Negative {
            field: "count_quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a tolerance percentage (0 to 100 inclusive).
///
/// ## Example
/// ```rust
/// use cellar_core::validation::validate_tolerance_percent;
///
/// assert!(validate_tolerance_percent(5.0).is_ok());
/// assert!(validate_tolerance_percent(150.0).is_err());
/// ```
pub fn validate_tolerance_percent(percent: f64) -> ValidationResult<()> {
    if !percent.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "diff_tolerance_percent".to_string(),
        });
    }

    if !(0.0..=MAX_TOLERANCE_PERCENT).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "diff_tolerance_percent".to_string(),
            min: 0.0,
            max: MAX_TOLERANCE_PERCENT,
        });
    }

    Ok(())
}

// =============================================================================
// Collections
// =============================================================================

/// Validates an ingested POS item list.
///
/// ## Rules
/// - At least one item
/// - Every item has a valid product code and a finite quantity
pub fn validate_ingest_items(items: &[IncomingItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    for item in items {
        validate_product_code(&item.product_code)?;
        validate_product_name(item.product_name.as_deref())?;
        validate_quantity("quantity", item.quantity)?;
    }

    Ok(())
}

/// Validates a submitted manual count sheet.
pub fn validate_count_entries(entries: &[ManualCountEntry]) -> ValidationResult<()> {
    if entries.is_empty() {
        return Err(ValidationError::Empty {
            field: "counts".to_string(),
        });
    }

    for entry in entries {
        validate_product_code(&entry.product_code)?;
        validate_count_quantity(entry.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_store_id() {
        assert!(validate_store_id("store-1").is_ok());
        assert_eq!(
            validate_store_id("   "),
            Err(ValidationError::required("store_id"))
        );
    }

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("JAM-700").is_ok());
        assert!(validate_product_code("8801234567890").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("bad\tcode").is_err());
        assert!(validate_product_code(&"X".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantities() {
        assert!(validate_quantity("quantity", -2.0).is_ok());
        assert!(validate_quantity("quantity", f64::INFINITY).is_err());

        assert!(validate_count_quantity(0.0).is_ok());
        assert!(validate_count_quantity(12.5).is_ok());
        assert!(validate_count_quantity(-1.0).is_err());
        assert!(validate_count_quantity(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_tolerance_percent() {
        assert!(validate_tolerance_percent(0.0).is_ok());
        assert!(validate_tolerance_percent(5.0).is_ok());
        assert!(validate_tolerance_percent(100.0).is_ok());
        assert!(validate_tolerance_percent(-0.5).is_err());
        assert!(validate_tolerance_percent(100.5).is_err());
    }

    #[test]
    fn test_validate_ingest_items() {
        assert!(matches!(
            validate_ingest_items(&[]),
            Err(ValidationError::Empty { .. })
        ));

        let good = vec![IncomingItem::bare("A", 1.0), IncomingItem::bare("B", 0.0)];
        assert!(validate_ingest_items(&good).is_ok());

        let blank_code = vec![IncomingItem::bare(" ", 1.0)];
        assert!(validate_ingest_items(&blank_code).is_err());

        let nan = vec![IncomingItem::bare("A", f64::NAN)];
        assert!(validate_ingest_items(&nan).is_err());
    }

    #[test]
    fn test_validate_count_entries() {
        assert!(validate_count_entries(&[]).is_err());

        let entries = vec![ManualCountEntry {
            product_code: "A".to_string(),
            quantity: 3.0,
        }];
        assert!(validate_count_entries(&entries).is_ok());
    }
}

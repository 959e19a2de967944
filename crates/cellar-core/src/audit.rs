//! # Audit Payloads
//!
//! Builders for the audit entries the engine emits. All of them are
//! system-initiated, so none carries a `changed_by`.

use chrono::NaiveDate;
use serde_json::json;

use crate::reconcile::{ComparisonSummary, Tolerance};
use crate::types::{AuditAction, AuditEntry, Product};

/// Table name recorded for catalog mutations.
pub const PRODUCTS_TABLE: &str = "products";

/// Table name recorded for reconciliation runs.
pub const COMPARISONS_TABLE: &str = "stock_comparisons";

/// A product created from the POS feed.
pub fn product_added(product: &Product) -> AuditEntry {
    AuditEntry {
        store_id: product.store_id.clone(),
        action: AuditAction::AutoAddProduct,
        table_name: PRODUCTS_TABLE,
        record_id: Some(product.id.clone()),
        old_value: None,
        new_value: json!({
            "product_code": product.product_code,
            "product_name": product.product_name,
            "unit": product.unit,
            "category": product.category,
            "active": product.active,
        }),
    }
}

/// An existing product whose `active` flag flipped.
pub fn activation_changed(product: &Product, active: bool) -> AuditEntry {
    let action = if active {
        AuditAction::AutoReactivate
    } else {
        AuditAction::AutoDeactivate
    };

    AuditEntry {
        store_id: product.store_id.clone(),
        action,
        table_name: PRODUCTS_TABLE,
        record_id: Some(product.id.clone()),
        old_value: Some(json!({
            "product_code": product.product_code,
            "active": product.active,
        })),
        new_value: json!({
            "product_code": product.product_code,
            "active": active,
        }),
    }
}

/// One reconciliation run.
pub fn comparison_run(
    store_id: &str,
    comp_date: NaiveDate,
    tolerance: Tolerance,
    summary: &ComparisonSummary,
) -> AuditEntry {
    AuditEntry {
        store_id: store_id.to_string(),
        action: AuditAction::AutoCompare,
        table_name: COMPARISONS_TABLE,
        record_id: None,
        old_value: None,
        new_value: json!({
            "comp_date": comp_date.to_string(),
            "tolerance_percent": tolerance.percent(),
            "total": summary.total,
            "match": summary.exact_match,
            "within_tolerance": summary.within_tolerance,
            "over_tolerance": summary.over_tolerance,
            "manual_only": summary.manual_only,
            "pos_only": summary.pos_only,
        }),
    }
}

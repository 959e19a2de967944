//! # Catalog Sync Planning
//!
//! Decides, without touching any store, what a POS upload does to the
//! catalog.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Per-item classification                              │
//! │                                                                         │
//! │  item.code in catalog? ── yes ──► MATCHED                              │
//! │        │                           ├─ qty > 0 and product inactive     │
//! │        no                          │     → reactivate                  │
//! │        │                           └─ qty == 0 and product active      │
//! │        ▼                                 → deactivate                  │
//! │  name, unit, category all present?                                     │
//! │        ├── yes ──► NEW  → add (active = qty > 0)                       │
//! │        └── no  ──► dropped from catalog consideration                  │
//! │                                                                         │
//! │  qty == 0 ──► also flagged ZERO-QTY (independent of the above)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutation decisions are made once per product code (last occurrence wins),
//! so the add, deactivate, and reactivate sets never overlap.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::types::{IncomingItem, NewProduct, Product};

// =============================================================================
// Normalization
// =============================================================================

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trims codes and text fields; blank optional fields become `None`.
pub fn normalize_item(item: &IncomingItem) -> IncomingItem {
    IncomingItem {
        product_code: item.product_code.trim().to_string(),
        product_name: non_blank(item.product_name.as_deref()),
        quantity: item.quantity,
        unit: non_blank(item.unit.as_deref()),
        category: non_blank(item.category.as_deref()),
    }
}

/// Items that get persisted into the ingest batch.
pub fn stored_items(items: &[IncomingItem], include_zero_qty: bool) -> Vec<&IncomingItem> {
    items
        .iter()
        .filter(|item| item.quantity > 0.0 || include_zero_qty)
        .collect()
}

// =============================================================================
// Plan
// =============================================================================

/// What a catalog sync is going to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPlan {
    /// Items whose code already exists in the catalog.
    pub matched: usize,
    /// Items reporting exactly zero.
    pub zero_qty: usize,
    /// Unknown items lacking a name, unit, or category.
    pub dropped: usize,
    /// Products to create.
    pub additions: Vec<NewProduct>,
    /// Existing active products reporting zero.
    pub deactivations: Vec<String>,
    /// Existing inactive products reporting a positive quantity.
    pub reactivations: Vec<String>,
}

/// Builds the plan. `catalog` is keyed by product code; `items` must already
/// be normalized.
pub fn plan_catalog_sync(
    catalog: &HashMap<String, Product>,
    items: &[IncomingItem],
) -> CatalogPlan {
    let mut plan = CatalogPlan::default();

    for item in items {
        if catalog.contains_key(&item.product_code) {
            plan.matched += 1;
        } else if new_product(item).is_none() {
            plan.dropped += 1;
        }

        if item.quantity == 0.0 {
            plan.zero_qty += 1;
        }
    }

    let latest: BTreeMap<&str, &IncomingItem> = items
        .iter()
        .map(|item| (item.product_code.as_str(), item))
        .collect();

    for (code, item) in latest {
        match catalog.get(code) {
            Some(existing) if item.quantity == 0.0 && existing.active => {
                plan.deactivations.push(code.to_string());
            }
            Some(existing) if item.quantity > 0.0 && !existing.active => {
                plan.reactivations.push(code.to_string());
            }
            Some(_) => {}
            None => {
                if let Some(product) = new_product(item) {
                    plan.additions.push(product);
                }
            }
        }
    }

    plan
}

fn new_product(item: &IncomingItem) -> Option<NewProduct> {
    Some(NewProduct {
        product_code: item.product_code.clone(),
        product_name: item.product_name.clone()?,
        unit: item.unit.clone()?,
        category: item.category.clone()?,
        active: item.quantity > 0.0,
    })
}

// =============================================================================
// Summary
// =============================================================================

/// The best-effort catalog mutation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    AutoAdd,
    AutoDeactivate,
    AutoReactivate,
}

/// How one step went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SyncStepOutcome {
    pub step: SyncStep,
    /// Rows the plan asked for.
    pub attempted: usize,
    /// Rows the store reports as changed.
    pub applied: usize,
    /// Set when the step failed.
    pub error: Option<String>,
}

impl SyncStepOutcome {
    pub fn succeeded(step: SyncStep, attempted: usize, applied: usize) -> Self {
        SyncStepOutcome {
            step,
            attempted,
            applied,
            error: None,
        }
    }

    pub fn failed(step: SyncStep, attempted: usize, error: impl ToString) -> Self {
        SyncStepOutcome {
            step,
            attempted,
            applied: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of `sync_catalog_from_ingest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogSyncSummary {
    pub total_items: usize,
    pub matched: usize,
    pub new_added: usize,
    pub zero_qty: usize,
    pub deactivated: usize,
    pub reactivated: usize,
    pub ingest_batch_id: String,
    pub steps: Vec<SyncStepOutcome>,
}

impl CatalogSyncSummary {
    /// True when any best-effort step failed.
    pub fn has_partial_failure(&self) -> bool {
        self.steps.iter().any(SyncStepOutcome::is_failed)
    }

    /// Outcome of one step, if it was recorded.
    pub fn step(&self, step: SyncStep) -> Option<&SyncStepOutcome> {
        self.steps.iter().find(|s| s.step == step)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CountStatus;
    use chrono::Utc;

    fn product(code: &str, active: bool) -> Product {
        let now = Utc::now();
        Product {
            id: format!("id-{code}"),
            store_id: "store-1".to_string(),
            product_code: code.to_string(),
            product_name: format!("Product {code}"),
            unit: Some("bottle".to_string()),
            category: Some("spirits".to_string()),
            active,
            count_status: CountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products
            .into_iter()
            .map(|p| (p.product_code.clone(), p))
            .collect()
    }

    #[test]
    fn test_normalize_item() {
        let raw = IncomingItem {
            product_code: "  GIN-1 ".to_string(),
            product_name: Some(" Gin ".to_string()),
            quantity: 2.0,
            unit: Some("   ".to_string()),
            category: None,
        };
        let item = normalize_item(&raw);
        assert_eq!(item.product_code, "GIN-1");
        assert_eq!(item.product_name.as_deref(), Some("Gin"));
        assert_eq!(item.unit, None);
    }

    #[test]
    fn test_plan_scenario() {
        let catalog = catalog(vec![product("P1", true), product("P2", false)]);
        let items = vec![
            IncomingItem::bare("P1", 0.0),
            IncomingItem::bare("P2", 3.0),
            IncomingItem::new("P3", "Rum", 2.0, "bottle", "rum"),
        ];

        let plan = plan_catalog_sync(&catalog, &items);

        assert_eq!(plan.matched, 2);
        assert_eq!(plan.zero_qty, 1);
        assert_eq!(plan.deactivations, vec!["P1".to_string()]);
        assert_eq!(plan.reactivations, vec!["P2".to_string()]);
        assert_eq!(plan.additions.len(), 1);
        assert_eq!(plan.additions[0].product_code, "P3");
        assert!(plan.additions[0].active);
    }

    #[test]
    fn test_incomplete_new_item_is_dropped() {
        let items = vec![IncomingItem {
            product_code: "P9".to_string(),
            product_name: Some("Vermouth".to_string()),
            quantity: 1.0,
            unit: None,
            category: Some("wine".to_string()),
        }];

        let plan = plan_catalog_sync(&HashMap::new(), &items);
        assert!(plan.additions.is_empty());
        assert_eq!(plan.dropped, 1);
    }

    #[test]
    fn test_new_zero_item_is_added_inactive() {
        let items = vec![IncomingItem::new("P4", "Cider", 0.0, "can", "cider")];
        let plan = plan_catalog_sync(&HashMap::new(), &items);

        assert_eq!(plan.zero_qty, 1);
        assert_eq!(plan.additions.len(), 1);
        assert!(!plan.additions[0].active);
        assert!(plan.deactivations.is_empty());
    }

    #[test]
    fn test_no_op_for_consistent_catalog() {
        let catalog = catalog(vec![product("P1", true), product("P2", false)]);
        let items = vec![IncomingItem::bare("P1", 4.0), IncomingItem::bare("P2", 0.0)];

        let plan = plan_catalog_sync(&catalog, &items);
        assert!(plan.deactivations.is_empty());
        assert!(plan.reactivations.is_empty());
        assert!(plan.additions.is_empty());
    }

    #[test]
    fn test_duplicate_code_decided_once() {
        let catalog = catalog(vec![product("P1", true)]);
        let items = vec![IncomingItem::bare("P1", 0.0), IncomingItem::bare("P1", 5.0)];

        let plan = plan_catalog_sync(&catalog, &items);
        assert_eq!(plan.matched, 2);
        assert!(plan.deactivations.is_empty());
        assert!(plan.reactivations.is_empty());
    }

    #[test]
    fn test_stored_items_filter() {
        let items = vec![
            IncomingItem::bare("A", 2.0),
            IncomingItem::bare("B", 0.0),
            IncomingItem::bare("C", -1.0),
        ];

        assert_eq!(stored_items(&items, false).len(), 1);
        assert_eq!(stored_items(&items, true).len(), 3);
    }

    #[test]
    fn test_summary_partial_failure() {
        let summary = CatalogSyncSummary {
            total_items: 1,
            matched: 1,
            new_added: 0,
            zero_qty: 1,
            deactivated: 0,
            reactivated: 0,
            ingest_batch_id: "b".to_string(),
            steps: vec![
                SyncStepOutcome::succeeded(SyncStep::AutoAdd, 0, 0),
                SyncStepOutcome::failed(SyncStep::AutoDeactivate, 1, "disk full"),
            ],
        };

        assert!(summary.has_partial_failure());
        assert_eq!(
            summary.step(SyncStep::AutoDeactivate).and_then(|s| s.error.as_deref()),
            Some("disk full")
        );
    }
}

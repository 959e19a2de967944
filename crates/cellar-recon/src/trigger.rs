//! # Auto-Compare Trigger
//!
//! Runs a reconciliation once both sides of a day exist, and reports which
//! countable products the POS saw but the count sheet missed.
//!
//! ```text
//!   manual counts?   latest batch?   reason       engine
//!   ─────────────    ─────────────   ─────────    ──────
//!        no               no         no_data        -
//!        no               yes        no_manual      -
//!        yes              no         no_pos         -
//!        yes              yes        compared      run + missing items
//! ```

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::engine::ReconEngine;
use crate::error::ReconResult;
use cellar_core::validation::validate_store_id;
use cellar_core::{AutoCompareOutcome, AutoCompareReason, MissingItem, Product};

impl ReconEngine {
    /// Reconciles `(store_id, date)` if both a count sheet and a POS batch
    /// exist; otherwise reports which side is missing.
    pub async fn auto_compare_if_ready(
        &self,
        store_id: &str,
        date: NaiveDate,
    ) -> ReconResult<AutoCompareOutcome> {
        validate_store_id(store_id)?;

        let has_manual = self.captures.has_manual_counts(store_id, date).await?;
        let batch = self.captures.latest_ingest_batch(store_id, date).await?;

        let reason = AutoCompareReason::from_presence(has_manual, batch.is_some());
        if reason != AutoCompareReason::Compared {
            debug!(store_id = %store_id, date = %date, reason = ?reason, "Auto-compare skipped");
            return Ok(AutoCompareOutcome::skipped(reason));
        }

        let summary = self.reconcile(store_id, date).await?;
        let missing_items = self.missing_items(store_id, date).await?;

        info!(
            store_id = %store_id,
            date = %date,
            total = summary.total,
            missing = missing_items.len(),
            "Auto-compare ran"
        );

        Ok(AutoCompareOutcome::compared(summary, missing_items))
    }

    /// Codes of the newest batch whose product should have been counted but
    /// has no manual count, sorted by code.
    async fn missing_items(&self, store_id: &str, date: NaiveDate) -> ReconResult<Vec<MissingItem>> {
        let counted: HashSet<String> = self
            .captures
            .list_manual_counts(store_id, date)
            .await?
            .into_iter()
            .map(|c| c.product_code)
            .collect();

        let catalog: HashMap<String, Product> = self
            .catalog
            .list_products(store_id)
            .await?
            .into_iter()
            .map(|p| (p.product_code.clone(), p))
            .collect();

        let missing: BTreeMap<String, String> = self
            .latest_pos_items(store_id, date)
            .await?
            .into_iter()
            .filter(|item| !counted.contains(&item.product_code))
            .filter_map(|item| {
                catalog
                    .get(&item.product_code)
                    .filter(|product| product.expects_count())
                    .map(|product| (item.product_code, product.product_name.clone()))
            })
            .collect();

        Ok(missing
            .into_iter()
            .map(|(product_code, product_name)| MissingItem {
                product_code,
                product_name,
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::ports::CaptureStore;
    use crate::test_support::{count, date, engine, item, seed_products};
    use cellar_core::{AutoCompareReason, CountStatus, IncomingItem};

    #[tokio::test]
    async fn test_no_data() {
        let (engine, _) = engine().await;
        let outcome = engine.auto_compare_if_ready("store-1", date()).await.unwrap();

        assert!(!outcome.compared);
        assert_eq!(outcome.reason, AutoCompareReason::NoData);
        assert!(outcome.summary.is_none());
        assert!(outcome.missing_items.is_none());
    }

    #[tokio::test]
    async fn test_only_pos() {
        let (engine, db) = engine().await;
        engine
            .sync_catalog_from_ingest("store-1", &[IncomingItem::bare("A", 1.0)], date(), false)
            .await
            .unwrap();

        let outcome = engine.auto_compare_if_ready("store-1", date()).await.unwrap();
        assert_eq!(outcome.reason, AutoCompareReason::NoManual);
        assert!(!outcome.compared);
        assert!(db.comparisons().list("store-1", date()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_manual() {
        let (engine, db) = engine().await;
        db.save_manual_counts("store-1", date(), &[count("A", 1.0)], None)
            .await
            .unwrap();

        let outcome = engine.auto_compare_if_ready("store-1", date()).await.unwrap();
        assert_eq!(outcome.reason, AutoCompareReason::NoPos);
        assert!(db.comparisons().list("store-1", date()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_still_counts_as_present() {
        let (engine, db) = engine().await;
        db.save_manual_counts("store-1", date(), &[count("A", 1.0)], None)
            .await
            .unwrap();
        engine
            .sync_catalog_from_ingest("store-1", &[IncomingItem::bare("A", 0.0)], date(), false)
            .await
            .unwrap();

        let outcome = engine.auto_compare_if_ready("store-1", date()).await.unwrap();
        assert!(outcome.compared);
        assert_eq!(outcome.summary.unwrap().manual_only, 1);
    }

    #[tokio::test]
    async fn test_compared_with_missing_items() {
        let (engine, db) = engine().await;
        seed_products(&db, "store-1", &[("B", "Bitters"), ("C", "Cognac")]).await;
        db.products()
            .set_count_status("store-1", "C", CountStatus::Inactive)
            .await
            .unwrap();

        db.save_manual_counts("store-1", date(), &[count("A", 2.0)], None)
            .await
            .unwrap();
        engine
            .sync_catalog_from_ingest(
                "store-1",
                &[
                    item("A", "Amaro", 2.0),
                    item("D", "Dry Vermouth", 1.0),
                    IncomingItem::bare("B", 4.0),
                    IncomingItem::bare("B", 5.0),
                    IncomingItem::bare("C", 1.0),
                    IncomingItem::bare("U", 1.0),
                    item("Z", "Zubrowka", 0.0),
                ],
                date(),
                true,
            )
            .await
            .unwrap();

        let outcome = engine.auto_compare_if_ready("store-1", date()).await.unwrap();
        assert!(outcome.compared);
        assert_eq!(outcome.reason, AutoCompareReason::Compared);

        let summary = outcome.summary.unwrap();
        assert_eq!(summary.exact_match, 1);

        // C is not counted by policy, U is not in the catalog, Z was added
        // inactive
        let missing: Vec<(String, String)> = outcome
            .missing_items
            .unwrap()
            .into_iter()
            .map(|m| (m.product_code, m.product_name))
            .collect();
        assert_eq!(
            missing,
            vec![
                ("B".to_string(), "Bitters".to_string()),
                ("D".to_string(), "Dry Vermouth".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_store_rejected() {
        let (engine, _) = engine().await;
        assert!(engine
            .auto_compare_if_ready("", date())
            .await
            .unwrap_err()
            .is_validation());
    }
}

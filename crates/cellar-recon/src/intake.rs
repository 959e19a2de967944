//! # Intake Operations
//!
//! The calls an application makes: submit a count sheet, upload a POS feed,
//! read results back, and manage the store tolerance. Both submissions end
//! with the auto-compare trigger, so whichever side arrives second produces
//! the comparison.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::engine::ReconEngine;
use crate::error::ReconResult;
use cellar_core::validation::{validate_count_entries, validate_store_id, validate_tolerance_percent};
use cellar_core::{
    AutoCompareOutcome, CatalogSyncSummary, Comparison, IncomingItem, ManualCountEntry, Tolerance,
};

/// Result of [`ReconEngine::record_manual_counts`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountSubmission {
    /// Entries written.
    pub saved: usize,
    pub auto_compare: AutoCompareOutcome,
}

/// Result of [`ReconEngine::ingest_pos_items`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub catalog: CatalogSyncSummary,
    pub auto_compare: AutoCompareOutcome,
}

impl ReconEngine {
    /// Saves a count sheet (upserting per product code) and runs the
    /// auto-compare trigger for the date.
    pub async fn record_manual_counts(
        &self,
        store_id: &str,
        count_date: NaiveDate,
        entries: &[ManualCountEntry],
        counted_by: Option<&str>,
    ) -> ReconResult<CountSubmission> {
        validate_store_id(store_id)?;
        validate_count_entries(entries)?;

        let counted_by = counted_by.map(str::trim).filter(|c| !c.is_empty());
        let saved = self
            .captures
            .save_manual_counts(store_id, count_date, entries, counted_by)
            .await?;

        info!(store_id = %store_id, count_date = %count_date, saved, "Manual counts saved");

        let auto_compare = self.auto_compare_if_ready(store_id, count_date).await?;
        Ok(CountSubmission {
            saved,
            auto_compare,
        })
    }

    /// Runs catalog sync for a POS feed and then the auto-compare trigger
    /// for the upload date. `include_zero_qty` falls back to the configured
    /// default.
    pub async fn ingest_pos_items(
        &self,
        store_id: &str,
        items: &[IncomingItem],
        upload_date: NaiveDate,
        include_zero_qty: Option<bool>,
    ) -> ReconResult<IngestOutcome> {
        let include_zero_qty = include_zero_qty.unwrap_or(self.options.include_zero_qty);

        let catalog = self
            .sync_catalog_from_ingest(store_id, items, upload_date, include_zero_qty)
            .await?;
        let auto_compare = self.auto_compare_if_ready(store_id, upload_date).await?;

        Ok(IngestOutcome {
            catalog,
            auto_compare,
        })
    }

    /// The stored comparison rows, ordered by product code.
    pub async fn comparisons(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
    ) -> ReconResult<Vec<Comparison>> {
        validate_store_id(store_id)?;
        Ok(self.captures.list_comparisons(store_id, comp_date).await?)
    }

    /// Stores the tolerance for a store. Takes effect on the next run.
    pub async fn set_tolerance(&self, store_id: &str, percent: f64) -> ReconResult<Tolerance> {
        validate_store_id(store_id)?;
        validate_tolerance_percent(percent)?;

        self.settings.set_tolerance_percent(store_id, percent).await?;
        info!(store_id = %store_id, percent, "Tolerance updated");

        Ok(Tolerance::from_percent(percent)?)
    }

    /// The tolerance the next run for this store will use.
    pub async fn tolerance(&self, store_id: &str) -> ReconResult<Tolerance> {
        validate_store_id(store_id)?;
        self.resolve_tolerance(store_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileSettings;
    use crate::test_support::{count, date, engine, item};
    use cellar_core::{AutoCompareReason, BatchStatus, ComparisonStatus};

    #[tokio::test]
    async fn test_second_submission_triggers_compare() {
        let (engine, _) = engine().await;

        let first = engine
            .record_manual_counts("store-1", date(), &[count("A", 4.0)], Some("  sam "))
            .await
            .unwrap();
        assert_eq!(first.saved, 1);
        assert_eq!(first.auto_compare.reason, AutoCompareReason::NoPos);

        let second = engine
            .ingest_pos_items("store-1", &[item("A", "Aperol", 4.0)], date(), None)
            .await
            .unwrap();
        assert_eq!(second.catalog.new_added, 1);
        assert!(second.auto_compare.compared);
        assert_eq!(second.auto_compare.summary.unwrap().exact_match, 1);
        assert_eq!(second.auto_compare.missing_items, Some(Vec::new()));

        let rows = engine.comparisons("store-1", date()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_name, "Aperol");
        assert_eq!(rows[0].status, ComparisonStatus::Approved);
    }

    #[tokio::test]
    async fn test_counted_by_is_trimmed() {
        let (engine, db) = engine().await;
        engine
            .record_manual_counts("store-1", date(), &[count("A", 4.0)], Some("  sam "))
            .await
            .unwrap();
        engine
            .record_manual_counts("store-1", date(), &[count("B", 1.0)], Some("   "))
            .await
            .unwrap();

        let counts = db.manual_counts().list("store-1", date()).await.unwrap();
        assert_eq!(counts[0].counted_by.as_deref(), Some("sam"));
        assert_eq!(counts[1].counted_by, None);
    }

    #[tokio::test]
    async fn test_recount_overwrites() {
        let (engine, db) = engine().await;
        engine
            .record_manual_counts("store-1", date(), &[count("A", 4.0)], None)
            .await
            .unwrap();
        engine
            .record_manual_counts("store-1", date(), &[count("A", 6.0)], None)
            .await
            .unwrap();

        let counts = db.manual_counts().list("store-1", date()).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count_quantity, 6.0);
    }

    #[tokio::test]
    async fn test_bad_counts_rejected() {
        let (engine, db) = engine().await;

        for entries in [vec![], vec![count("A", -1.0)], vec![count(" ", 1.0)]] {
            let err = engine
                .record_manual_counts("store-1", date(), &entries, None)
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }
        assert!(db.manual_counts().list("store-1", date()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_include_zero_default_from_options() {
        let (engine, db) = engine().await;
        let engine = engine.with_options(ReconcileSettings {
            include_zero_qty: true,
            ..ReconcileSettings::default()
        });

        let outcome = engine
            .ingest_pos_items("store-1", &[IncomingItem::bare("A", 0.0)], date(), None)
            .await
            .unwrap();
        let batch = db
            .ingests()
            .get_batch(&outcome.catalog.ingest_batch_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch.status, BatchStatus::Completed);

        let outcome = engine
            .ingest_pos_items("store-1", &[IncomingItem::bare("A", 0.0)], date(), Some(false))
            .await
            .unwrap();
        let batch = db
            .ingests()
            .get_batch(&outcome.catalog.ingest_batch_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch.status, BatchStatus::NoItems);
    }

    #[tokio::test]
    async fn test_tolerance_round_trip() {
        let (engine, _) = engine().await;

        assert_eq!(engine.tolerance("store-1").await.unwrap().percent(), 5.0);
        assert_eq!(engine.set_tolerance("store-1", 12.5).await.unwrap().percent(), 12.5);
        assert_eq!(engine.tolerance("store-1").await.unwrap().percent(), 12.5);
        assert_eq!(engine.tolerance("store-2").await.unwrap().percent(), 5.0);
    }

    #[tokio::test]
    async fn test_invalid_tolerance_rejected() {
        let (engine, _) = engine().await;

        for percent in [-1.0, 100.5, f64::INFINITY] {
            assert!(engine
                .set_tolerance("store-1", percent)
                .await
                .unwrap_err()
                .is_validation());
        }
        assert_eq!(engine.tolerance("store-1").await.unwrap().percent(), 5.0);
    }

    #[tokio::test]
    async fn test_outcomes_serialize() {
        let (engine, _) = engine().await;
        let submission = engine
            .record_manual_counts("store-1", date(), &[count("A", 1.0)], None)
            .await
            .unwrap();

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["saved"], 1);
        assert_eq!(json["auto_compare"]["reason"], "no_pos");
        assert_eq!(json["auto_compare"]["compared"], false);
    }
}

//! # Reconciliation
//!
//! Compares the manual count sheet of a day with the newest POS batch of the
//! same day and replaces the stored comparison set.
//!
//! ## Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lock (store_id, comp_date)                                            │
//! │     │                                                                   │
//! │     ├─► manual counts ─────────► code → manual_qty ─┐                  │
//! │     ├─► latest batch → items ──► code → pos_qty ────┼─► union of codes │
//! │     ├─► tolerance (store setting or default)        │                  │
//! │     └─► catalog names (fallback: item name, code)   ▼                  │
//! │                                          STATUS_RULES per code          │
//! │                                                     │                   │
//! │          replace rows (one transaction) ◄───────────┘                   │
//! │                     │                                                   │
//! │                     ├─► AUTO_COMPARE audit record   (best-effort)       │
//! │                     └─► notifier if over_tolerance  (best-effort)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The result depends only on the counts, the newest batch, and the
//! tolerance, so re-running a date yields the same rows.

use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::ReconEngine;
use crate::error::ReconResult;
use cellar_core::audit;
use cellar_core::reconcile::{build_comparisons, quantity_map, ComparisonSet};
use cellar_core::validation::validate_store_id;
use cellar_core::{Comparison, ComparisonSummary, IngestItem};

impl ReconEngine {
    /// Runs a comparison for the store and date and returns its counters.
    ///
    /// Missing data on either side is not an error: a date with no batch
    /// yields only manual-only lines, and vice versa.
    ///
    /// ## Errors
    /// * `ReconError::Validation` - blank store
    /// * `ReconError::Store` - a read or the replace failed; on a failed
    ///   replace the previous rows are left in place
    pub async fn reconcile(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
    ) -> ReconResult<ComparisonSummary> {
        validate_store_id(store_id)?;

        let _guard = self.locks.lock(store_id, comp_date).await;
        debug!(store_id = %store_id, comp_date = %comp_date, "Comparison lock acquired");

        let manual = quantity_map(
            self.captures
                .list_manual_counts(store_id, comp_date)
                .await?
                .into_iter()
                .map(|c| (c.product_code, c.count_quantity)),
        );

        let pos_items = self.latest_pos_items(store_id, comp_date).await?;
        let pos = quantity_map(
            pos_items
                .iter()
                .map(|item| (item.product_code.clone(), item.quantity)),
        );

        let tolerance = self.resolve_tolerance(store_id).await?;
        let names = self.display_names(store_id, &pos_items).await?;

        let ComparisonSet { lines, summary } = build_comparisons(&manual, &pos, &names, tolerance);

        let created_at = Utc::now();
        let rows: Vec<Comparison> = lines
            .into_iter()
            .map(|line| {
                let status = line.status();
                Comparison {
                    id: Uuid::new_v4().to_string(),
                    store_id: store_id.to_string(),
                    comp_date,
                    product_code: line.product_code,
                    product_name: line.product_name,
                    manual_quantity: line.discrepancy.manual_quantity,
                    pos_quantity: line.discrepancy.pos_quantity,
                    difference: line.discrepancy.difference,
                    diff_percent: line.discrepancy.diff_percent,
                    status,
                    created_at,
                }
            })
            .collect();

        self.captures
            .replace_comparisons(store_id, comp_date, &rows)
            .await?;

        self.record_audit(audit::comparison_run(store_id, comp_date, tolerance, &summary))
            .await;

        info!(
            store_id = %store_id,
            comp_date = %comp_date,
            tolerance = tolerance.percent(),
            total = summary.total,
            matched = summary.exact_match,
            within = summary.within_tolerance,
            over = summary.over_tolerance,
            manual_only = summary.manual_only,
            pos_only = summary.pos_only,
            "Comparison complete"
        );

        if summary.over_tolerance > 0 && self.options.notify_over_tolerance {
            if let Err(e) = self
                .notifier
                .notify_over_tolerance(store_id, comp_date, summary.over_tolerance)
                .await
            {
                warn!(
                    store_id = %store_id,
                    comp_date = %comp_date,
                    over = summary.over_tolerance,
                    error = %e,
                    "Over-tolerance notification failed"
                );
            }
        }

        Ok(summary)
    }

    /// Items of the newest batch for the date; empty when there is none.
    pub(crate) async fn latest_pos_items(
        &self,
        store_id: &str,
        date: NaiveDate,
    ) -> ReconResult<Vec<IngestItem>> {
        match self.captures.latest_ingest_batch(store_id, date).await? {
            Some(batch) => Ok(self.captures.list_ingest_items(&batch.id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Catalog names, falling back to the names the POS sent.
    async fn display_names(
        &self,
        store_id: &str,
        pos_items: &[IngestItem],
    ) -> ReconResult<BTreeMap<String, String>> {
        let mut names: BTreeMap<String, String> = pos_items
            .iter()
            .filter_map(|item| {
                item.product_name
                    .as_ref()
                    .map(|name| (item.product_code.clone(), name.clone()))
            })
            .collect();

        for product in self.catalog.list_products(store_id).await? {
            names.insert(product.product_code, product.product_name);
        }

        Ok(names)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

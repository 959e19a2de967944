//! # Catalog Sync
//!
//! Applies a POS upload to the catalog and records the upload as an ingest
//! batch.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate ──► load catalog ──► plan (cellar_core::catalog)             │
//! │                    │                │                                   │
//! │                 fatal               ▼                                   │
//! │                          ┌────────────────────┐                         │
//! │                          │ AUTO_ADD           │  each step best-effort: │
//! │                          │ AUTO_DEACTIVATE    │  failure → SyncStep-    │
//! │                          │ AUTO_REACTIVATE    │  Outcome, next step     │
//! │                          └─────────┬──────────┘  still runs             │
//! │                                    ▼                                    │
//! │                   ingest batch + items  (fatal on failure)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::ReconEngine;
use crate::error::ReconResult;
use cellar_core::audit;
use cellar_core::catalog::{normalize_item, plan_catalog_sync, stored_items};
use cellar_core::validation::{validate_ingest_items, validate_store_id};
use cellar_core::{
    BatchStatus, CatalogSyncSummary, IncomingItem, IngestBatch, IngestItem, IngestSource,
    NewProduct, Product, SyncStep, SyncStepOutcome, POS_TEXT_CONFIDENCE,
};

impl ReconEngine {
    /// Reconciles the catalog with a POS item list and stores the upload.
    ///
    /// ## Errors
    /// * `ReconError::Validation` - blank store, empty list, blank code, or a
    ///   non-finite quantity; nothing is written
    /// * `ReconError::Store` - the catalog could not be loaded or the batch
    ///   could not be stored
    ///
    /// Failures of the add / deactivate / reactivate steps are reported in
    /// [`CatalogSyncSummary::steps`] instead.
    pub async fn sync_catalog_from_ingest(
        &self,
        store_id: &str,
        items: &[IncomingItem],
        upload_date: NaiveDate,
        include_zero_qty: bool,
    ) -> ReconResult<CatalogSyncSummary> {
        validate_store_id(store_id)?;
        validate_ingest_items(items)?;

        let items: Vec<IncomingItem> = items.iter().map(normalize_item).collect();

        let mut catalog: HashMap<String, Product> = self
            .catalog
            .list_products(store_id)
            .await?
            .into_iter()
            .map(|p| (p.product_code.clone(), p))
            .collect();

        let plan = plan_catalog_sync(&catalog, &items);

        let (add_step, new_added) = self
            .auto_add(store_id, &plan.additions, &mut catalog)
            .await;
        let (deactivate_step, deactivated) = self
            .apply_activation(store_id, &plan.deactivations, false, &mut catalog)
            .await;
        let (reactivate_step, reactivated) = self
            .apply_activation(store_id, &plan.reactivations, true, &mut catalog)
            .await;

        let ingest_batch_id = self
            .store_ingest(store_id, &items, upload_date, include_zero_qty)
            .await?;

        let summary = CatalogSyncSummary {
            total_items: items.len(),
            matched: plan.matched,
            new_added,
            zero_qty: plan.zero_qty,
            deactivated,
            reactivated,
            ingest_batch_id,
            steps: vec![add_step, deactivate_step, reactivate_step],
        };

        info!(
            store_id = %store_id,
            upload_date = %upload_date,
            total = summary.total_items,
            matched = summary.matched,
            added = summary.new_added,
            zero_qty = summary.zero_qty,
            deactivated = summary.deactivated,
            reactivated = summary.reactivated,
            dropped = plan.dropped,
            partial_failure = summary.has_partial_failure(),
            "Catalog sync complete"
        );

        Ok(summary)
    }

    async fn auto_add(
        &self,
        store_id: &str,
        additions: &[NewProduct],
        catalog: &mut HashMap<String, Product>,
    ) -> (SyncStepOutcome, usize) {
        let step = SyncStep::AutoAdd;
        if additions.is_empty() {
            return (SyncStepOutcome::succeeded(step, 0, 0), 0);
        }

        match self.catalog.insert_products(store_id, additions).await {
            Ok(inserted) => {
                for product in &inserted {
                    self.record_audit(audit::product_added(product)).await;
                }
                let added = inserted.len();
                for product in inserted {
                    catalog.insert(product.product_code.clone(), product);
                }
                (SyncStepOutcome::succeeded(step, additions.len(), added), added)
            }
            Err(e) => {
                warn!(store_id = %store_id, count = additions.len(), error = %e, "Auto-add failed");
                (SyncStepOutcome::failed(step, additions.len(), e), 0)
            }
        }
    }

    async fn apply_activation(
        &self,
        store_id: &str,
        codes: &[String],
        active: bool,
        catalog: &mut HashMap<String, Product>,
    ) -> (SyncStepOutcome, usize) {
        let step = if active {
            SyncStep::AutoReactivate
        } else {
            SyncStep::AutoDeactivate
        };
        if codes.is_empty() {
            return (SyncStepOutcome::succeeded(step, 0, 0), 0);
        }

        match self.catalog.set_active(store_id, codes, active).await {
            Ok(changed) => {
                for code in codes {
                    if let Some(product) = catalog.get_mut(code) {
                        self.record_audit(audit::activation_changed(product, active)).await;
                        product.active = active;
                    }
                }
                let changed = changed as usize;
                (SyncStepOutcome::succeeded(step, codes.len(), changed), changed)
            }
            Err(e) => {
                warn!(
                    store_id = %store_id,
                    step = ?step,
                    count = codes.len(),
                    error = %e,
                    "Activation update failed"
                );
                (SyncStepOutcome::failed(step, codes.len(), e), 0)
            }
        }
    }

    /// Persists the batch and its stored items as one write; returns the
    /// batch ID.
    async fn store_ingest(
        &self,
        store_id: &str,
        items: &[IncomingItem],
        upload_date: NaiveDate,
        include_zero_qty: bool,
    ) -> ReconResult<String> {
        let stored = stored_items(items, include_zero_qty);

        let batch = IngestBatch {
            id: Uuid::new_v4().to_string(),
            store_id: store_id.to_string(),
            upload_date,
            item_count: items.len() as i64,
            processed_count: stored.len() as i64,
            status: BatchStatus::for_stored(stored.len()),
            source: IngestSource::PosText,
            created_at: Utc::now(),
        };

        let rows: Vec<IngestItem> = stored
            .into_iter()
            .map(|item| IngestItem {
                id: Uuid::new_v4().to_string(),
                ingest_batch_id: batch.id.clone(),
                product_code: item.product_code.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                confidence: POS_TEXT_CONFIDENCE,
            })
            .collect();
        self.captures.create_ingest_batch(&batch, &rows).await?;

        Ok(batch.id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

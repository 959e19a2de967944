//! Fixtures and failure-injecting port wrappers shared by the engine tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::ReconEngine;
use crate::error::{NotifierError, StoreError, StoreResult};
use crate::ports::{AuditSink, CaptureStore, CatalogStore, Notifier};
use cellar_core::{
    AuditEntry, Comparison, IncomingItem, IngestBatch, IngestItem, ManualCount, ManualCountEntry,
    NewProduct, Product,
};
use cellar_db::{Database, DbConfig};

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

/// An engine over a fresh in-memory database, plus the database itself.
pub async fn engine() -> (ReconEngine, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    (ReconEngine::with_database(db.clone()), db)
}

pub fn count(code: &str, quantity: f64) -> ManualCountEntry {
    ManualCountEntry {
        product_code: code.to_string(),
        quantity,
    }
}

pub fn item(code: &str, name: &str, quantity: f64) -> IncomingItem {
    IncomingItem::new(code, name, quantity, "bottle", "spirits")
}

/// Seeds active, countable products.
pub async fn seed_products(db: &Database, store_id: &str, products: &[(&str, &str)]) {
    let new: Vec<NewProduct> = products
        .iter()
        .map(|(code, name)| NewProduct {
            product_code: code.to_string(),
            product_name: name.to_string(),
            unit: "bottle".to_string(),
            category: "spirits".to_string(),
            active: true,
        })
        .collect();
    db.products().insert_many(store_id, &new).await.unwrap();
}

// =============================================================================
// Failure Injection
// =============================================================================

/// Which catalog calls should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogFaults {
    pub insert: bool,
    pub deactivate: bool,
    pub reactivate: bool,
}

/// Delegates to the database except where a fault is configured.
pub struct FaultyCatalog {
    pub db: Database,
    pub faults: CatalogFaults,
}

#[async_trait]
impl CatalogStore for FaultyCatalog {
    async fn list_products(&self, store_id: &str) -> StoreResult<Vec<Product>> {
        self.db.list_products(store_id).await
    }

    async fn insert_products(
        &self,
        store_id: &str,
        products: &[NewProduct],
    ) -> StoreResult<Vec<Product>> {
        if self.faults.insert {
            return Err(StoreError::Unavailable("insert refused".into()));
        }
        self.db.insert_products(store_id, products).await
    }

    async fn set_active(&self, store_id: &str, codes: &[String], active: bool) -> StoreResult<u64> {
        if (active && self.faults.reactivate) || (!active && self.faults.deactivate) {
            return Err(StoreError::Failed("update refused".into()));
        }
        self.db.set_active(store_id, codes, active).await
    }
}

/// Builds an engine whose catalog store misbehaves as configured.
pub fn faulty_engine(db: &Database, faults: CatalogFaults) -> ReconEngine {
    let shared = Arc::new(db.clone());
    ReconEngine::new(
        Arc::new(FaultyCatalog {
            db: db.clone(),
            faults,
        }),
        shared.clone(),
        shared.clone(),
        shared,
    )
}

/// Delegates to the database, but every ingest write carries one extra item
/// pointing at a batch that doesn't exist, so the item insert fails after
/// the batch row was written inside the same transaction.
pub struct DanglingItemCaptures {
    pub db: Database,
}

#[async_trait]
impl CaptureStore for DanglingItemCaptures {
    async fn list_manual_counts(
        &self,
        store_id: &str,
        count_date: NaiveDate,
    ) -> StoreResult<Vec<ManualCount>> {
        self.db.list_manual_counts(store_id, count_date).await
    }

    async fn has_manual_counts(&self, store_id: &str, count_date: NaiveDate) -> StoreResult<bool> {
        self.db.has_manual_counts(store_id, count_date).await
    }

    async fn save_manual_counts(
        &self,
        store_id: &str,
        count_date: NaiveDate,
        entries: &[ManualCountEntry],
        counted_by: Option<&str>,
    ) -> StoreResult<usize> {
        self.db
            .save_manual_counts(store_id, count_date, entries, counted_by)
            .await
    }

    async fn latest_ingest_batch(
        &self,
        store_id: &str,
        upload_date: NaiveDate,
    ) -> StoreResult<Option<IngestBatch>> {
        self.db.latest_ingest_batch(store_id, upload_date).await
    }

    async fn list_ingest_items(&self, batch_id: &str) -> StoreResult<Vec<IngestItem>> {
        self.db.list_ingest_items(batch_id).await
    }

    async fn create_ingest_batch(
        &self,
        batch: &IngestBatch,
        items: &[IngestItem],
    ) -> StoreResult<usize> {
        let mut items = items.to_vec();
        items.push(IngestItem {
            id: "dangling".to_string(),
            ingest_batch_id: "no-such-batch".to_string(),
            product_code: "X".to_string(),
            product_name: None,
            quantity: 1.0,
            unit: None,
            confidence: 100,
        });
        self.db.create_ingest_batch(batch, &items).await
    }

    async fn replace_comparisons(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        rows: &[Comparison],
    ) -> StoreResult<()> {
        self.db.replace_comparisons(store_id, comp_date, rows).await
    }

    async fn list_comparisons(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
    ) -> StoreResult<Vec<Comparison>> {
        self.db.list_comparisons(store_id, comp_date).await
    }
}

/// Builds an engine whose ingest writes always fail on the item insert.
pub fn dangling_item_engine(db: &Database) -> ReconEngine {
    let shared = Arc::new(db.clone());
    ReconEngine::new(
        shared.clone(),
        Arc::new(DanglingItemCaptures { db: db.clone() }),
        shared.clone(),
        shared,
    )
}

/// Rejects every audit write.
pub struct FailingAudit;

#[async_trait]
impl AuditSink for FailingAudit {
    async fn record(&self, _entry: &AuditEntry) -> StoreResult<()> {
        Err(StoreError::Unavailable("audit store offline".into()))
    }
}

/// Remembers every notification it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<(String, NaiveDate, usize)>>,
}

impl RecordingNotifier {
    pub fn calls(&self) -> Vec<(String, NaiveDate, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_over_tolerance(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        over_tolerance: usize,
    ) -> Result<(), NotifierError> {
        self.calls
            .lock()
            .unwrap()
            .push((store_id.to_string(), comp_date, over_tolerance));
        Ok(())
    }
}

/// Fails every notification, counting attempts.
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_over_tolerance(
        &self,
        _store_id: &str,
        _comp_date: NaiveDate,
        _over_tolerance: usize,
    ) -> Result<(), NotifierError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifierError("gateway down".into()))
    }
}

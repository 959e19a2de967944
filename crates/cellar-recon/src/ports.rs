//! # Store Ports
//!
//! The engine never talks to SQL directly. Everything it reads or writes goes
//! through these traits, which `sqlite.rs` implements for
//! [`cellar_db::Database`].
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐      ┌──────────────────┐
//! │   CatalogStore   │      │   CaptureStore   │      │ ToleranceSettings│
//! │  products        │      │  manual counts   │      │  per-store %     │
//! │                  │      │  ingest batches  │      │                  │
//! │                  │      │  comparisons     │      │                  │
//! └──────────────────┘      └──────────────────┘      └──────────────────┘
//! ┌──────────────────┐      ┌──────────────────┐
//! │    AuditSink     │      │     Notifier     │   failures of these two
//! │  append records  │      │  over-tolerance  │   are logged, not raised
//! └──────────────────┘      └──────────────────┘
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{NotifierError, StoreResult};
use cellar_core::{
    AuditEntry, Comparison, IngestBatch, IngestItem, ManualCount, ManualCountEntry, NewProduct,
    Product,
};

/// Per-store product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every product of the store, active or not.
    async fn list_products(&self, store_id: &str) -> StoreResult<Vec<Product>>;

    /// Creates products and returns them as stored.
    async fn insert_products(
        &self,
        store_id: &str,
        products: &[NewProduct],
    ) -> StoreResult<Vec<Product>>;

    /// Sets `active` for the given codes; returns the number of rows changed.
    async fn set_active(&self, store_id: &str, codes: &[String], active: bool) -> StoreResult<u64>;
}

/// Manual counts, POS ingest batches, and comparison results.
#[async_trait]
pub trait CaptureStore: Send + Sync {
    async fn list_manual_counts(
        &self,
        store_id: &str,
        count_date: NaiveDate,
    ) -> StoreResult<Vec<ManualCount>>;

    async fn has_manual_counts(&self, store_id: &str, count_date: NaiveDate) -> StoreResult<bool>;

    /// Upserts a count sheet; returns the number of entries written.
    async fn save_manual_counts(
        &self,
        store_id: &str,
        count_date: NaiveDate,
        entries: &[ManualCountEntry],
        counted_by: Option<&str>,
    ) -> StoreResult<usize>;

    /// The newest batch for the store and date.
    async fn latest_ingest_batch(
        &self,
        store_id: &str,
        upload_date: NaiveDate,
    ) -> StoreResult<Option<IngestBatch>>;

    async fn list_ingest_items(&self, batch_id: &str) -> StoreResult<Vec<IngestItem>>;

    /// Stores a batch together with its items, all or nothing; returns the
    /// number of items stored.
    async fn create_ingest_batch(
        &self,
        batch: &IngestBatch,
        items: &[IngestItem],
    ) -> StoreResult<usize>;

    /// Replaces the whole comparison set of the store and date atomically.
    async fn replace_comparisons(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        rows: &[Comparison],
    ) -> StoreResult<()>;

    async fn list_comparisons(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
    ) -> StoreResult<Vec<Comparison>>;
}

/// Per-store discrepancy tolerance.
#[async_trait]
pub trait ToleranceSettings: Send + Sync {
    /// The stored percentage, or `None` when the store never set one.
    async fn tolerance_percent(&self, store_id: &str) -> StoreResult<Option<f64>>;

    async fn set_tolerance_percent(&self, store_id: &str, percent: f64) -> StoreResult<()>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> StoreResult<()>;
}

/// Outbound alert for runs with over-tolerance products.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_over_tolerance(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        over_tolerance: usize,
    ) -> Result<(), NotifierError>;
}

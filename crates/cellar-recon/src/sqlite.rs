//! SQLite implementations of the store ports, backed by the cellar-db
//! repositories.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreResult;
use crate::ports::{AuditSink, CaptureStore, CatalogStore, ToleranceSettings};
use cellar_core::{
    AuditEntry, Comparison, IngestBatch, IngestItem, ManualCount, ManualCountEntry, NewProduct,
    Product,
};
use cellar_db::Database;

#[async_trait]
impl CatalogStore for Database {
    async fn list_products(&self, store_id: &str) -> StoreResult<Vec<Product>> {
        Ok(self.products().list_by_store(store_id).await?)
    }

    async fn insert_products(
        &self,
        store_id: &str,
        products: &[NewProduct],
    ) -> StoreResult<Vec<Product>> {
        Ok(self.products().insert_many(store_id, products).await?)
    }

    async fn set_active(&self, store_id: &str, codes: &[String], active: bool) -> StoreResult<u64> {
        Ok(self.products().set_active(store_id, codes, active).await?)
    }
}

#[async_trait]
impl CaptureStore for Database {
    async fn list_manual_counts(
        &self,
        store_id: &str,
        count_date: NaiveDate,
    ) -> StoreResult<Vec<ManualCount>> {
        Ok(self.manual_counts().list(store_id, count_date).await?)
    }

    async fn has_manual_counts(&self, store_id: &str, count_date: NaiveDate) -> StoreResult<bool> {
        Ok(self.manual_counts().exists(store_id, count_date).await?)
    }

    async fn save_manual_counts(
        &self,
        store_id: &str,
        count_date: NaiveDate,
        entries: &[ManualCountEntry],
        counted_by: Option<&str>,
    ) -> StoreResult<usize> {
        Ok(self
            .manual_counts()
            .upsert_many(store_id, count_date, entries, counted_by)
            .await?)
    }

    async fn latest_ingest_batch(
        &self,
        store_id: &str,
        upload_date: NaiveDate,
    ) -> StoreResult<Option<IngestBatch>> {
        Ok(self.ingests().latest_batch(store_id, upload_date).await?)
    }

    async fn list_ingest_items(&self, batch_id: &str) -> StoreResult<Vec<IngestItem>> {
        Ok(self.ingests().list_items(batch_id).await?)
    }

    async fn create_ingest_batch(
        &self,
        batch: &IngestBatch,
        items: &[IngestItem],
    ) -> StoreResult<usize> {
        Ok(self.ingests().create_batch(batch, items).await?)
    }

    async fn replace_comparisons(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        rows: &[Comparison],
    ) -> StoreResult<()> {
        self.comparisons().replace(store_id, comp_date, rows).await?;
        Ok(())
    }

    async fn list_comparisons(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
    ) -> StoreResult<Vec<Comparison>> {
        Ok(self.comparisons().list(store_id, comp_date).await?)
    }
}

#[async_trait]
impl ToleranceSettings for Database {
    async fn tolerance_percent(&self, store_id: &str) -> StoreResult<Option<f64>> {
        let setting = self.settings().get_tolerance(store_id).await?;
        Ok(setting.map(|s| s.diff_tolerance_percent))
    }

    async fn set_tolerance_percent(&self, store_id: &str, percent: f64) -> StoreResult<()> {
        self.settings().set_tolerance(store_id, percent).await?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for Database {
    async fn record(&self, entry: &AuditEntry) -> StoreResult<()> {
        self.audit().insert(entry).await?;
        Ok(())
    }
}

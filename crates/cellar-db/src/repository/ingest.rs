//! # Ingest Repository
//!
//! Persisted POS uploads. Each upload is one batch row plus the items that
//! survived the zero-quantity filter.
//!
//! ## Latest Batch Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Several uploads may exist for one (store, upload_date).               │
//! │  Only the newest one feeds reconciliation:                             │
//! │                                                                         │
//! │    ORDER BY created_at DESC, rowid DESC  LIMIT 1                       │
//! │                                                                         │
//! │  rowid breaks ties between uploads stamped in the same instant.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cellar_core::{IngestBatch, IngestItem};

const BATCH_COLUMNS: &str =
    "id, store_id, upload_date, item_count, processed_count, status, source, created_at";

/// Repository for ingest batches and their items.
#[derive(Debug, Clone)]
pub struct IngestRepository {
    pool: SqlitePool,
}

impl IngestRepository {
    /// Creates a new IngestRepository.
    pub fn new(pool: SqlitePool) -> Self {
        IngestRepository { pool }
    }

    /// Inserts a batch row and its items in one transaction.
    ///
    /// Either both land or neither does, so a failed upload never leaves a
    /// batch without its items behind to shadow an earlier upload.
    ///
    /// ## Returns
    /// Number of items stored.
    /// * `Err(DbError::ForeignKeyViolation)` - An item names another batch
    pub async fn create_batch(&self, batch: &IngestBatch, items: &[IngestItem]) -> DbResult<usize> {
        debug!(
            batch_id = %batch.id,
            store_id = %batch.store_id,
            upload_date = %batch.upload_date,
            items = items.len(),
            "Creating ingest batch"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        sqlx::query(
            r#"
            INSERT INTO ingest_batches (
                id, store_id, upload_date, item_count, processed_count, status, source, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&batch.id)
        .bind(&batch.store_id)
        .bind(batch.upload_date)
        .bind(batch.item_count)
        .bind(batch.processed_count)
        .bind(batch.status)
        .bind(batch.source)
        .bind(batch.created_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO ingest_items (
                    id, ingest_batch_id, product_code, product_name, quantity, unit, confidence
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.ingest_batch_id)
            .bind(&item.product_code)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(&item.unit)
            .bind(item.confidence)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        Ok(items.len())
    }

    /// Gets a batch by ID.
    pub async fn get_batch(&self, id: &str) -> DbResult<Option<IngestBatch>> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM ingest_batches WHERE id = ?1");

        let batch = sqlx::query_as::<_, IngestBatch>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(batch)
    }

    /// The newest batch for a store and upload date.
    pub async fn latest_batch(
        &self,
        store_id: &str,
        upload_date: NaiveDate,
    ) -> DbResult<Option<IngestBatch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM ingest_batches \
             WHERE store_id = ?1 AND upload_date = ?2 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        );

        let batch = sqlx::query_as::<_, IngestBatch>(&sql)
            .bind(store_id)
            .bind(upload_date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(batch)
    }

    /// All batches for a store and upload date, newest first.
    pub async fn list_batches(
        &self,
        store_id: &str,
        upload_date: NaiveDate,
    ) -> DbResult<Vec<IngestBatch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM ingest_batches \
             WHERE store_id = ?1 AND upload_date = ?2 \
             ORDER BY created_at DESC, rowid DESC"
        );

        let batches = sqlx::query_as::<_, IngestBatch>(&sql)
            .bind(store_id)
            .bind(upload_date)
            .fetch_all(&self.pool)
            .await?;

        Ok(batches)
    }

    /// Items of a batch in insertion order.
    pub async fn list_items(&self, batch_id: &str) -> DbResult<Vec<IngestItem>> {
        let items = sqlx::query_as::<_, IngestItem>(
            r#"
            SELECT id, ingest_batch_id, product_code, product_name, quantity, unit, confidence
            FROM ingest_items
            WHERE ingest_batch_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use cellar_core::{BatchStatus, IngestSource, POS_TEXT_CONFIDENCE};
    use chrono::{Duration, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn batch(id: &str, created_offset_secs: i64) -> IngestBatch {
        IngestBatch {
            id: id.to_string(),
            store_id: "store-1".to_string(),
            upload_date: date(),
            item_count: 1,
            processed_count: 1,
            status: BatchStatus::Completed,
            source: IngestSource::PosText,
            created_at: Utc::now() + Duration::seconds(created_offset_secs),
        }
    }

    fn item(batch_id: &str, code: &str, quantity: f64) -> IngestItem {
        IngestItem {
            id: generate_id(),
            ingest_batch_id: batch_id.to_string(),
            product_code: code.to_string(),
            product_name: None,
            quantity,
            unit: None,
            confidence: POS_TEXT_CONFIDENCE,
        }
    }

    #[tokio::test]
    async fn test_batch_with_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingests();

        let stored = repo
            .create_batch(&batch("b-1", 0), &[item("b-1", "Z", 1.0), item("b-1", "A", 2.5)])
            .await
            .unwrap();
        assert_eq!(stored, 2);

        let items = repo.list_items("b-1").await.unwrap();
        let codes: Vec<&str> = items.iter().map(|i| i.product_code.as_str()).collect();
        assert_eq!(codes, vec!["Z", "A"]);
        assert_eq!(items[1].quantity, 2.5);
        assert_eq!(items[1].confidence, 100);

        let loaded = repo.get_batch("b-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, BatchStatus::Completed);
        assert_eq!(loaded.source, IngestSource::PosText);
        assert_eq!(loaded.upload_date, date());
    }

    #[tokio::test]
    async fn test_latest_batch_wins() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingests();

        assert!(repo.latest_batch("store-1", date()).await.unwrap().is_none());

        repo.create_batch(&batch("older", -60), &[]).await.unwrap();
        repo.create_batch(&batch("newer", 0), &[]).await.unwrap();

        let latest = repo.latest_batch("store-1", date()).await.unwrap().unwrap();
        assert_eq!(latest.id, "newer");

        let all = repo.list_batches("store-1", date()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, "older");
    }

    #[tokio::test]
    async fn test_same_instant_uses_insertion_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingests();

        let first = batch("first", 0);
        let mut second = batch("second", 0);
        second.created_at = first.created_at;

        repo.create_batch(&first, &[]).await.unwrap();
        repo.create_batch(&second, &[]).await.unwrap();

        let latest = repo.latest_batch("store-1", date()).await.unwrap().unwrap();
        assert_eq!(latest.id, "second");
    }

    #[tokio::test]
    async fn test_failed_item_rolls_back_batch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingests();

        repo.create_batch(&batch("good", -60), &[item("good", "A", 10.0)])
            .await
            .unwrap();

        let err = repo
            .create_batch(
                &batch("bad", 0),
                &[item("bad", "A", 4.0), item("missing", "B", 1.0)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        // Neither the batch nor its first item survived
        assert!(repo.get_batch("bad").await.unwrap().is_none());
        assert!(repo.list_items("bad").await.unwrap().is_empty());

        let latest = repo.latest_batch("store-1", date()).await.unwrap().unwrap();
        assert_eq!(latest.id, "good");
        assert_eq!(repo.list_items("good").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_item_id_rolls_back_batch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ingests();

        let first = item("b-1", "A", 1.0);
        let mut twin = item("b-1", "B", 2.0);
        twin.id = first.id.clone();

        let err = repo
            .create_batch(&batch("b-1", 0), &[first, twin])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(repo.latest_batch("store-1", date()).await.unwrap().is_none());
    }
}

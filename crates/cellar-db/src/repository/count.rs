//! # Manual Count Repository
//!
//! Staff-entered stock counts, one row per `(store_id, count_date,
//! product_code)`. Re-submitting a sheet overwrites earlier values.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use cellar_core::{ManualCount, ManualCountEntry};

/// Repository for manual counts.
#[derive(Debug, Clone)]
pub struct ManualCountRepository {
    pool: SqlitePool,
}

impl ManualCountRepository {
    /// Creates a new ManualCountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ManualCountRepository { pool }
    }

    /// Lists the counts of one store and date, ordered by product code.
    pub async fn list(&self, store_id: &str, count_date: NaiveDate) -> DbResult<Vec<ManualCount>> {
        let counts = sqlx::query_as::<_, ManualCount>(
            r#"
            SELECT id, store_id, count_date, product_code, count_quantity, counted_by, created_at
            FROM manual_counts
            WHERE store_id = ?1 AND count_date = ?2
            ORDER BY product_code
            "#,
        )
        .bind(store_id)
        .bind(count_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// True when at least one count exists for the store and date.
    pub async fn exists(&self, store_id: &str, count_date: NaiveDate) -> DbResult<bool> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM manual_counts WHERE store_id = ?1 AND count_date = ?2)",
        )
        .bind(store_id)
        .bind(count_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    /// Writes a count sheet in one transaction.
    ///
    /// Existing rows for the same product and date are overwritten.
    /// Entries repeated within the sheet resolve to the last one.
    ///
    /// ## Returns
    /// Number of entries written.
    pub async fn upsert_many(
        &self,
        store_id: &str,
        count_date: NaiveDate,
        entries: &[ManualCountEntry],
        counted_by: Option<&str>,
    ) -> DbResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        debug!(
            store_id = %store_id,
            count_date = %count_date,
            count = entries.len(),
            "Saving manual counts"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO manual_counts (
                    id, store_id, count_date, product_code, count_quantity, counted_by, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (store_id, count_date, product_code) DO UPDATE SET
                    count_quantity = excluded.count_quantity,
                    counted_by = excluded.counted_by,
                    created_at = excluded.created_at
                "#,
            )
            .bind(generate_id())
            .bind(store_id)
            .bind(count_date)
            .bind(entry.product_code.trim())
            .bind(entry.quantity)
            .bind(counted_by)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        Ok(entries.len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

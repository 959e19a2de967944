//! # Comparison Repository
//!
//! Reconciliation results. A run never edits rows: it replaces the whole
//! `(store_id, comp_date)` set.
//!
//! ## Replace Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    DELETE FROM stock_comparisons WHERE store_id = ? AND comp_date = ?  │
//! │    INSERT row 1 .. row n                                               │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls back to the previous set. Readers never observe a   │
//! │  half-written run.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cellar_core::{Comparison, ComparisonStatus};

/// Repository for comparison results.
#[derive(Debug, Clone)]
pub struct ComparisonRepository {
    pool: SqlitePool,
}

impl ComparisonRepository {
    /// Creates a new ComparisonRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ComparisonRepository { pool }
    }

    /// Atomically replaces the comparison set of a store and date.
    ///
    /// Rows must belong to `store_id` and `comp_date`; an empty slice simply
    /// clears the set.
    ///
    /// ## Returns
    /// Number of rows removed.
    pub async fn replace(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        rows: &[Comparison],
    ) -> DbResult<u64> {
        if let Some(stray) = rows
            .iter()
            .find(|row| row.store_id != store_id || row.comp_date != comp_date)
        {
            return Err(DbError::QueryFailed(format!(
                "comparison {} belongs to {}/{}, not {}/{}",
                stray.product_code, stray.store_id, stray.comp_date, store_id, comp_date
            )));
        }

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let removed = sqlx::query("DELETE FROM stock_comparisons WHERE store_id = ?1 AND comp_date = ?2")
            .bind(store_id)
            .bind(comp_date)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO stock_comparisons (
                    id, store_id, comp_date, product_code, product_name,
                    manual_quantity, pos_quantity, difference, diff_percent,
                    status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&row.id)
            .bind(&row.store_id)
            .bind(row.comp_date)
            .bind(&row.product_code)
            .bind(&row.product_name)
            .bind(row.manual_quantity)
            .bind(row.pos_quantity)
            .bind(row.difference)
            .bind(row.diff_percent)
            .bind(row.status)
            .bind(row.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(DbError::transaction)?;

        debug!(
            store_id = %store_id,
            comp_date = %comp_date,
            removed,
            inserted = rows.len(),
            "Replaced comparison set"
        );

        Ok(removed)
    }

    /// Lists the comparison set of a store and date, ordered by code.
    pub async fn list(&self, store_id: &str, comp_date: NaiveDate) -> DbResult<Vec<Comparison>> {
        let rows = sqlx::query_as::<_, Comparison>(
            r#"
            SELECT id, store_id, comp_date, product_code, product_name,
                   manual_quantity, pos_quantity, difference, diff_percent,
                   status, created_at
            FROM stock_comparisons
            WHERE store_id = ?1 AND comp_date = ?2
            ORDER BY product_code
            "#,
        )
        .bind(store_id)
        .bind(comp_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Counts rows with a given status (for diagnostics).
    pub async fn count_by_status(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        status: ComparisonStatus,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_comparisons WHERE store_id = ?1 AND comp_date = ?2 AND status = ?3",
        )
        .bind(store_id)
        .bind(comp_date)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

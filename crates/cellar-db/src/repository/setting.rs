//! # Settings Repository
//!
//! Per-store settings. Today that is only the discrepancy tolerance.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cellar_core::ToleranceSetting;

/// Repository for store settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// The stored tolerance row, if the store has one.
    pub async fn get_tolerance(&self, store_id: &str) -> DbResult<Option<ToleranceSetting>> {
        let setting = sqlx::query_as::<_, ToleranceSetting>(
            "SELECT store_id, diff_tolerance_percent, updated_at FROM store_settings WHERE store_id = ?1",
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(setting)
    }

    /// Creates or updates the tolerance of a store.
    ///
    /// The value is stored as given; range checks belong to the caller.
    pub async fn set_tolerance(&self, store_id: &str, percent: f64) -> DbResult<ToleranceSetting> {
        debug!(store_id = %store_id, percent, "Setting tolerance");

        let setting = ToleranceSetting {
            store_id: store_id.to_string(),
            diff_tolerance_percent: percent,
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO store_settings (store_id, diff_tolerance_percent, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (store_id) DO UPDATE SET
                diff_tolerance_percent = excluded.diff_tolerance_percent,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&setting.store_id)
        .bind(setting.diff_tolerance_percent)
        .bind(setting.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(setting)
    }
}

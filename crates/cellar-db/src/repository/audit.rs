//! # Audit Repository
//!
//! Append-only audit trail. Payloads are JSON, stored as text.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::generate_id;
use cellar_core::{AuditAction, AuditEntry, AuditRecord};

/// Repository for audit log rows.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends an entry. `changed_by` is left null.
    pub async fn insert(&self, entry: &AuditEntry) -> DbResult<AuditRecord> {
        let record = AuditRecord {
            id: generate_id(),
            store_id: entry.store_id.clone(),
            action_type: entry.action.as_str().to_string(),
            table_name: entry.table_name.to_string(),
            record_id: entry.record_id.clone(),
            old_value: entry
                .old_value
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            new_value: serde_json::to_string(&entry.new_value)?,
            changed_by: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, store_id, action_type, table_name, record_id,
                old_value, new_value, changed_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&record.id)
        .bind(&record.store_id)
        .bind(&record.action_type)
        .bind(&record.table_name)
        .bind(&record.record_id)
        .bind(&record.old_value)
        .bind(&record.new_value)
        .bind(&record.changed_by)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// A store's trail, oldest first.
    pub async fn list_by_store(&self, store_id: &str, limit: u32) -> DbResult<Vec<AuditRecord>> {
        let records = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, store_id, action_type, table_name, record_id,
                   old_value, new_value, changed_by, created_at
            FROM audit_logs
            WHERE store_id = ?1
            ORDER BY created_at, rowid
            LIMIT ?2
            "#,
        )
        .bind(store_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Counts a store's entries of one action type.
    pub async fn count_by_action(&self, store_id: &str, action: AuditAction) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_logs WHERE store_id = ?1 AND action_type = ?2",
        )
        .bind(store_id)
        .bind(action.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.audit();

        let entry = AuditEntry {
            store_id: "store-1".to_string(),
            action: AuditAction::AutoDeactivate,
            table_name: "products",
            record_id: Some("prod-1".to_string()),
            old_value: Some(json!({ "active": true })),
            new_value: json!({ "active": false }),
        };
        repo.insert(&entry).await.unwrap();

        let records = repo.list_by_store("store-1", 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action_type, "AUTO_DEACTIVATE");
        assert_eq!(records[0].changed_by, None);

        let new_value: serde_json::Value = serde_json::from_str(&records[0].new_value).unwrap();
        assert_eq!(new_value["active"], json!(false));

        assert_eq!(
            repo.count_by_action("store-1", AuditAction::AutoDeactivate)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.count_by_action("store-1", AuditAction::AutoCompare)
                .await
                .unwrap(),
            0
        );
    }
}

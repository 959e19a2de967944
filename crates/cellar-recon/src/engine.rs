//! # Reconciliation Engine Handle
//!
//! [`ReconEngine`] owns the store ports, the notifier, the keyed comparison
//! locks, and the reconcile settings. Its operations live in sibling
//! modules:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  catalog_sync.rs  sync_catalog_from_ingest                             │
//! │  reconcile.rs     reconcile                                             │
//! │  trigger.rs       auto_compare_if_ready                                 │
//! │  intake.rs        record_manual_counts, ingest_pos_items,               │
//! │                   comparisons, set_tolerance, tolerance                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cloning is cheap and clones share locks, so one engine can be handed to
//! every request handler.

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ReconConfig, ReconcileSettings};
use crate::error::ReconResult;
use crate::locks::ComparisonLocks;
use crate::notifier::NoOpNotifier;
use crate::ports::{AuditSink, CaptureStore, CatalogStore, Notifier, ToleranceSettings};
use cellar_core::{AuditEntry, Tolerance};
use cellar_db::Database;

/// Entry point for catalog sync, reconciliation, and the auto-compare
/// trigger.
#[derive(Clone)]
pub struct ReconEngine {
    pub(crate) catalog: Arc<dyn CatalogStore>,
    pub(crate) captures: Arc<dyn CaptureStore>,
    pub(crate) settings: Arc<dyn ToleranceSettings>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) locks: ComparisonLocks,
    pub(crate) options: ReconcileSettings,
}

impl ReconEngine {
    /// Builds an engine over arbitrary stores, with [`NoOpNotifier`] and
    /// default settings.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        captures: Arc<dyn CaptureStore>,
        settings: Arc<dyn ToleranceSettings>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        ReconEngine {
            catalog,
            captures,
            settings,
            audit,
            notifier: Arc::new(NoOpNotifier),
            locks: ComparisonLocks::new(),
            options: ReconcileSettings::default(),
        }
    }

    /// Builds an engine whose every store is the given SQLite database.
    pub fn with_database(db: Database) -> Self {
        let db = Arc::new(db);
        Self::new(db.clone(), db.clone(), db.clone(), db)
    }

    /// Opens the configured database (running migrations) and builds an
    /// engine with the configured settings.
    pub async fn open(config: &ReconConfig) -> ReconResult<Self> {
        config.validate()?;

        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database.path.display(), "Reconciliation engine ready");

        Ok(Self::with_database(db).with_options(config.reconcile.clone()))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_options(mut self, options: ReconcileSettings) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReconcileSettings {
        &self.options
    }

    // =========================================================================
    // Shared Helpers
    // =========================================================================

    /// The store's tolerance; the configured default when the store has none
    /// or the stored value is NaN or negative. Stored values above 100 are
    /// honored.
    pub(crate) async fn resolve_tolerance(&self, store_id: &str) -> ReconResult<Tolerance> {
        let fallback =
            Tolerance::from_percent(self.options.default_tolerance_percent).unwrap_or_default();

        let Some(percent) = self.settings.tolerance_percent(store_id).await? else {
            return Ok(fallback);
        };

        match Tolerance::from_stored(percent) {
            Ok(tolerance) => Ok(tolerance),
            Err(e) => {
                warn!(
                    store_id = %store_id,
                    percent,
                    error = %e,
                    "Stored tolerance is invalid, using default"
                );
                Ok(fallback)
            }
        }
    }

    /// Writes an audit entry. Failures are logged and swallowed.
    pub(crate) async fn record_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(&entry).await {
            warn!(
                store_id = %entry.store_id,
                action = %entry.action,
                error = %e,
                "Failed to write audit record"
            );
        }
    }
}

impl fmt::Debug for ReconEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconEngine")
            .field("options", &self.options)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, engine};
    use cellar_db::DbConfig;

    #[tokio::test]
    async fn test_tolerance_defaults() {
        let (engine, db) = engine().await;

        assert_eq!(engine.resolve_tolerance("store-1").await.unwrap().percent(), 5.0);

        db.settings().set_tolerance("store-1", 12.0).await.unwrap();
        assert_eq!(engine.resolve_tolerance("store-1").await.unwrap().percent(), 12.0);

        let tuned = engine.clone().with_options(ReconcileSettings {
            default_tolerance_percent: 8.0,
            ..ReconcileSettings::default()
        });
        assert_eq!(tuned.resolve_tolerance("store-2").await.unwrap().percent(), 8.0);
    }

    #[tokio::test]
    async fn test_invalid_stored_tolerance_falls_back() {
        let (engine, db) = engine().await;

        // Written around the validating setter
        db.settings().set_tolerance("store-1", -3.0).await.unwrap();

        assert_eq!(engine.resolve_tolerance("store-1").await.unwrap().percent(), 5.0);
    }

    #[tokio::test]
    async fn test_stored_tolerance_above_hundred_is_honored() {
        let (engine, db) = engine().await;
        db.settings().set_tolerance("store-1", 150.0).await.unwrap();

        assert_eq!(engine.resolve_tolerance("store-1").await.unwrap().percent(), 150.0);
    }

    #[tokio::test]
    async fn test_clones_share_locks() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = ReconEngine::with_database(db);
        let clone = engine.clone();

        let _guard = engine.locks.lock("store-1", date()).await;
        assert_eq!(clone.locks.tracked(), 1);
    }
}

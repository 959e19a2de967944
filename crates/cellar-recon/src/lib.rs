//! # cellar-recon: Reconciliation Engine for Cellar
//!
//! Turns a day's manual count sheet and POS feed into a reviewed set of
//! comparison rows, keeping the product catalog in step with the POS.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cellar Data Flow                                 │
//! │                                                                         │
//! │   count sheet                          POS feed                         │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  record_manual_counts              ingest_pos_items                     │
//! │       │                                    │                            │
//! │       │                          sync_catalog_from_ingest               │
//! │       │                          (add / deactivate / reactivate,        │
//! │       │                           store ingest batch)                   │
//! │       │                                    │                            │
//! │       └──────────► auto_compare_if_ready ◄─┘                            │
//! │                           │                                             │
//! │                           ▼  both sides present                         │
//! │                       reconcile ──► comparison rows, audit, notifier    │
//! │                                                                         │
//! │  Storage goes through the `ports` traits; `Database` (cellar-db)        │
//! │  implements all of them.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cellar_recon::{ReconConfig, ReconEngine};
//!
//! let config = ReconConfig::load(None)?;
//! let engine = ReconEngine::open(&config).await?;
//!
//! engine.record_manual_counts("store-1", date, &counts, Some("sam")).await?;
//! let outcome = engine.ingest_pos_items("store-1", &items, date, None).await?;
//! if let Some(summary) = outcome.auto_compare.summary {
//!     println!("{} over tolerance", summary.over_tolerance);
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod notifier;
pub mod ports;
pub mod sqlite;

mod catalog_sync;
mod intake;
mod reconcile;
mod trigger;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{DatabaseSettings, ReconConfig, ReconcileSettings};
pub use engine::ReconEngine;
pub use error::{ConfigError, NotifierError, ReconError, ReconResult, StoreError, StoreResult};
pub use intake::{CountSubmission, IngestOutcome};
pub use locks::ComparisonLocks;
pub use notifier::{LogNotifier, NoOpNotifier};
pub use ports::{AuditSink, CaptureStore, CatalogStore, Notifier, ToleranceSettings};

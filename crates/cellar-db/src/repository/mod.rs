//! # Repository Module
//!
//! Database repository implementations for Cellar.
//!
//! ## Repository Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories by Table Family                         │
//! │                                                                         │
//! │  ProductRepository      products           catalog rows, activation    │
//! │  ManualCountRepository  manual_counts      upsert per (store,date,code)│
//! │  IngestRepository       ingest_batches     POS uploads + their items   │
//! │                         ingest_items                                    │
//! │  ComparisonRepository   stock_comparisons  full replace per run        │
//! │  SettingsRepository     store_settings     tolerance per store         │
//! │  AuditRepository        audit_logs         append-only trail           │
//! │                                                                         │
//! │  Multi-row writes run inside one transaction, so a failure leaves the  │
//! │  previous rows untouched.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

pub mod audit;
pub mod comparison;
pub mod count;
pub mod ingest;
pub mod product;
pub mod setting;

/// Generates a new row ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

//! # Domain Types
//!
//! Core domain types shared by the catalog sync, the reconciliation engine,
//! and the stores behind them.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog Store            Capture Store               Engine output     │
//! │  ─────────────            ─────────────               ─────────────     │
//! │  Product                  ManualCount                 Comparison        │
//! │   ├ active                IngestBatch ──┐              ├ status         │
//! │   └ count_status           └ status     │              └ diff_percent   │
//! │                           IngestItem ◄──┘             AuditEntry        │
//! │                                                                         │
//! │  Settings: ToleranceSetting (diff_tolerance_percent, default 5)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every stored entity has a UUID `id`, but the engine joins everything on
//! the business key `(store_id, product_code)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::reconcile::ComparisonSummary;

// =============================================================================
// Product
// =============================================================================

/// Whether a product should appear on the manual count sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CountStatus {
    /// Counted during every stocktake.
    #[default]
    Active,
    /// Tracked in the catalog but skipped by the count sheet.
    Inactive,
}

/// A trackable product in a store's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this product belongs to.
    pub store_id: String,

    /// Business key, unique per store.
    pub product_code: String,

    /// Display name.
    pub product_name: String,

    /// Counting unit ("bottle", "keg", ...).
    pub unit: Option<String>,

    /// Catalog category ("whisky", "beer", ...).
    pub category: Option<String>,

    /// Whether the product is currently stocked.
    pub active: bool,

    /// Whether the product is on the count sheet.
    pub count_status: CountStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// True when a missing manual count for this product should be flagged.
    pub fn expects_count(&self) -> bool {
        self.active && self.count_status == CountStatus::Active
    }
}

/// A product the catalog sync decided to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub product_code: String,
    pub product_name: String,
    pub unit: String,
    pub category: String,
    pub active: bool,
}

// =============================================================================
// Manual Counts
// =============================================================================

/// A human-entered quantity for one product on one business date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ManualCount {
    pub id: String,
    pub store_id: String,
    #[ts(as = "String")]
    pub count_date: NaiveDate,
    pub product_code: String,
    pub count_quantity: f64,
    /// Staff member who entered the count, when known.
    pub counted_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One line of a manual count sheet as submitted by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ManualCountEntry {
    pub product_code: String,
    pub quantity: f64,
}

// =============================================================================
// Ingest (point-of-sale uploads)
// =============================================================================

/// Where an ingest batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum IngestSource {
    /// Structured POS text export. Treated as ground truth.
    #[default]
    PosText,
}

/// Outcome of a POS upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// At least one item was stored.
    Completed,
    /// Nothing survived the zero-quantity filter.
    NoItems,
}

impl BatchStatus {
    /// Status for a batch that stored `stored` items.
    pub fn for_stored(stored: usize) -> Self {
        if stored > 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::NoItems
        }
    }
}

/// One item of a POS feed, as produced by the (external) text parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IncomingItem {
    pub product_code: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl IncomingItem {
    /// Builds an item with every catalog field present.
    pub fn new(
        product_code: impl Into<String>,
        product_name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        IncomingItem {
            product_code: product_code.into(),
            product_name: Some(product_name.into()),
            quantity,
            unit: Some(unit.into()),
            category: Some(category.into()),
        }
    }

    /// Builds an item carrying only a code and a quantity.
    pub fn bare(product_code: impl Into<String>, quantity: f64) -> Self {
        IncomingItem {
            product_code: product_code.into(),
            product_name: None,
            quantity,
            unit: None,
            category: None,
        }
    }
}

/// One persisted POS upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct IngestBatch {
    pub id: String,
    pub store_id: String,
    #[ts(as = "String")]
    pub upload_date: NaiveDate,
    /// Number of items received.
    pub item_count: i64,
    /// Number of items stored.
    pub processed_count: i64,
    pub status: BatchStatus,
    pub source: IngestSource,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A stored item of an ingest batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct IngestItem {
    pub id: String,
    pub ingest_batch_id: String,
    pub product_code: String,
    pub product_name: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
    /// Recognition confidence, 0-100.
    pub confidence: u8,
}

// =============================================================================
// Comparisons
// =============================================================================

/// Verdict for one product in one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// No further action needed.
    Approved,
    /// Needs a human explanation in the review workflow.
    Pending,
}

impl ComparisonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonStatus::Approved => "approved",
            ComparisonStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted comparison row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Comparison {
    pub id: String,
    pub store_id: String,
    #[ts(as = "String")]
    pub comp_date: NaiveDate,
    pub product_code: String,
    pub product_name: String,
    pub manual_quantity: Option<f64>,
    pub pos_quantity: Option<f64>,
    pub difference: Option<f64>,
    pub diff_percent: Option<f64>,
    pub status: ComparisonStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Settings
// =============================================================================

/// Per-store discrepancy tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ToleranceSetting {
    pub store_id: String,
    pub diff_tolerance_percent: f64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Audit
// =============================================================================

/// System-initiated actions written to the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AutoAddProduct,
    AutoDeactivate,
    AutoReactivate,
    AutoCompare,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AutoAddProduct => "AUTO_ADD_PRODUCT",
            AuditAction::AutoDeactivate => "AUTO_DEACTIVATE",
            AuditAction::AutoReactivate => "AUTO_REACTIVATE",
            AuditAction::AutoCompare => "AUTO_COMPARE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit record on its way to the sink. `changed_by` is always null for
/// these, so it is not carried here.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub store_id: String,
    pub action: AuditAction,
    pub table_name: &'static str,
    pub record_id: Option<String>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: serde_json::Value,
}

/// An audit record as stored. JSON payloads are kept as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditRecord {
    pub id: String,
    pub store_id: String,
    pub action_type: String,
    pub table_name: String,
    pub record_id: Option<String>,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Auto-Compare Outcome
// =============================================================================

/// Why the auto-compare trigger did or did not run the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AutoCompareReason {
    /// Both sides present; the engine ran.
    Compared,
    /// Neither a manual count nor a POS batch exists.
    NoData,
    /// Only the POS side exists.
    NoManual,
    /// Only the manual side exists.
    NoPos,
}

impl AutoCompareReason {
    /// Picks the branch from the presence of each side.
    pub fn from_presence(has_manual: bool, has_pos: bool) -> Self {
        match (has_manual, has_pos) {
            (false, false) => AutoCompareReason::NoData,
            (false, true) => AutoCompareReason::NoManual,
            (true, false) => AutoCompareReason::NoPos,
            (true, true) => AutoCompareReason::Compared,
        }
    }
}

/// An active, countable product the POS reported but nobody counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MissingItem {
    pub product_code: String,
    pub product_name: String,
}

/// Result of `auto_compare_if_ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AutoCompareOutcome {
    pub compared: bool,
    pub reason: AutoCompareReason,
    pub summary: Option<ComparisonSummary>,
    pub missing_items: Option<Vec<MissingItem>>,
}

impl AutoCompareOutcome {
    /// An outcome for a branch where the engine did not run.
    pub fn skipped(reason: AutoCompareReason) -> Self {
        AutoCompareOutcome {
            compared: false,
            reason,
            summary: None,
            missing_items: None,
        }
    }

    /// An outcome for a completed run.
    pub fn compared(summary: ComparisonSummary, missing_items: Vec<MissingItem>) -> Self {
        AutoCompareOutcome {
            compared: true,
            reason: AutoCompareReason::Compared,
            summary: Some(summary),
            missing_items: Some(missing_items),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

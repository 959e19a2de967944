//! # cellar-core: Pure Reconciliation Logic for Cellar
//!
//! This crate holds the stock reconciliation rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cellar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            cellar-recon (engine, trigger, catalog sync)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cellar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ reconcile │  │  catalog  │  │ validation│  │   │
//! │  │   │  Product  │  │ Discrep.  │  │  plan     │  │   rules   │  │   │
//! │  │   │ Comparison│  │ RuleTable │  │  summary  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cellar-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ManualCount, IngestBatch, Comparison, ...)
//! - [`reconcile`] - Discrepancy math and the ordered status rule table
//! - [`catalog`] - Catalog sync planning and its summary
//! - [`audit`] - Audit payload builders
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use cellar_core::reconcile::{classify, Discrepancy, StatusRule, Tolerance};
//!
//! let d = Discrepancy::compute(Some(10.0), Some(9.0));
//! assert_eq!(d.diff_percent, Some(11.11));
//!
//! let tolerance = Tolerance::from_percent(20.0).unwrap();
//! assert_eq!(classify(&d, tolerance), StatusRule::WithinTolerance);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod catalog;
pub mod error;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{CatalogSyncSummary, SyncStep, SyncStepOutcome};
pub use error::ValidationError;
pub use reconcile::{ComparisonSummary, Tolerance};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tolerance used when a store has no setting.
pub const DEFAULT_TOLERANCE_PERCENT: f64 = 5.0;

/// Upper bound accepted for a store tolerance.
pub const MAX_TOLERANCE_PERCENT: f64 = 100.0;

/// Confidence stamped on items that came from POS text rather than OCR.
pub const POS_TEXT_CONFIDENCE: u8 = 100;

/// Longest product code accepted from any feed.
pub const MAX_PRODUCT_CODE_LEN: usize = 64;

/// Longest display name accepted from any feed.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

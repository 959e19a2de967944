//! # cellar-db: Database Layer for Cellar
//!
//! SQLite persistence for the catalog, manual counts, POS ingest batches,
//! comparison results, store settings, and the audit trail.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cellar Data Flow                                 │
//! │                                                                         │
//! │  cellar-recon (CatalogStore / CaptureStore / AuditSink adapters)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cellar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repositories    │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ ProductRepository  │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ ManualCountRepo    │  │ 001_init   │  │   │
//! │  │   │ Connection    │    │ IngestRepository   │  │            │  │   │
//! │  │   │ Management    │    │ ComparisonRepo     │  │            │  │   │
//! │  │   │               │    │ Settings / Audit   │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (path from ReconConfig)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table family
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cellar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cellar.db")).await?;
//! let rows = db.comparisons().list("store-1", date).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::audit::AuditRepository;
pub use repository::comparison::ComparisonRepository;
pub use repository::count::ManualCountRepository;
pub use repository::ingest::IngestRepository;
pub use repository::product::ProductRepository;
pub use repository::setting::SettingsRepository;
pub use repository::generate_id;

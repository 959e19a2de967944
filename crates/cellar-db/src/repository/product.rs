//! # Product Repository
//!
//! Database operations for the per-store product catalog.
//!
//! ## Key Operations
//! - Load a store's whole catalog (the catalog sync works on an in-memory copy)
//! - Batch-insert products created from a POS upload
//! - Flip `active` for a set of product codes
//!
//! ## Activation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two independent flags                                │
//! │                                                                         │
//! │  active         ← driven by the POS feed (qty 0 → false, qty > 0 → true)│
//! │  count_status   ← driven by staff (on or off the count sheet)          │
//! │                                                                         │
//! │  A missing manual count is only flagged when both say "active".        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use cellar_core::{CountStatus, NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, store_id, product_code, product_name, unit, category, \
                               active, count_status, created_at, updated_at";

/// Repository for product database operations.
///
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let catalog = repo.list_by_store("store-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product of a store, active or not, ordered by code.
    pub async fn list_by_store(&self, store_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE store_id = ?1 ORDER BY product_code"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(store_id = %store_id, count = products.len(), "Loaded catalog");
        Ok(products)
    }

    /// Gets a product by its business key.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No product with that code in this store
    pub async fn get_by_code(&self, store_id: &str, product_code: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE store_id = ?1 AND product_code = ?2"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(store_id)
            .bind(product_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a single, fully-formed product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code already exists in the store
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(code = %product.product_code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, store_id, product_code, product_name, unit, category,
                active, count_status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.store_id)
        .bind(&product.product_code)
        .bind(&product.product_name)
        .bind(&product.unit)
        .bind(&product.category)
        .bind(product.active)
        .bind(product.count_status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Creates products from a catalog sync plan in one transaction.
    ///
    /// All or nothing: on any error (e.g. a code inserted concurrently) no
    /// product from this batch is kept.
    ///
    /// ## Returns
    /// The products as stored, with generated IDs and timestamps.
    pub async fn insert_many(&self, store_id: &str, products: &[NewProduct]) -> DbResult<Vec<Product>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        debug!(store_id = %store_id, count = products.len(), "Inserting products");

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;
        let mut inserted = Vec::with_capacity(products.len());

        for new in products {
            let product = Product {
                id: generate_id(),
                store_id: store_id.to_string(),
                product_code: new.product_code.clone(),
                product_name: new.product_name.clone(),
                unit: Some(new.unit.clone()),
                category: Some(new.category.clone()),
                active: new.active,
                count_status: CountStatus::Active,
                created_at: now,
                updated_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO products (
                    id, store_id, product_code, product_name, unit, category,
                    active, count_status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&product.id)
            .bind(&product.store_id)
            .bind(&product.product_code)
            .bind(&product.product_name)
            .bind(&product.unit)
            .bind(&product.category)
            .bind(product.active)
            .bind(product.count_status)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await?;

            inserted.push(product);
        }

        tx.commit().await.map_err(DbError::transaction)?;

        Ok(inserted)
    }

    /// Sets `active` for the given codes of a store.
    ///
    /// ## Returns
    /// Number of rows changed. Codes that don't exist are ignored.
    pub async fn set_active(&self, store_id: &str, codes: &[String], active: bool) -> DbResult<u64> {
        if codes.is_empty() {
            return Ok(0);
        }

        debug!(store_id = %store_id, count = codes.len(), active, "Updating product activation");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET active = ");
        query.push_bind(active);
        query.push(", updated_at = ");
        query.push_bind(Utc::now());
        query.push(" WHERE store_id = ");
        query.push_bind(store_id);
        query.push(" AND product_code IN (");
        let mut separated = query.separated(", ");
        for code in codes {
            separated.push_bind(code.as_str());
        }
        separated.push_unseparated(")");

        let result = query.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    /// Puts a product on or off the manual count sheet.
    pub async fn set_count_status(
        &self,
        store_id: &str,
        product_code: &str,
        status: CountStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET count_status = ?3, updated_at = ?4
            WHERE store_id = ?1 AND product_code = ?2
            "#,
        )
        .bind(store_id)
        .bind(product_code)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_code));
        }

        Ok(())
    }

    /// Counts a store's products (for diagnostics).
    pub async fn count(&self, store_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE store_id = ?1")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

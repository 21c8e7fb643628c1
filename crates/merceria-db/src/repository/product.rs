//! # Product Repository (Catalog Store)
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Lookups used by cart validation (`get_many`, `get_by_id`, `is_active`)
//! - Name/code search for the sale screen
//! - Catalog administration (insert, update details, soft delete)
//!
//! Stock is deliberately absent from every write here: `stock_milli` is set
//! once on insert and afterwards only moves through the
//! [`InventoryLedger`](crate::ledger::InventoryLedger).

use std::collections::HashMap;

use chrono::Utc;
use merceria_core::validation::{
    validate_code, validate_limit, validate_price_cents, validate_product_name,
    validate_search_query, validate_stock_milli,
};
use merceria_core::{Product, UnitOfMeasure};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, ServiceResult};

/// Prefixes a query tail with the full product column list.
macro_rules! select_products {
    ($tail:literal) => {
        concat!(
            "SELECT id, code, name, description, unit, stock_milli, price_cents, ",
            "is_active, created_at, updated_at FROM products ",
            $tail
        )
    };
}

/// Fields needed to create a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: UnitOfMeasure,
    pub stock_milli: i64,
    pub price_cents: i64,
}

/// Catalog edits. `None` leaves a field untouched. Stock is not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<UnitOfMeasure>,
    pub price_cents: Option<i64>,
    pub is_active: Option<bool>,
}

/// Outcome of [`ProductRepository::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// No sale referenced the product; the row is gone.
    Deleted,
    /// Historical sales reference it; it was deactivated instead.
    Deactivated,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or not)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(select_products!("WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(select_products!("WHERE code = ?1"))
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Loads every listed product in one query, keyed by id.
    ///
    /// Missing ids are simply absent from the map.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<HashMap<i64, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(select_products!("WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(requested = ids.len(), found = products.len(), "Loaded products");
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Whether the product exists and is active.
    pub async fn is_active(&self, id: i64) -> DbResult<bool> {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(active.unwrap_or(false))
    }

    /// Lists products sorted by name.
    pub async fn list(&self, only_active: bool, limit: i64, offset: i64) -> ServiceResult<Vec<Product>> {
        validate_limit(limit)?;

        let products = sqlx::query_as::<_, Product>(select_products!(
            "WHERE (?1 = 0 OR is_active = 1) ORDER BY name LIMIT ?2 OFFSET ?3"
        ))
        .bind(only_active)
        .bind(limit)
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products by name or code (case-insensitive substring).
    ///
    /// An empty query returns the first `limit` active products.
    pub async fn search_by_name(&self, query: &str, limit: i64) -> ServiceResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        validate_limit(limit)?;

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", escape_like(&query));
        let products = sqlx::query_as::<_, Product>(select_products!(
            r"WHERE is_active = 1
              AND (name LIKE ?1 ESCAPE '\' OR code LIKE ?1 ESCAPE '\')
              ORDER BY name
              LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &NewProduct) -> ServiceResult<Product> {
        validate_code(&product.code)?;
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;
        validate_stock_milli(product.stock_milli)?;

        let code = product.code.trim();
        debug!(code = %code, "Inserting product");

        let now = Utc::now();
        let inserted = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                code, name, description, unit, stock_milli, price_cents,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            RETURNING id, code, name, description, unit, stock_milli, price_cents,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(code)
        .bind(product.name.trim())
        .bind(product.description.as_deref())
        .bind(product.unit)
        .bind(product.stock_milli)
        .bind(product.price_cents)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", code),
            other => other,
        })?;

        Ok(inserted)
    }

    /// Updates name, description, unit, price or active flag.
    ///
    /// Past sales keep their snapshot; only future carts see the change.
    pub async fn update_details(&self, id: i64, update: &ProductUpdate) -> ServiceResult<Product> {
        if let Some(name) = &update.name {
            validate_product_name(name)?;
        }
        if let Some(price) = update.price_cents {
            validate_price_cents(price)?;
        }

        debug!(id = %id, "Updating product details");

        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                unit = COALESCE(?4, unit),
                price_cents = COALESCE(?5, price_cents),
                is_active = COALESCE(?6, is_active),
                updated_at = ?7
            WHERE id = ?1
            RETURNING id, code, name, description, unit, stock_milli, price_cents,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.unit)
        .bind(update.price_cents)
        .bind(update.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| DbError::not_found("Product", id).into())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// - Historical sales still reference this product
    /// - Can be restored if deactivated by mistake
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product nobody has bought, deactivates it otherwise.
    pub async fn remove(&self, id: i64) -> DbResult<Removal> {
        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sale_items WHERE product_id = ?1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if referenced {
            self.soft_delete(id).await?;
            return Ok(Removal::Deactivated);
        }

        match sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)
        {
            Ok(result) if result.rows_affected() == 0 => Err(DbError::not_found("Product", id)),
            Ok(_) => Ok(Removal::Deleted),
            // A sale referenced it between the check and the delete.
            Err(DbError::ForeignKeyViolation { .. }) => {
                self.soft_delete(id).await?;
                Ok(Removal::Deactivated)
            }
            Err(other) => Err(other),
        }
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

//! # Inventory Ledger
//!
//! Owns `products.stock_milli`. Every mutation is a single-row relative
//! update; nothing in this crate reads a stock value and writes it back.
//!
//! ## Delta Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compute, write (lost update)                          │
//! │     SELECT stock_milli → 5000                                          │
//! │     UPDATE products SET stock_milli = 0          (both cashiers!)      │
//! │                                                                         │
//! │  ✅ CORRECT: guarded relative update                                   │
//! │     UPDATE products SET stock_milli = stock_milli - 5000               │
//! │     WHERE id = ? AND stock_milli >= 5000                               │
//! │     RETURNING stock_milli                                              │
//! │                                                                         │
//! │  Cashier A: row returned → sold                                        │
//! │  Cashier B: no row       → InsufficientStock { available: 0 }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard in the `WHERE` clause is the authoritative check. The earlier
//! [`InventoryLedger::check_availability`] read only exists to fail fast with
//! a complete shortage list before any write is attempted.
//!
//! The `*_in` functions take a bare connection so the unit of work can run
//! them inside its transaction; the methods on [`InventoryLedger`] run them
//! on a pooled connection.

use chrono::Utc;
use merceria_core::{CoreError, Product, Quantity, StockShortage, ValidationError, MAX_STOCK_MILLI};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbResult, ServiceError, ServiceResult};

/// Answer to "can the shelf supply this much right now?".
#[derive(Debug, Clone)]
pub struct Availability {
    pub available: bool,
    pub current_stock: Quantity,
    pub product: Product,
}

impl Availability {
    /// Shortage entry for reporting, `None` when available.
    pub fn shortage(&self, requested: Quantity) -> Option<StockShortage> {
        (!self.available).then(|| StockShortage {
            product_id: self.product.id,
            code: self.product.code.clone(),
            requested_milli: requested.milli(),
            available_milli: self.current_stock.milli(),
        })
    }
}

/// Result of a manual stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockAdjustment {
    pub product_id: i64,
    pub previous_milli: i64,
    pub current_milli: i64,
}

/// The inventory ledger over a connection pool.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// Reports whether `requested` can be sold.
    ///
    /// Not an error when short or inactive: `available` is simply false.
    /// Fails with `ProductNotFound` when the product does not exist.
    pub async fn check_availability(
        &self,
        product_id: i64,
        requested: Quantity,
    ) -> ServiceResult<Availability> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, description, unit, stock_milli, price_cents,
                   is_active, created_at, updated_at
            FROM products WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CoreError::ProductNotFound(product_id))?;

        Ok(Availability {
            available: product.can_sell(requested),
            current_stock: product.stock(),
            product,
        })
    }

    /// Takes `quantity` off the shelf; see [`decrement_in`].
    pub async fn decrement(&self, product_id: i64, quantity: Quantity) -> ServiceResult<Quantity> {
        let mut conn = self.pool.acquire().await?;
        decrement_in(&mut conn, product_id, quantity).await
    }

    /// Puts `quantity` back; see [`increment_in`].
    pub async fn increment(&self, product_id: i64, quantity: Quantity) -> ServiceResult<Quantity> {
        let mut conn = self.pool.acquire().await?;
        increment_in(&mut conn, product_id, quantity).await
    }

    /// Manual correction by a signed `delta` (restock, breakage, count).
    ///
    /// Rejected with `InsufficientStock` when the result would be negative,
    /// and with a validation error when `delta` or the result is beyond
    /// [`MAX_STOCK_MILLI`].
    pub async fn adjust(
        &self,
        product_id: i64,
        delta: Quantity,
        reason: &str,
    ) -> ServiceResult<StockAdjustment> {
        let milli = delta.milli();
        if !(-MAX_STOCK_MILLI..=MAX_STOCK_MILLI).contains(&milli) {
            return Err(CoreError::from(out_of_range("delta", -MAX_STOCK_MILLI)).into());
        }

        let current: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock_milli = stock_milli + ?2, updated_at = ?3
            WHERE id = ?1 AND stock_milli + ?2 BETWEEN 0 AND ?4
            RETURNING stock_milli
            "#,
        )
        .bind(product_id)
        .bind(milli)
        .bind(Utc::now())
        .bind(MAX_STOCK_MILLI)
        .fetch_optional(&self.pool)
        .await?;

        let Some(current) = current else {
            let mut conn = self.pool.acquire().await?;
            return Err(if milli < 0 {
                explain_rejection(&mut conn, product_id, Quantity::from_milli(-milli)).await
            } else {
                explain_overflow(&mut conn, product_id).await
            });
        };

        let adjustment = StockAdjustment {
            product_id,
            previous_milli: current - milli,
            current_milli: current,
        };

        info!(
            product_id,
            delta = %delta,
            previous = adjustment.previous_milli,
            current = adjustment.current_milli,
            reason = %reason,
            "Stock adjusted"
        );
        Ok(adjustment)
    }

    /// Active products at or below `threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: Quantity) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, description, unit, stock_milli, price_cents,
                   is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1 AND stock_milli <= ?1
            ORDER BY stock_milli ASC, name ASC
            "#,
        )
        .bind(threshold.milli())
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Connection-level mutations
// =============================================================================

/// Atomically subtracts `quantity`, returning the new stock.
///
/// The guard is evaluated by SQLite in the same statement as the update, so
/// two concurrent decrements can never both take the last unit.
pub async fn decrement_in(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: Quantity,
) -> ServiceResult<Quantity> {
    debug!(product_id, quantity = %quantity, "Decrementing stock");

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_milli = stock_milli - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_milli >= ?2
        RETURNING stock_milli
        "#,
    )
    .bind(product_id)
    .bind(quantity.milli())
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    match remaining {
        Some(milli) => Ok(Quantity::from_milli(milli)),
        None => Err(explain_rejection(conn, product_id, quantity).await),
    }
}

/// Atomically adds `quantity` back, returning the new stock.
///
/// Fails with a validation error instead of pushing stock past
/// [`MAX_STOCK_MILLI`].
pub async fn increment_in(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: Quantity,
) -> ServiceResult<Quantity> {
    debug!(product_id, quantity = %quantity, "Incrementing stock");

    let stock: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_milli = stock_milli + ?2, updated_at = ?3
        WHERE id = ?1 AND stock_milli <= ?4 - ?2
        RETURNING stock_milli
        "#,
    )
    .bind(product_id)
    .bind(quantity.milli())
    .bind(Utc::now())
    .bind(MAX_STOCK_MILLI)
    .fetch_optional(&mut *conn)
    .await?;

    match stock {
        Some(milli) => Ok(Quantity::from_milli(milli)),
        None => Err(explain_overflow(conn, product_id).await),
    }
}

/// Works out why a guarded update matched no row.
async fn explain_rejection(
    conn: &mut SqliteConnection,
    product_id: i64,
    requested: Quantity,
) -> ServiceError {
    let row: Result<Option<(String, i64)>, sqlx::Error> =
        sqlx::query_as("SELECT code, stock_milli FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await;

    match row {
        Ok(Some((code, available_milli))) => CoreError::InsufficientStock {
            shortages: vec![StockShortage {
                product_id,
                code,
                requested_milli: requested.milli(),
                available_milli,
            }],
        }
        .into(),
        Ok(None) => CoreError::ProductNotFound(product_id).into(),
        Err(err) => err.into(),
    }
}

/// Works out why an increment matched no row.
async fn explain_overflow(conn: &mut SqliteConnection, product_id: i64) -> ServiceError {
    let exists: Result<Option<i64>, sqlx::Error> =
        sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await;

    match exists {
        Ok(Some(_)) => CoreError::from(out_of_range("stock", 0)).into(),
        Ok(None) => CoreError::ProductNotFound(product_id).into(),
        Err(err) => err.into(),
    }
}

fn out_of_range(field: &str, min: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max: MAX_STOCK_MILLI,
    }
}

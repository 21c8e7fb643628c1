//! # Unit of Work
//!
//! One SQLite transaction that a sale (or its cancellation) runs inside.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UnitOfWork::begin(pool)                                               │
//! │       │                                                                 │
//! │       ├── insert_sale(..)          ─┐                                   │
//! │       ├── insert_line_item(..) × N  │  all on the same transaction     │
//! │       ├── decrement_stock(..)  × M ─┘                                   │
//! │       │                                                                 │
//! │       ├── commit()   → every effect becomes visible together           │
//! │       └── (dropped)  → sqlx rolls the transaction back, nothing stays  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any `?` that leaves a function holding a `UnitOfWork` therefore undoes
//! the whole attempt.
//!
//! The transaction starts with `BEGIN IMMEDIATE`, so the write lock is taken
//! up front and waits out `busy_timeout` like any other writer. A deferred
//! transaction that reads first (cancellation does) would hold a WAL read
//! snapshot that SQLite refuses to upgrade while another connection writes,
//! failing at once with SQLITE_BUSY.

use chrono::{DateTime, Utc};
use merceria_core::cart::PricedLine;
use merceria_core::{PaymentMethod, Quantity, Sale, SaleItem};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbResult, ServiceResult};
use crate::ledger;

/// Header row of a sale about to be written.
#[derive(Debug, Clone)]
pub struct NewSale<'a> {
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<&'a str>,
    pub cashier_id: i64,
}

/// An open transaction with the operations a sale needs.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Starts a write transaction on a pooled connection.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(UnitOfWork { tx })
    }

    pub async fn insert_sale(&mut self, sale: &NewSale<'_>) -> DbResult<Sale> {
        let inserted = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                created_at, total_cents, subtotal_cents, tax_cents,
                payment_method, notes, cashier_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, created_at, total_cents, subtotal_cents, tax_cents,
                      payment_method, notes, cashier_id
            "#,
        )
        .bind(sale.created_at)
        .bind(sale.total_cents)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.payment_method)
        .bind(sale.notes)
        .bind(sale.cashier_id)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(sale_id = inserted.id, "Inserted sale row");
        Ok(inserted)
    }

    /// Writes one line with the product snapshot frozen in.
    pub async fn insert_line_item(&mut self, sale_id: i64, line: &PricedLine) -> DbResult<SaleItem> {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (
                sale_id, product_id, code_snapshot, name_snapshot, unit_snapshot,
                quantity_milli, unit_price_cents, line_subtotal_cents, was_override
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id, sale_id, product_id, code_snapshot, name_snapshot, unit_snapshot,
                      quantity_milli, unit_price_cents, line_subtotal_cents, was_override
            "#,
        )
        .bind(sale_id)
        .bind(line.product_id)
        .bind(line.code.as_str())
        .bind(line.name.as_str())
        .bind(line.unit)
        .bind(line.quantity_milli)
        .bind(line.unit_price_cents)
        .bind(line.line_subtotal_cents)
        .bind(line.was_override)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(item)
    }

    /// Ledger decrement on this transaction.
    pub async fn decrement_stock(&mut self, product_id: i64, quantity: Quantity) -> ServiceResult<Quantity> {
        ledger::decrement_in(&mut self.tx, product_id, quantity).await
    }

    /// Ledger increment on this transaction.
    pub async fn increment_stock(&mut self, product_id: i64, quantity: Quantity) -> ServiceResult<Quantity> {
        ledger::increment_in(&mut self.tx, product_id, quantity).await
    }

    pub async fn sale(&mut self, sale_id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, created_at, total_cents, subtotal_cents, tax_cents,
                   payment_method, notes, cashier_id
            FROM sales WHERE id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(sale)
    }

    pub async fn sale_items(&mut self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, code_snapshot, name_snapshot, unit_snapshot,
                   quantity_milli, unit_price_cents, line_subtotal_cents, was_override
            FROM sale_items WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(items)
    }

    /// Deletes the sale; its items go with it (ON DELETE CASCADE).
    ///
    /// Returns false when no such sale exists.
    pub async fn delete_sale(&mut self, sale_id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Makes every effect of this unit visible at once.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Explicitly discards every effect. Dropping has the same result.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

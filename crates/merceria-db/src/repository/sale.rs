//! # Sale Repository (read side)
//!
//! Lookups and reports over committed sales. Sales are only ever written by
//! the [`SaleCoordinator`](crate::coordinator::SaleCoordinator) through a
//! unit of work; nothing here mutates.
//!
//! ## Reports
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list(limit, offset)        newest first                                │
//! │  list_between(start, end)   half-open [start, end)                      │
//! │  list_today()               local calendar day                          │
//! │  stats() / stats_between()  count, revenue, average, max, min           │
//! │  overview()                 overall + today + this month together       │
//! │  top_products(limit)        by quantity sold                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Local, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use merceria_core::validation::validate_limit;
use merceria_core::{Sale, SaleItem, SaleRecord, UnitOfMeasure, ValidationError};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbResult, ServiceResult};

const SALE_COLUMNS: &str = "id, created_at, total_cents, subtotal_cents, tax_cents, \
                            payment_method, notes, cashier_id";

/// Aggregate figures over a set of sales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SalesStats {
    pub count: i64,
    pub revenue_cents: i64,
    pub average_cents: i64,
    pub max_cents: i64,
    pub min_cents: i64,
}

/// Overall, today's and this month's figures side by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsOverview {
    pub general: SalesStats,
    pub today: SalesStats,
    pub month: SalesStats,
}

/// One row of the best-sellers report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: i64,
    pub code: String,
    pub name: String,
    pub unit: UnitOfMeasure,
    pub quantity_milli: i64,
    pub times_sold: i64,
    pub revenue_cents: i64,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets the line items of a sale in insertion order.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, code_snapshot, name_snapshot, unit_snapshot,
                   quantity_milli, unit_price_cents, line_subtotal_cents, was_override
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale with its line items.
    pub async fn get_record(&self, id: i64) -> DbResult<Option<SaleRecord>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;
        Ok(Some(SaleRecord { sale, items }))
    }

    /// Lists sales, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<Sale>> {
        validate_limit(limit)?;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists sales with `start <= created_at < end`, newest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<Sale>> {
        check_range(start, end)?;
        debug!(%start, %end, "Listing sales in range");

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales
             WHERE julianday(created_at) >= julianday(?1) AND julianday(created_at) < julianday(?2)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Sales of the current local calendar day.
    pub async fn list_today(&self) -> ServiceResult<Vec<Sale>> {
        let (start, end) = today_bounds();
        self.list_between(start, end).await
    }

    /// Figures over every sale ever recorded.
    pub async fn stats(&self) -> DbResult<SalesStats> {
        self.stats_query(None).await
    }

    /// Figures over sales in `[start, end)`.
    pub async fn stats_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<SalesStats> {
        check_range(start, end)?;
        Ok(self.stats_query(Some((start, end))).await?)
    }

    /// Figures for the current local calendar day.
    pub async fn stats_today(&self) -> DbResult<SalesStats> {
        self.stats_query(Some(today_bounds())).await
    }

    /// Figures for the current local calendar month.
    pub async fn stats_month(&self) -> DbResult<SalesStats> {
        self.stats_query(Some(month_bounds())).await
    }

    pub async fn overview(&self) -> DbResult<StatsOverview> {
        Ok(StatsOverview {
            general: self.stats().await?,
            today: self.stats_today().await?,
            month: self.stats_month().await?,
        })
    }

    async fn stats_query(&self, range: Option<(DateTime<Utc>, DateTime<Utc>)>) -> DbResult<SalesStats> {
        let (start, end) = range.unzip();

        let mut stats = sqlx::query_as::<_, SalesStats>(
            r#"
            SELECT
                COUNT(*)                        AS count,
                COALESCE(SUM(total_cents), 0)   AS revenue_cents,
                0                               AS average_cents,
                COALESCE(MAX(total_cents), 0)   AS max_cents,
                COALESCE(MIN(total_cents), 0)   AS min_cents
            FROM sales
            WHERE (?1 IS NULL OR julianday(created_at) >= julianday(?1))
              AND (?2 IS NULL OR julianday(created_at) < julianday(?2))
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        if stats.count > 0 {
            stats.average_cents = (stats.revenue_cents + stats.count / 2) / stats.count;
        }
        Ok(stats)
    }

    /// Best sellers by quantity. Uses the frozen snapshot for code and name.
    pub async fn top_products(&self, limit: i64) -> ServiceResult<Vec<TopProduct>> {
        validate_limit(limit)?;

        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                si.product_id                 AS product_id,
                MAX(si.code_snapshot)         AS code,
                MAX(si.name_snapshot)         AS name,
                MAX(si.unit_snapshot)         AS unit,
                SUM(si.quantity_milli)        AS quantity_milli,
                COUNT(DISTINCT si.sale_id)    AS times_sold,
                SUM(si.line_subtotal_cents)   AS revenue_cents
            FROM sale_items si
            GROUP BY si.product_id
            ORDER BY quantity_milli DESC, revenue_cents DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Counts sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::InvalidFormat {
            field: "end".to_string(),
            reason: "must be after start".to_string(),
        });
    }
    Ok(())
}

/// `[midnight today, midnight tomorrow)` in the server's local time zone.
pub fn today_bounds() -> (DateTime<Utc>, DateTime<Utc>) {
    let today = Local::now().date_naive();
    let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);
    (local_midnight(today), local_midnight(tomorrow))
}

/// `[first of this month, first of next month)`, local time.
pub fn month_bounds() -> (DateTime<Utc>, DateTime<Utc>) {
    let today = Local::now().date_naive();
    let first = today.with_day(1).unwrap_or(today);
    let next = first.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
    (local_midnight(first), local_midnight(next))
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

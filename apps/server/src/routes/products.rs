//! # Product Routes
//!
//! Read-only catalog lookups plus the manual stock adjustment. Stock never
//! changes through the catalog store; the adjustment goes to the ledger.

use axum::extract::{Path, Query, State};
use axum::Json;
use merceria_core::{
    CoreError, Product, Quantity, MAX_NOTES_LEN, MAX_STOCK_MILLI, MAX_STOCK_UNITS,
};
use merceria_core::validation::validate_code;
use merceria_db::{DbError, StockAdjustment};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    /// Name search; lists the catalog when absent.
    pub q: Option<String>,
    #[serde(default = "default_true")]
    pub active_only: bool,
    #[serde(default = "super::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    /// Threshold in whole units; the configured default when absent.
    pub threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Signed change in the product's unit, e.g. `-1.5` meters.
    pub delta: Decimal,
    pub reason: String,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.db.products();
    let found = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => products.search_by_name(q, query.limit).await?,
        _ => products.list(query.active_only, query.limit, query.offset).await?,
    };
    Ok(Json(found))
}

pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let threshold = match query.threshold {
        Some(units) => threshold_from_units(units).ok_or_else(|| {
            ApiError::validation(format!("threshold must be between 0 and {MAX_STOCK_UNITS}"))
        })?,
        None => state.low_stock_threshold,
    };
    Ok(Json(state.db.ledger().low_stock(threshold).await?))
}

/// Whole units within `0..=MAX_STOCK_UNITS` as a quantity.
fn threshold_from_units(units: i64) -> Option<Quantity> {
    if (0..=MAX_STOCK_UNITS).contains(&units) {
        Quantity::checked_from_units(units)
    } else {
        None
    }
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product))
}

/// Scanner lookup by catalog code.
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Product>, ApiError> {
    validate_code(&code)?;
    let product = state
        .db
        .products()
        .get_by_code(&code)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &code))?;
    Ok(Json(product))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<StockAdjustment>, ApiError> {
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::validation("reason is required"));
    }
    if reason.chars().count() > MAX_NOTES_LEN {
        return Err(ApiError::validation(format!(
            "reason must be at most {MAX_NOTES_LEN} characters"
        )));
    }

    let delta = Quantity::from_decimal(req.delta)
        .ok_or_else(|| ApiError::validation("delta allows at most three decimal places"))?;
    if delta == Quantity::zero() {
        return Err(ApiError::validation("delta must not be zero"));
    }
    if delta.milli().unsigned_abs() > MAX_STOCK_MILLI.unsigned_abs() {
        return Err(ApiError::validation(format!(
            "delta must be at most {MAX_STOCK_UNITS} units either way"
        )));
    }

    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    if product.unit.requires_integral() && !delta.is_integral() {
        return Err(ApiError::validation(format!(
            "{} is sold by {}, delta must be whole",
            product.code,
            product.unit.as_str()
        )));
    }

    Ok(Json(state.db.ledger().adjust(id, delta, reason).await?))
}

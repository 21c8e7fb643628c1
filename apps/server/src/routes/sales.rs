//! # Sale Routes
//!
//! ```text
//! POST   /api/sales/preview        cart → projected totals, no side effects
//! POST   /api/sales                cart → committed sale (201)
//! GET    /api/sales                newest first, ?limit&offset
//! GET    /api/sales/today          today's sales + figures
//! GET    /api/sales/stats          overall, today, month; plus ?start&end
//! GET    /api/sales/top-products   ?limit
//! GET    /api/sales/range          ?start&end (RFC 3339)
//! GET    /api/sales/{id}           sale with line items
//! GET    /api/sales/{id}/receipt   receipt view
//! DELETE /api/sales/{id}           cancel: restore stock, remove sale
//! ```

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use merceria_core::validation::validate_id;
use merceria_core::{CartItem, ReceiptView, Sale, SalePreview, SaleRecord};
use merceria_db::{CommittedSale, SaleRequest, SalesStats, StatsOverview, TopProduct};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Page;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated cashier's id.
pub const CASHIER_HEADER: &str = "x-cashier-id";

/// Cashier identity, set by the authentication proxy in front of us.
#[derive(Debug, Clone, Copy)]
pub struct CashierId(pub i64);

impl<S> FromRequestParts<S> for CashierId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CASHIER_HEADER)
            .ok_or_else(|| ApiError::validation("X-Cashier-Id header is required"))?;

        let id = raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| ApiError::validation("X-Cashier-Id must be an integer"))?;

        validate_id("X-Cashier-Id", id)?;
        Ok(CashierId(id))
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
pub struct Range {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top")]
    pub limit: i64,
}

fn default_top() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub overview: StatsOverview,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SalesStats>,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub sales: Vec<Sale>,
    pub stats: SalesStats,
}

pub async fn preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<SalePreview>, ApiError> {
    debug!(lines = req.items.len(), "preview");
    Ok(Json(state.coordinator.preview(&req.items).await?))
}

pub async fn commit(
    State(state): State<AppState>,
    CashierId(cashier_id): CashierId,
    Json(req): Json<SaleRequest>,
) -> Result<(StatusCode, Json<CommittedSale>), ApiError> {
    debug!(cashier_id, lines = req.items.len(), "commit");
    let committed = state.coordinator.commit(&req, cashier_id).await?;
    Ok((StatusCode::CREATED, Json(committed)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    Ok(Json(state.db.sales().list(page.limit, page.offset).await?))
}

pub async fn today(State(state): State<AppState>) -> Result<Json<TodayResponse>, ApiError> {
    let sales = state.db.sales();
    Ok(Json(TodayResponse {
        sales: sales.list_today().await?,
        stats: sales.stats_today().await?,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    let sales = state.db.sales();
    let range = match (query.start, query.end) {
        (None, None) => None,
        (Some(start), Some(end)) => Some(sales.stats_between(start, end).await?),
        _ => return Err(ApiError::validation("start and end must be given together")),
    };
    Ok(Json(StatsResponse {
        overview: sales.overview().await?,
        range,
    }))
}

pub async fn top_products(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<TopProduct>>, ApiError> {
    Ok(Json(state.db.sales().top_products(query.limit).await?))
}

pub async fn range(
    State(state): State<AppState>,
    Query(range): Query<Range>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    Ok(Json(state.db.sales().list_between(range.start, range.end).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SaleRecord>, ApiError> {
    Ok(Json(state.coordinator.get_sale(id).await?))
}

pub async fn receipt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReceiptView>, ApiError> {
    let record = state.coordinator.get_sale(id).await?;
    Ok(Json(ReceiptView::from(&record)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SaleRecord>, ApiError> {
    Ok(Json(state.coordinator.cancel(id).await?))
}

//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Router                                                                │
//! │  ├── /health                  liveness + database ping                 │
//! │  ├── /api/sales/...           sales::*     (coordinator, sale store)   │
//! │  └── /api/products/...        products::*  (catalog, code, ledger)     │
//! │                                                                         │
//! │  Layers: TraceLayer (request span with request_id) → CorsLayer         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod products;
pub mod sales;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::state::AppState;

/// `?limit&offset` paging for list endpoints.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

pub(crate) fn default_limit() -> i64 {
    50
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Sales
        .route("/sales", post(sales::commit).get(sales::list))
        .route("/sales/preview", post(sales::preview))
        .route("/sales/today", get(sales::today))
        .route("/sales/stats", get(sales::stats))
        .route("/sales/top-products", get(sales::top_products))
        .route("/sales/range", get(sales::range))
        .route("/sales/{id}", get(sales::get).delete(sales::cancel))
        .route("/sales/{id}/receipt", get(sales::receipt))
        // Products
        .route("/products", get(products::list))
        .route("/products/low-stock", get(products::low_stock))
        .route("/products/code/{code}", get(products::get_by_code))
        .route("/products/{id}", get(products::get))
        .route("/products/{id}/stock", patch(products::adjust_stock));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
            )
        }))
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": true })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": false })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::http::{header, Method};
    use merceria_core::{UnitOfMeasure, UserRole};
    use merceria_db::{Database, DbConfig, NewProduct, NewUser};
    use tower::ServiceExt;

    struct Fixture {
        app: Router,
        product_id: i64,
        cashier_id: i64,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct {
                code: "A".to_string(),
                name: "Boton nacar".to_string(),
                description: None,
                unit: UnitOfMeasure::Unit,
                stock_milli: 5000,
                price_cents: 1000,
            })
            .await
            .unwrap();
        let cashier = db
            .users()
            .insert(&NewUser {
                username: "caja1".to_string(),
                full_name: "Caja Uno".to_string(),
                role: UserRole::Cashier,
            })
            .await
            .unwrap();
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        Fixture {
            app: router(AppState::new(db, &config)),
            product_id: product.id,
            cashier_id: cashier.id,
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, cashier: Option<i64>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = cashier {
            builder = builder.header(sales::CASHIER_HEADER, id.to_string());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let fx = fixture().await;
        let (status, body) = send(&fx.app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_commit_then_sold_out() {
        let fx = fixture().await;
        let cart = json!({ "items": [{ "product_id": fx.product_id, "quantity": 5 }] });

        let (status, body) = send(
            &fx.app,
            json_request(Method::POST, "/api/sales", Some(fx.cashier_id), cart.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["total_cents"], 5000);
        assert_eq!(body["subtotal_cents"], 4237);
        assert_eq!(body["tax_cents"], 763);
        assert_eq!(body["payment_method"], "cash");

        let (status, body) = send(
            &fx.app,
            json_request(Method::POST, "/api/sales", Some(fx.cashier_id), cart),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["details"][0]["requested_milli"], 5000);
        assert_eq!(body["details"][0]["available_milli"], 0);
    }

    #[tokio::test]
    async fn test_commit_requires_cashier_header() {
        let fx = fixture().await;
        let cart = json!({ "items": [{ "product_id": fx.product_id, "quantity": 1 }] });
        let (status, body) = send(&fx.app, json_request(Method::POST, "/api/sales", None, cart)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_preview_reports_cart_violations() {
        let fx = fixture().await;
        let cart = json!({ "items": [
            { "product_id": fx.product_id, "quantity": 0 },
            { "product_id": 999, "quantity": 1 }
        ] });
        let (status, body) = send(&fx.app, json_request(Method::POST, "/api/sales/preview", None, cart)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "CART_INVALID");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_receipt_and_cancel() {
        let fx = fixture().await;
        let cart = json!({
            "items": [{ "product_id": fx.product_id, "quantity": 2, "override_price": 7.5 }],
            "payment_method": "card",
            "notes": "cliente frecuente"
        });
        let (_, body) = send(
            &fx.app,
            json_request(Method::POST, "/api/sales", Some(fx.cashier_id), cart),
        )
        .await;
        let id = body["id"].as_i64().unwrap();

        let (status, receipt) = send(&fx.app, get_request(&format!("/api/sales/{id}/receipt"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["total"], 1500);
        assert_eq!(receipt["line_items"][0]["was_override"], true);
        assert_eq!(receipt["notes"], "cliente frecuente");

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/sales/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&fx.app, delete).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&fx.app, get_request(&format!("/api/sales/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (_, product) = send(&fx.app, get_request(&format!("/api/products/{}", fx.product_id))).await;
        assert_eq!(product["stock_milli"], 5000);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let fx = fixture().await;
        let uri = format!("/api/products/{}/stock", fx.product_id);

        let (status, body) = send(
            &fx.app,
            json_request(Method::PATCH, &uri, None, json!({ "delta": -2, "reason": "rotura" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["previous_milli"], 5000);
        assert_eq!(body["current_milli"], 3000);

        let (status, body) = send(
            &fx.app,
            json_request(Method::PATCH, &uri, None, json!({ "delta": -10, "reason": "conteo" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let (status, _) = send(
            &fx.app,
            json_request(Method::PATCH, &uri, None, json!({ "delta": 0.5, "reason": "conteo" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, low) = send(&fx.app, get_request("/api/products/low-stock")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(low.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_product_by_code() {
        let fx = fixture().await;
        let (status, body) = send(&fx.app, get_request("/api/products/code/A")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], fx.product_id);

        let (status, body) = send(&fx.app, get_request("/api/products/code/ZZZ")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_stock_inputs_beyond_range_are_rejected() {
        let fx = fixture().await;
        let uri = format!("/api/products/{}/stock", fx.product_id);

        let (status, body) = send(
            &fx.app,
            json_request(Method::PATCH, &uri, None, json!({ "delta": 9223372036854775_i64, "reason": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, product) = send(&fx.app, get_request(&format!("/api/products/{}", fx.product_id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(product["stock_milli"], 5000);

        let (status, body) = send(
            &fx.app,
            get_request("/api/products/low-stock?threshold=9223372036854775807"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(&fx.app, get_request("/api/products/low-stock?threshold=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reports() {
        let fx = fixture().await;
        let cart = json!({ "items": [{ "product_id": fx.product_id, "quantity": 1 }] });
        send(&fx.app, json_request(Method::POST, "/api/sales", Some(fx.cashier_id), cart)).await;

        let (status, today) = send(&fx.app, get_request("/api/sales/today")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(today["stats"]["count"], 1);

        let (_, stats) = send(&fx.app, get_request("/api/sales/stats")).await;
        assert_eq!(stats["general"]["revenue_cents"], 1000);
        assert_eq!(stats["today"]["count"], 1);
        assert_eq!(stats["month"]["count"], 1);
        assert!(stats.get("range").is_none());

        let (status, ranged) = send(
            &fx.app,
            get_request("/api/sales/stats?start=2000-01-01T00:00:00Z&end=2000-02-01T00:00:00Z"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ranged["range"]["count"], 0);

        let (_, top) = send(&fx.app, get_request("/api/sales/top-products?limit=5")).await;
        assert_eq!(top[0]["code"], "A");

        let (status, _) = send(
            &fx.app,
            get_request("/api/sales/range?start=2026-01-02T00:00:00Z&end=2026-01-01T00:00:00Z"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

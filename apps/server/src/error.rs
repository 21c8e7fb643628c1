//! # API Error Type
//!
//! What a client sees when a request fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler returns Result<Json<T>, ApiError>                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ServiceError::Core(CartInvalid)        ──► 400 CART_INVALID           │
//! │  ServiceError::Core(InsufficientStock)  ──► 409 INSUFFICIENT_STOCK     │
//! │  ServiceError::Core(*NotFound)          ──► 404 NOT_FOUND              │
//! │  ServiceError::Core(Validation)         ──► 400 VALIDATION_ERROR       │
//! │  ServiceError::Persistence(transient)   ──► 503 DATABASE_ERROR         │
//! │  ServiceError::Persistence(other)       ──► 500 INTERNAL               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart and stock failures carry their full violation list in `details`.
//! Infrastructure failures are logged; their text only reaches the client
//! when [`expose_internal_details`] was switched on at startup.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use merceria_core::{CoreError, ValidationError};
use merceria_db::{DbError, ServiceError};
use serde::Serialize;
use serde_json::Value;

static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Development switch: include internal error text in responses.
pub fn expose_internal_details(expose: bool) {
    EXPOSE_DETAILS.store(expose, Ordering::Relaxed);
}

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for 1 product(s)",
///   "details": [{ "product_id": 1, "code": "A", "requested_milli": 5000, "available_milli": 0 }]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    #[serde(skip)]
    internal: Option<String>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Cart failed structural validation (400)
    CartInvalid,

    /// Not enough stock for one or more lines (409)
    InsufficientStock,

    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Storage temporarily unavailable (503)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::CartInvalid => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
            internal: None,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    fn with_internal(mut self, internal: impl ToString) -> Self {
        self.internal = Some(internal.to_string());
        self
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::CartInvalid { violations } => {
                ApiError::new(ErrorCode::CartInvalid, message).with_details(violations)
            }
            CoreError::InsufficientStock { shortages } => {
                let lines: Vec<String> = shortages.iter().map(ToString::to_string).collect();
                ApiError::new(ErrorCode::InsufficientStock, lines.join("; ")).with_details(shortages)
            }
            CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) | CoreError::UserNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, message)
            }
            CoreError::Validation(err) => err.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::validation(err.to_string()),
            _ if err.is_transient() => {
                ApiError::new(ErrorCode::DatabaseError, "Database temporarily unavailable")
                    .with_internal(&err)
            }
            _ => ApiError::new(ErrorCode::Internal, "Database operation failed").with_internal(&err),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(err) => err.into(),
            ServiceError::Persistence(err) => err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(mut self) -> Response {
        let status = self.code.status();

        if let Some(internal) = self.internal.take() {
            tracing::error!(code = ?self.code, error = %internal, "Request failed");
            if EXPOSE_DETAILS.load(Ordering::Relaxed) {
                self.details = Some(Value::String(internal));
            }
        } else if status.is_client_error() {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        }

        (status, Json(self)).into_response()
    }
}

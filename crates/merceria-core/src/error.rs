//! # Error Types
//!
//! Domain-specific error types for merceria-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  merceria-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule failures (client fault)          │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  merceria-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError from store operations      │
//! │                                                                         │
//! │  HTTP errors (in apps/server)                                          │
//! │  └── ApiError         - What the browser sees (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Cart failures carry every offending line, not just the first
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::cart::{LineViolation, StockShortage};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is a client fault: retrying the same request without
/// changing it cannot succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The cart failed structural validation.
    ///
    /// ## When This Occurs
    /// - Empty cart
    /// - Quantity not positive, or fractional for counted units
    /// - Override price not positive
    /// - Product missing or deactivated
    #[error("Cart is invalid: {} problem(s)", violations.len())]
    CartInvalid { violations: Vec<LineViolation> },

    /// One or more lines ask for more than is on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Commit cart [{A, qty: 5}]
    ///      │
    ///      ▼
    /// Ledger: stock(A) = 0
    ///      │
    ///      ▼
    /// InsufficientStock { shortages: [{A, requested: 5, available: 0}] }
    ///      │
    ///      ▼
    /// UI shows: "A: requested 5, available 0"
    /// ```
    #[error("Insufficient stock for {} product(s)", shortages.len())]
    InsufficientStock { shortages: Vec<StockShortage> },

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// User does not exist or is deactivated.
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the NotFound family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) | CoreError::UserNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., too many decimals, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate product code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

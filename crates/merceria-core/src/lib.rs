//! # merceria-core: Pure Business Logic for Merceria POS
//!
//! This crate holds the sale rules of the shop as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Merceria POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Browser pages (sale screen, admin)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        merceria-db: Sale Coordinator, Inventory Ledger          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ merceria-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  money    │  │   cart    │  │  pricing  │  │   │
//! │  │   │  Product  │  │ quantity  │  │ validate  │  │ line/tax  │  │   │
//! │  │   │   Sale    │  │           │  │ aggregate │  │  split    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, units, payment methods)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Fixed-point quantities in thousandths of a unit
//! - [`pricing`] - Line subtotal, cart total, tax split
//! - [`cart`] - Cart value objects and validation
//! - [`receipt`] - Outbound view consumed by receipt generators
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level rules
//!
//! ## Example Usage
//!
//! ```rust
//! use merceria_core::money::Money;
//! use merceria_core::pricing::split_tax;
//! use merceria_core::types::TaxRate;
//!
//! // Prices are tax-inclusive: S/ 50.00 contains S/ 7.63 of IGV.
//! let split = split_tax(Money::from_cents(5000), TaxRate::default());
//! assert_eq!(split.subtotal.cents(), 4237);
//! assert_eq!(split.tax.cents(), 763);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod quantity;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartItem, LineViolation, SalePreview, StockShortage, ViolationReason};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use receipt::{ReceiptLine, ReceiptView};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// IGV (Peruvian VAT) in basis points.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1800;

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 50;

/// Maximum quantity of a single line, in whole units.
///
/// Catches typos like 1000 instead of 10 before they reach the ledger.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

/// Highest accepted unit price (S/ 1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest stock a product can hold, in whole units.
pub const MAX_STOCK_UNITS: i64 = 1_000_000_000;

/// [`MAX_STOCK_UNITS`] in milli-units; also the largest accepted adjustment.
pub const MAX_STOCK_MILLI: i64 = MAX_STOCK_UNITS * quantity::MILLI_PER_UNIT;

/// Maximum length of free-text sale notes.
pub const MAX_NOTES_LEN: usize = 500;

/// Default threshold for the low-stock report, in whole units.
pub const DEFAULT_LOW_STOCK_UNITS: i64 = 10;

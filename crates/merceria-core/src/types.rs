//! # Domain Types
//!
//! Core domain types used throughout Merceria POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  sale_id (FK)   │       │
//! │  │  code (unique)  │   │  total_cents    │   │  product_id     │       │
//! │  │  unit           │   │  subtotal_cents │   │  *_snapshot     │       │
//! │  │  stock_milli    │   │  tax_cents      │   │  quantity_milli │       │
//! │  │  price_cents    │   │  cashier_id     │   │  was_override   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ UnitOfMeasure   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Meter          │   │  Cash           │       │
//! │  │  1800 = 18%     │   │  Centimeter     │   │  WalletTransfer │       │
//! │  └─────────────────┘   │  Unit / Dozen   │   │  BankTransfer   │       │
//! │                        │  Other          │   │  Card           │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A sale line freezes the product's code, name, unit and the price actually
//! charged. Editing or deactivating the product later never alters history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (Peruvian IGV)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Basis points in 100%.
    pub const FULL_BPS: u32 = 10_000;

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Defaults to the IGV rate.
impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Unit of Measure
// =============================================================================

/// How a product is measured and sold.
///
/// Length units accept fractional quantities (1.5 m of ribbon); counted
/// units only accept whole numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnitOfMeasure {
    Meter,
    Centimeter,
    Unit,
    Dozen,
    Other,
}

impl UnitOfMeasure {
    /// Whether quantities in this unit must be whole numbers.
    #[inline]
    pub const fn requires_integral(&self) -> bool {
        matches!(self, UnitOfMeasure::Unit | UnitOfMeasure::Dozen)
    }

    /// Short label printed next to quantities on receipts.
    pub const fn abbreviation(&self) -> &'static str {
        match self {
            UnitOfMeasure::Meter => "m",
            UnitOfMeasure::Centimeter => "cm",
            UnitOfMeasure::Unit => "und",
            UnitOfMeasure::Dozen => "doc",
            UnitOfMeasure::Other => "",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            UnitOfMeasure::Meter => "meter",
            UnitOfMeasure::Centimeter => "centimeter",
            UnitOfMeasure::Unit => "unit",
            UnitOfMeasure::Dozen => "dozen",
            UnitOfMeasure::Other => "other",
        }
    }
}

impl Default for UnitOfMeasure {
    fn default() -> Self {
        UnitOfMeasure::Unit
    }
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Mobile wallet transfer (Yape, Plin).
    WalletTransfer,
    /// Bank transfer.
    BankTransfer,
    /// Card payment on external terminal.
    Card,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::WalletTransfer => "wallet_transfer",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Business identifier, unique across the catalog.
    pub code: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub description: Option<String>,

    pub unit: UnitOfMeasure,

    /// Current stock in thousandths of `unit`. Never negative.
    pub stock_milli: i64,

    /// Tax-inclusive catalog price per unit, in cents.
    pub price_cents: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn stock(&self) -> Quantity {
        Quantity::from_milli(self.stock_milli)
    }

    /// Checks if `quantity` can be taken from the shelf right now.
    ///
    /// Informational only: the ledger re-checks at write time.
    pub fn can_sell(&self, quantity: Quantity) -> bool {
        self.is_active && self.stock_milli >= quantity.milli()
    }
}

// =============================================================================
// User
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Cashier,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Cashier
    }
}

/// A staff account. Credentials live with the upstream auth service.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale State
// =============================================================================

/// Lifecycle of a sale inside the coordinator.
///
/// ```text
///   Draft ──► Validating ──► Committed ──► Cancelled
///                  │
///                  └──────► Rejected
/// ```
///
/// Only `Committed` sales are ever persisted. `Cancelled` is reached by
/// removing the sale, so it is never observed in storage either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    Draft,
    Validating,
    Committed,
    Rejected,
    Cancelled,
}

impl SaleState {
    pub const fn can_transition_to(&self, next: SaleState) -> bool {
        matches!(
            (self, next),
            (SaleState::Draft, SaleState::Validating)
                | (SaleState::Validating, SaleState::Committed)
                | (SaleState::Validating, SaleState::Rejected)
                | (SaleState::Committed, SaleState::Cancelled)
        )
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            SaleState::Rejected | SaleState::Cancelled
        )
    }
}

impl Default for SaleState {
    fn default() -> Self {
        SaleState::Draft
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale.
///
/// `total_cents == subtotal_cents + tax_cents` and `total_cents` equals the
/// sum of its items' `line_subtotal_cents`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Tax-inclusive total.
    pub total_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub cashier_id: i64,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// Product code at time of sale (frozen).
    pub code_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit of measure at time of sale (frozen).
    pub unit_snapshot: UnitOfMeasure,
    pub quantity_milli: i64,
    /// Price actually charged per unit.
    pub unit_price_cents: i64,
    pub line_subtotal_cents: i64,
    /// Charged price came from an override rather than the catalog.
    pub was_override: bool,
}

impl SaleItem {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }
}

/// A sale together with its line items, as returned by commit and lookups.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

impl SaleRecord {
    /// Sum of line subtotals; equals `sale.total()` for every stored sale.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(SaleItem::line_subtotal).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

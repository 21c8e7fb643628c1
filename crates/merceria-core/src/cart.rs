//! # Cart Module
//!
//! The cart is an explicit value passed into preview and commit. Nothing
//! about it lives in process-wide state.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Vec<CartItem>          raw client input (decimals)                     │
//! │       │                                                                 │
//! │       ▼  validate_cart(items, catalog)                                  │
//! │  Vec<ValidatedLine>     exact Quantity / Money, product snapshot        │
//! │       │                 or CartInvalid { every violation }              │
//! │       ▼  price_lines(lines, tax_rate)                                   │
//! │  SalePreview            priced lines, total, subtotal, tax              │
//! │       │                                                                 │
//! │       ▼  aggregate_quantities(lines)                                    │
//! │  BTreeMap<id, Quantity> what the ledger must be able to supply          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;
use crate::pricing::{cart_total, effective_unit_price, line_subtotal, split_tax};
use crate::quantity::Quantity;
use crate::types::{Product, TaxRate, UnitOfMeasure};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

// =============================================================================
// Inbound Cart
// =============================================================================

/// One line of a submitted cart.
///
/// `override_price` is the explicit optional price; whether the line is an
/// override is derived from its presence, never from comparing prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: i64,
    #[ts(type = "number")]
    pub quantity: Decimal,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub override_price: Option<Decimal>,
}

impl CartItem {
    pub fn new(product_id: i64, quantity: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            override_price: None,
        }
    }

    pub fn with_override(mut self, price: Decimal) -> Self {
        self.override_price = Some(price);
        self
    }
}

// =============================================================================
// Violations
// =============================================================================

/// Why a cart or one of its lines was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationReason {
    EmptyCart,
    TooManyLines { max: usize },
    InvalidProductId,
    NonPositiveQuantity,
    /// Finer than a thousandth of a unit.
    QuantityTooPrecise,
    QuantityTooLarge { max: i64 },
    /// Counted goods sold in fractions.
    NonIntegralQuantity { unit: UnitOfMeasure },
    NonPositiveOverride,
    /// Override price with sub-cent digits.
    OverrideTooPrecise,
    OverrideTooLarge { max_cents: i64 },
    ProductNotFound,
    ProductInactive,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::EmptyCart => write!(f, "cart is empty"),
            ViolationReason::TooManyLines { max } => {
                write!(f, "cart cannot have more than {max} lines")
            }
            ViolationReason::InvalidProductId => write!(f, "product id must be positive"),
            ViolationReason::NonPositiveQuantity => write!(f, "quantity must be greater than 0"),
            ViolationReason::QuantityTooPrecise => {
                write!(f, "quantity allows at most 3 decimal places")
            }
            ViolationReason::QuantityTooLarge { max } => {
                write!(f, "quantity cannot exceed {max}")
            }
            ViolationReason::NonIntegralQuantity { unit } => {
                write!(f, "quantity must be a whole number for unit '{unit}'")
            }
            ViolationReason::NonPositiveOverride => {
                write!(f, "override price must be greater than 0")
            }
            ViolationReason::OverrideTooPrecise => {
                write!(f, "override price allows at most 2 decimal places")
            }
            ViolationReason::OverrideTooLarge { max_cents } => {
                write!(f, "override price cannot exceed {}", Money::from_cents(*max_cents))
            }
            ViolationReason::ProductNotFound => write!(f, "product does not exist"),
            ViolationReason::ProductInactive => write!(f, "product is not active"),
        }
    }
}

/// A single problem found while validating a cart.
///
/// `line` is the zero-based position in the submitted cart; `None` for
/// problems with the cart as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineViolation {
    pub line: Option<usize>,
    pub product_id: Option<i64>,
    pub reason: ViolationReason,
}

impl LineViolation {
    pub fn cart(reason: ViolationReason) -> Self {
        Self {
            line: None,
            product_id: None,
            reason,
        }
    }

    pub fn line(line: usize, product_id: i64, reason: ViolationReason) -> Self {
        Self {
            line: Some(line),
            product_id: Some(product_id),
            reason,
        }
    }
}

impl fmt::Display for LineViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line + 1, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// A product the shelf cannot supply in the requested amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockShortage {
    pub product_id: i64,
    pub code: String,
    pub requested_milli: i64,
    pub available_milli: i64,
}

impl StockShortage {
    pub fn requested(&self) -> Quantity {
        Quantity::from_milli(self.requested_milli)
    }

    pub fn available(&self) -> Quantity {
        Quantity::from_milli(self.available_milli)
    }
}

impl fmt::Display for StockShortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: requested {}, available {}",
            self.code,
            self.requested(),
            self.available()
        )
    }
}

// =============================================================================
// Validation
// =============================================================================

/// A cart line that passed structural validation.
#[derive(Debug, Clone)]
pub struct ValidatedLine {
    pub line: usize,
    pub product: Product,
    pub quantity: Quantity,
    pub override_price: Option<Money>,
}

/// Validates every line against the catalog snapshot in `catalog`.
///
/// All violations are collected before failing so the caller can show them
/// together. Stock is not looked at here.
pub fn validate_cart(
    items: &[CartItem],
    catalog: &HashMap<i64, Product>,
) -> Result<Vec<ValidatedLine>, CoreError> {
    let mut violations = Vec::new();

    if items.is_empty() {
        violations.push(LineViolation::cart(ViolationReason::EmptyCart));
    }
    if items.len() > MAX_CART_ITEMS {
        violations.push(LineViolation::cart(ViolationReason::TooManyLines {
            max: MAX_CART_ITEMS,
        }));
    }

    let mut validated = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let before = violations.len();
        let mut reject =
            |reason| violations.push(LineViolation::line(index, item.product_id, reason));

        if item.product_id <= 0 {
            reject(ViolationReason::InvalidProductId);
        }

        let quantity = match parse_quantity(item.quantity) {
            Ok(quantity) => Some(quantity),
            Err(reason) => {
                reject(reason);
                None
            }
        };

        let override_price = match item.override_price.map(parse_override) {
            None => None,
            Some(Ok(price)) => Some(price),
            Some(Err(reason)) => {
                reject(reason);
                None
            }
        };

        let product = match catalog.get(&item.product_id) {
            None if item.product_id > 0 => {
                reject(ViolationReason::ProductNotFound);
                None
            }
            None => None,
            Some(product) if !product.is_active => {
                reject(ViolationReason::ProductInactive);
                None
            }
            Some(product) => Some(product),
        };

        if let (Some(product), Some(quantity)) = (product, quantity) {
            if product.unit.requires_integral() && !quantity.is_integral() {
                reject(ViolationReason::NonIntegralQuantity { unit: product.unit });
            }
        }

        if violations.len() == before {
            if let (Some(product), Some(quantity)) = (product, quantity) {
                validated.push(ValidatedLine {
                    line: index,
                    product: product.clone(),
                    quantity,
                    override_price,
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(validated)
    } else {
        Err(CoreError::CartInvalid { violations })
    }
}

fn parse_quantity(raw: Decimal) -> Result<Quantity, ViolationReason> {
    if raw <= Decimal::ZERO {
        return Err(ViolationReason::NonPositiveQuantity);
    }
    let quantity = Quantity::from_decimal(raw).ok_or(ViolationReason::QuantityTooPrecise)?;
    if quantity > Quantity::from_units(MAX_ITEM_QUANTITY) {
        return Err(ViolationReason::QuantityTooLarge {
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(quantity)
}

fn parse_override(raw: Decimal) -> Result<Money, ViolationReason> {
    if raw <= Decimal::ZERO {
        return Err(ViolationReason::NonPositiveOverride);
    }
    let price = Money::from_decimal(raw).ok_or(ViolationReason::OverrideTooPrecise)?;
    if price.cents() > MAX_PRICE_CENTS {
        return Err(ViolationReason::OverrideTooLarge {
            max_cents: MAX_PRICE_CENTS,
        });
    }
    Ok(price)
}

// =============================================================================
// Pricing
// =============================================================================

/// A validated line with its charged price and rounded subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub product_id: i64,
    pub code: String,
    pub name: String,
    pub unit: UnitOfMeasure,
    pub quantity_milli: i64,
    /// Catalog price at pricing time.
    pub catalog_price_cents: i64,
    /// Price actually charged.
    pub unit_price_cents: i64,
    pub line_subtotal_cents: i64,
    pub was_override: bool,
}

impl PricedLine {
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }
}

/// Projected sale amounts. Returned by preview and reused by commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalePreview {
    pub lines: Vec<PricedLine>,
    pub total_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Number of cart lines.
    pub line_count: usize,
    /// Sum of all line quantities, in milli-units.
    pub quantity_total_milli: i64,
}

impl SalePreview {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Prices validated lines and splits the total.
pub fn price_lines(lines: &[ValidatedLine], tax_rate: TaxRate) -> SalePreview {
    let priced: Vec<PricedLine> = lines
        .iter()
        .map(|line| {
            let (unit_price, was_override) =
                effective_unit_price(line.product.price(), line.override_price);
            PricedLine {
                product_id: line.product.id,
                code: line.product.code.clone(),
                name: line.product.name.clone(),
                unit: line.product.unit,
                quantity_milli: line.quantity.milli(),
                catalog_price_cents: line.product.price_cents,
                unit_price_cents: unit_price.cents(),
                line_subtotal_cents: line_subtotal(line.quantity, unit_price).cents(),
                was_override,
            }
        })
        .collect();

    let total = cart_total(priced.iter().map(PricedLine::line_subtotal));
    let split = split_tax(total, tax_rate);

    SalePreview {
        line_count: priced.len(),
        quantity_total_milli: priced.iter().map(|l| l.quantity_milli).sum(),
        lines: priced,
        total_cents: total.cents(),
        subtotal_cents: split.subtotal.cents(),
        tax_cents: split.tax.cents(),
    }
}

/// Total requested quantity per product, ordered by product id.
///
/// The same product may appear on several lines; stock is checked against
/// the sum.
pub fn aggregate_quantities(lines: &[ValidatedLine]) -> BTreeMap<i64, Quantity> {
    let mut totals = BTreeMap::new();
    for line in lines {
        *totals.entry(line.product.id).or_insert_with(Quantity::zero) += line.quantity;
    }
    totals
}

// =============================================================================
// Unit Tests
// =============================================================================

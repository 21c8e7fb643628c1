//! # Pricing Calculator
//!
//! Pure functions for line subtotals, cart totals and the IGV split.
//!
//! ## Rounding Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Each line is rounded ONCE, half away from zero, to whole cents.    │
//! │       1.5 m × S/ 3.33 = 4.995  →  S/ 5.00                              │
//! │                                                                         │
//! │  2. The cart total is the plain sum of rounded lines.                  │
//! │       No second rounding, so total == Σ lines always holds.            │
//! │                                                                         │
//! │  3. Prices are tax-inclusive. Tax is derived backward:                 │
//! │       subtotal = round(total / (1 + rate))                             │
//! │       tax      = total - subtotal      (remainder, never rounded)      │
//! │       S/ 50.00 @ 18%  →  subtotal S/ 42.37 + tax S/ 7.63               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{div_round_half_away, Money};
use crate::quantity::{Quantity, MILLI_PER_UNIT};
use crate::types::TaxRate;

/// Result of splitting a tax-inclusive total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxSplit {
    pub subtotal: Money,
    pub tax: Money,
}

impl TaxSplit {
    /// Always equal to the total that was split.
    #[inline]
    pub fn total(&self) -> Money {
        self.subtotal + self.tax
    }
}

/// `quantity × unit_price`, rounded half away from zero to whole cents.
///
/// ## Example
/// ```rust
/// use merceria_core::money::Money;
/// use merceria_core::pricing::line_subtotal;
/// use merceria_core::quantity::Quantity;
///
/// let line = line_subtotal(Quantity::from_milli(1500), Money::from_cents(333));
/// assert_eq!(line.cents(), 500);
/// ```
pub fn line_subtotal(quantity: Quantity, unit_price: Money) -> Money {
    let raw = quantity.milli() as i128 * unit_price.cents() as i128;
    let cents = div_round_half_away(raw, MILLI_PER_UNIT as i128);
    Money::from_cents(cents as i64)
}

/// Sum of already-rounded line subtotals.
pub fn cart_total<I>(lines: I) -> Money
where
    I: IntoIterator<Item = Money>,
{
    lines.into_iter().sum()
}

/// Splits a tax-inclusive total into tax-exclusive subtotal and tax.
///
/// `subtotal + tax == total` for every input because the tax is the
/// remainder rather than an independently rounded amount.
pub fn split_tax(total: Money, rate: TaxRate) -> TaxSplit {
    let denominator = (TaxRate::FULL_BPS + rate.bps()) as i128;
    let subtotal = div_round_half_away(
        total.cents() as i128 * TaxRate::FULL_BPS as i128,
        denominator,
    ) as i64;
    let subtotal = Money::from_cents(subtotal);

    TaxSplit {
        subtotal,
        tax: total - subtotal,
    }
}

/// Price charged for a line and whether it came from an override.
///
/// A non-positive override is ignored here; cart validation rejects it
/// before pricing ever runs.
pub fn effective_unit_price(catalog_price: Money, override_price: Option<Money>) -> (Money, bool) {
    match override_price {
        Some(price) if price.is_positive() => (price, true),
        _ => (catalog_price, false),
    }
}

/// Change to hand back for a cash payment.
pub fn change_due(total: Money, tendered: Money) -> Result<Money, ValidationError> {
    if tendered < total {
        return Err(ValidationError::OutOfRange {
            field: "tendered".to_string(),
            min: total.cents(),
            max: i64::MAX,
        });
    }
    Ok(tendered - total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IGV: TaxRate = TaxRate::from_bps(1800);

    #[test]
    fn test_line_subtotal_rounds_half_away() {
        // 1.5 × 3.33 = 4.995
        assert_eq!(
            line_subtotal(Quantity::from_milli(1500), Money::from_cents(333)).cents(),
            500
        );
        // 0.125 × 0.10 = 0.0125
        assert_eq!(
            line_subtotal(Quantity::from_milli(125), Money::from_cents(10)).cents(),
            1
        );
        // 0.001 × 4.99 = 0.00499
        assert_eq!(
            line_subtotal(Quantity::from_milli(1), Money::from_cents(499)).cents(),
            0
        );
        assert_eq!(
            line_subtotal(Quantity::from_units(5), Money::from_cents(1000)).cents(),
            5000
        );
    }

    #[test]
    fn test_cart_total_equals_sum_of_lines() {
        let lines = vec![
            line_subtotal(Quantity::from_milli(1500), Money::from_cents(333)),
            line_subtotal(Quantity::from_milli(2250), Money::from_cents(199)),
            line_subtotal(Quantity::from_units(3), Money::from_cents(1)),
        ];
        let expected: i64 = lines.iter().map(Money::cents).sum();
        assert_eq!(cart_total(lines).cents(), expected);
    }

    #[test]
    fn test_split_tax_fifty_soles() {
        let split = split_tax(Money::from_cents(5000), IGV);
        assert_eq!(split.subtotal.cents(), 4237);
        assert_eq!(split.tax.cents(), 763);
    }

    #[test]
    fn test_split_tax_round_trip() {
        for cents in (0..20_000).chain([999_999, 1_000_000, 123_456_789]) {
            let total = Money::from_cents(cents);
            let split = split_tax(total, IGV);
            assert_eq!(split.total(), total, "total {cents}");
            assert!(!split.tax.is_negative());
        }
    }

    #[test]
    fn test_split_tax_zero_rate() {
        let split = split_tax(Money::from_cents(1234), TaxRate::zero());
        assert_eq!(split.subtotal.cents(), 1234);
        assert!(split.tax.is_zero());
    }

    #[test]
    fn test_effective_unit_price() {
        let catalog = Money::from_cents(2000);
        assert_eq!(
            effective_unit_price(catalog, Some(Money::from_cents(1500))),
            (Money::from_cents(1500), true)
        );
        assert_eq!(effective_unit_price(catalog, None), (catalog, false));
        assert_eq!(effective_unit_price(catalog, Some(Money::zero())), (catalog, false));
    }

    #[test]
    fn test_change_due() {
        let total = Money::from_cents(4250);
        assert_eq!(change_due(total, Money::from_cents(5000)).unwrap().cents(), 750);
        assert!(change_due(total, total).unwrap().is_zero());
        assert!(change_due(total, Money::from_cents(4000)).is_err());
    }
}

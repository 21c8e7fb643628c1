//! # Quantity Module
//!
//! Fixed-point quantities in thousandths of a unit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1.5 metres of ribbon   →  Quantity(1500)                               │
//! │  3 dozen buttons        →  Quantity(3000)                               │
//! │  0.125 m of lace        →  Quantity(125)                                │
//! │  0.0005 m               →  rejected (finer than a thousandth)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is stored with the same scale (`stock_milli`) so that sale lines
//! and ledger deltas are plain integer additions.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// Number of milli-units in one whole unit.
pub const MILLI_PER_UNIT: i64 = 1000;

/// A quantity of product, in thousandths of its unit of measure.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Whole units, e.g. `Quantity::from_units(5)` is five pieces.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    /// Whole units, `None` when the result does not fit.
    #[inline]
    pub const fn checked_from_units(units: i64) -> Option<Self> {
        match units.checked_mul(MILLI_PER_UNIT) {
            Some(milli) => Some(Quantity(milli)),
            None => None,
        }
    }

    /// Exact conversion from a decimal. `None` if the value is finer than
    /// a thousandth or out of range.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let scaled = value.checked_mul(Decimal::from(MILLI_PER_UNIT))?;
        if !scaled.fract().is_zero() {
            return None;
        }
        scaled.to_i64().map(Quantity)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 3).normalize()
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// True when the quantity is a whole number of units.
    #[inline]
    pub const fn is_integral(&self) -> bool {
        self.0 % MILLI_PER_UNIT == 0
    }

    #[inline]
    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }
}

/// Prints without trailing zeros: `1.5`, `3`, `0.125`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

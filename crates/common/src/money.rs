//! Exact decimal money amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arithmetic on money left the storable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("money amount exceeds {}", Money::MAX)]
pub struct MoneyOverflow;

/// Money amount backed by an exact decimal.
///
/// Prices and totals never pass through floating point, so
/// `unit_price * quantity` summed over any number of lines is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Number of fractional digits a stored price may carry.
    pub const SCALE: u32 = 2;

    /// Largest storable amount, 9999999999999999.99 (`NUMERIC(18, 2)`).
    pub const MAX: Money = Money(Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 2));

    /// Wraps a decimal amount.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates an amount from minor units, e.g. `from_cents(1050)` is 10.50.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, Self::SCALE))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is larger than [`Money::MAX`].
    pub fn exceeds_max(&self) -> bool {
        self.0 > Self::MAX.0
    }

    /// Returns true if the amount carries more fractional digits than [`Money::SCALE`].
    pub fn exceeds_scale(&self) -> bool {
        self.0.normalize().scale() > Self::SCALE
    }

    /// Returns the amount with exactly [`Money::SCALE`] fractional digits.
    ///
    /// Digits beyond the scale are rounded, so check [`Money::exceeds_scale`]
    /// first where that matters.
    pub fn rescaled(&self) -> Money {
        let mut amount = self.0;
        amount.rescale(Self::SCALE);
        Money(amount)
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Result<Money, MoneyOverflow> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Money)
            .filter(|m| !m.exceeds_max())
            .ok_or(MoneyOverflow)
    }

    /// Adds two amounts.
    pub fn checked_add(self, rhs: Money) -> Result<Money, MoneyOverflow> {
        self.0
            .checked_add(rhs.0)
            .map(Money)
            .filter(|m| !m.exceeds_max())
            .ok_or(MoneyOverflow)
    }

    /// Sums amounts, failing on the first overflow.
    pub fn total(amounts: impl IntoIterator<Item = Money>) -> Result<Money, MoneyOverflow> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_negative() {
            write!(f, "-${:.2}", self.0.abs())
        } else {
            write!(f, "${:.2}", self.0)
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

//! Exact decimal money amounts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency amount backed by a fixed-point decimal.
///
/// Amounts always carry at least two fractional digits so that `10` and
/// `10.00` render identically; rescaling upwards never changes the value.
/// Arithmetic is exact and checked; nothing rounds unless
/// [`Money::round_to_cents`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

/// Minimum number of fractional digits carried by every amount.
pub const CURRENCY_SCALE: u32 = 2;

impl Money {
    /// Creates a money amount from a decimal value.
    pub fn new(amount: Decimal) -> Self {
        let mut amount = amount;
        if amount.scale() < CURRENCY_SCALE {
            amount.rescale(CURRENCY_SCALE);
        }
        Self(amount)
    }

    /// Creates a money amount from an integer number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, CURRENCY_SCALE))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount has digits below one cent.
    pub fn has_sub_cent_digits(&self) -> bool {
        self.0.normalize().scale() > CURRENCY_SCALE
    }

    /// Rounds to whole cents, half away from zero.
    pub fn round_to_cents(&self) -> Money {
        Money::new(
            self.0
                .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies by a quantity; `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money::new)
    }

    /// Adds two amounts; `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money::new)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! # Money
//!
//! Exact decimal amounts for cart pricing.
//!
//! ## Rounding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line discount % ──► cart discount % ──► tax % ──► grand total          │
//! │        exact               exact           exact        exact           │
//! │                                                           │             │
//! │                                              Money::rounded() (2 dp)    │
//! │                                                           ▼             │
//! │                                                    CheckoutPayload      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding each step would let the grand total drift by a cent against the
//! sum of its parts, so amounts stay exact until the payload is built.
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::Money;
//! use shopfront_core::types::Rate;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price * 3;                // 32.97
//! let tax = line.percent(Rate::from_percent(10)); // 3.297 (exact)
//! assert_eq!(tax.rounded().cents(), 330);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::types::Rate;

/// Decimal places kept when a value crosses the payload boundary.
pub const CURRENCY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount held as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Allows negative values for refunds and deltas
/// - **No implicit rounding**: arithmetic never loses precision
/// - **JSON number on the wire**: serialised as a float, parsed from either a
///   number or a numeric string (`"100.00"`)
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  CatalogItem.selling_price ──► CartLine.unit_price ──► line subtotal    │
/// │                                                                         │
/// │  Cart subtotal ──► discounts ──► tax ──► grand total ──► rounded()      │
/// │                                                          │              │
/// │                                                          ▼              │
/// │                                                  CheckoutPayload        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] Decimal);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CURRENCY_DECIMALS))
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money::from_cents(major * 100 - minor)
        } else {
            Money::from_cents(major * 100 + minor)
        }
    }

    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the value in cents after rounding to the currency precision.
    #[inline]
    pub fn cents(&self) -> i64 {
        let cents = self.rounded().0.saturating_mul(Decimal::ONE_HUNDRED);
        cents.to_i64().unwrap_or(if cents.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to the currency precision, midpoint away from zero.
    ///
    /// This is the single rounding point of the pricing pipeline.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let tax: Money = "0.825".parse().unwrap();
    /// assert_eq!(tax.rounded().cents(), 83);
    /// ```
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns `self × rate / 100` without rounding.
    ///
    /// ## User Workflow
    /// ```text
    /// Total after discounts: 171.00
    ///      │
    ///      ▼
    /// percent(10%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Tax: 17.10
    /// ```
    pub fn percent(&self, rate: Rate) -> Money {
        Money(self.0.saturating_mul(rate.value()) / Decimal::ONE_HUNDRED)
    }

    /// Multiplies money by a quantity, saturating at the decimal range.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(Decimal::from(qty)))
    }

    /// Bounds the value to `[0, ceiling]`.
    ///
    /// A negative ceiling yields zero.
    pub fn clamp_to(&self, ceiling: Money) -> Money {
        let ceiling = ceiling.max(Money::zero());
        (*self).max(Money::zero()).min(ceiling)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount at currency precision, without a symbol.
///
/// ## Note
/// Currency symbols and localisation belong to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded().0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Money)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.amount(), Decimal::new(1099, 2));
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(money("17.1").to_string(), "17.10");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percent_stays_exact() {
        // 10.99 × 8.25% = 0.9066750 exactly; nothing is rounded yet
        let tax = Money::from_cents(1099).percent(Rate::from_decimal(Decimal::new(825, 2)));
        assert_eq!(tax, money("0.906675"));
        assert_eq!(tax.rounded(), money("0.91"));
    }

    #[test]
    fn test_rounding_midpoint_away_from_zero() {
        assert_eq!(money("0.825").rounded().cents(), 83);
        assert_eq!(money("0.835").rounded().cents(), 84);
        assert_eq!(money("-0.825").rounded().cents(), -83);
        assert_eq!(money("0.824999").rounded().cents(), 82);
    }

    #[test]
    fn test_clamp_to() {
        let ceiling = Money::from_cents(1000);
        assert_eq!(Money::from_cents(1500).clamp_to(ceiling), ceiling);
        assert_eq!(Money::from_cents(-10).clamp_to(ceiling), Money::zero());
        assert_eq!(Money::from_cents(250).clamp_to(ceiling).cents(), 250);
        assert_eq!(Money::from_cents(250).clamp_to(Money::from_cents(-5)), Money::zero());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-100).abs().cents(), 100);
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_string: Money = serde_json::from_str("\"100.00\"").unwrap();
        let from_number: Money = serde_json::from_str("100.5").unwrap();
        let from_int: Money = serde_json::from_str("42").unwrap();

        assert_eq!(from_string.cents(), 10000);
        assert_eq!(from_number.cents(), 10050);
        assert_eq!(from_int.cents(), 4200);

        assert_eq!(serde_json::to_string(&money("188.1")).unwrap(), "188.1");
    }

    #[test]
    fn test_arithmetic_saturates_at_decimal_range() {
        let max = Money::from_decimal(Decimal::MAX);

        assert_eq!((max + Money::from_cents(1)).amount(), Decimal::MAX);
        assert_eq!((Money::zero() - max - max).amount(), Decimal::MIN);
        assert_eq!(max.multiply_quantity(i64::MAX).amount(), Decimal::MAX);
        assert_eq!(max.cents(), i64::MAX);
    }
}

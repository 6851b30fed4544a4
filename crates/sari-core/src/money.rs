//! # Money Module
//!
//! Provides the `Money` type for handling peso amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Stored documents carry prices as decimal numbers:                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos in memory, decimals on the wire        │
//! │                                                                         │
//! │    JSON  12.5  ──deserialize──►  Money(1250)  ──arithmetic──► ...      │
//! │    JSON  12.5  ◄──serialize───   Money(1250)                           │
//! │                                                                         │
//! │  Rounding happens exactly once, at the serde boundary.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sari_core::money::Money;
//!
//! let price = Money::from_cents(1250); // ₱12.50
//! let line_total = price.multiply_quantity(3);
//! assert_eq!(line_total.cents(), 3750);
//! assert_eq!(line_total.to_string(), "₱37.50");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest peso unit).
///
/// ## Where Money is Used
/// ```text
/// Product.sellingPrice ──► Sale.unitPrice ──► Sale.totalAmount
///        │
///        └──► PriceHistory old/new prices ──► margins (percent, f64)
///
/// Product.originalPrice ──► RestockHistory.totalCost
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal amount in pesos, rounding to the
    /// nearest centavo.
    ///
    /// This is the only float entry point and is used at the document
    /// boundary and for percentage adjustments.
    ///
    /// ## Example
    /// ```rust
    /// use sari_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(12.5).cents(), 1250);
    /// assert_eq!(Money::from_major(0.1 + 0.2).cents(), 30);
    /// ```
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as decimal pesos.
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use sari_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(5000); // ₱50.00
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 15000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when the product leaves the representable range.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Scales by `factor` and rounds to the nearest centavo.
    ///
    /// ## Example
    /// ```rust
    /// use sari_core::money::Money;
    ///
    /// // +10% on ₱20.00
    /// assert_eq!(Money::from_cents(2000).scale(1.10).cents(), 2200);
    /// ```
    pub fn scale(&self, factor: f64) -> Money {
        Money::from_major(self.to_major() * factor)
    }

    /// Ratio of two amounts (`self / other`), `None` when `other` is zero.
    pub fn ratio(&self, other: Money) -> Option<f64> {
        if other.is_zero() {
            None
        } else {
            Some(self.0 as f64 / other.0 as f64)
        }
    }
}

// =============================================================================
// Margin
// =============================================================================

/// Profit margin in percent, measured against the selling price.
///
/// ```text
/// margin = (selling - original) / selling × 100
/// ```
///
/// Returns 0 when the selling price is zero.
///
/// ## Example
/// ```rust
/// use sari_core::money::{margin_percent, Money};
///
/// let margin = margin_percent(Money::from_cents(1000), Money::from_cents(2500));
/// assert!((margin - 60.0).abs() < 1e-9);
/// assert_eq!(margin_percent(Money::from_cents(1000), Money::zero()), 0.0);
/// ```
pub fn margin_percent(original: Money, selling: Money) -> f64 {
    match (selling - original).ratio(selling) {
        Some(ratio) => ratio * 100.0,
        None => 0.0,
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Peso display with two decimals, the format used in restock descriptions.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}₱{}.{:02}", sign, abs / 100, abs % 100)
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// Multiplication by quantity. Saturates; the engine uses
/// [`Money::checked_mul`] where an overflow must be rejected.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Serde: decimal pesos on the wire
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_major())
        }
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a peso amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom(format!("amount out of range: {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(format!("amount out of range: {v}")))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Ok(Money::from_major(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        let trimmed = v.trim().trim_start_matches('₱');
        if trimmed.is_empty() {
            return Ok(Money::zero());
        }
        trimmed
            .parse::<f64>()
            .map(Money::from_major)
            .map_err(|_| E::custom(format!("invalid amount: {v}")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

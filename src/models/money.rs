//! Money and quantity types for line-item arithmetic
//!
//! Amounts are stored in cents (i64) and quantities in hundredths (i64) so
//! that every total can be recomputed exactly from line items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Represents a monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use shopfloor::models::Money;
    /// let amount = Money::from_cents(1050); // $10.50
    /// assert_eq!(amount.dollars(), 10);
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from dollars and cents
    pub const fn from_dollars_cents(dollars: i64, cents: i64) -> Self {
        Self(dollars * 100 + cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole dollars portion (truncated toward zero)
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Get the cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Get the absolute value
    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Multiply a unit price by a quantity, rounding half away from zero
    ///
    /// # Examples
    /// ```
    /// use shopfloor::models::{Money, Quantity};
    /// let labor = Money::from_cents(12000).times(Quantity::from_hundredths(150));
    /// assert_eq!(labor.cents(), 18000);
    /// ```
    pub fn times(&self, quantity: Quantity) -> Self {
        Self(div_round(
            i128::from(self.0) * i128::from(quantity.hundredths()),
            100,
        ))
    }

    /// Apply a rate in basis points (825 = 8.25%), rounding half away from zero
    pub fn apply_rate_bps(&self, rate_bps: u32) -> Self {
        Self(div_round(i128::from(self.0) * i128::from(rate_bps), 10_000))
    }

    /// Parse a money amount from a string
    ///
    /// Accepts formats: "10.50", "-10.50", "$10.50", "10"
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();

        let (negative, s) = if let Some(stripped) = s.strip_prefix('-') {
            (true, stripped)
        } else {
            (false, s)
        };

        let s = s.strip_prefix('$').unwrap_or(s);
        let cents = parse_hundredths(s).ok_or_else(|| MoneyParseError::InvalidFormat(s.into()))?;

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!(
                "-{}{}.{:02}",
                symbol,
                self.dollars().abs(),
                self.cents_part()
            )
        } else {
            format!("{}{}.{:02}", symbol, self.dollars(), self.cents_part())
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with_symbol("$"))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A line-item quantity stored in hundredths (1.5 labor hours = 150)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// A whole-unit quantity
    pub const fn units(units: i64) -> Self {
        Self(units * 100)
    }

    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parse a quantity such as "2", "1.5" or "0.25"
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(MoneyParseError::InvalidFormat(s.into()));
        }
        parse_hundredths(s)
            .map(Self)
            .ok_or_else(|| MoneyParseError::InvalidFormat(s.into()))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::units(1)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = (self.0 % 100).abs();
        if frac == 0 {
            write!(f, "{}", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}", whole, frac)
        }
    }
}

/// Parse an unsigned decimal string with up to two fractional digits into hundredths
fn parse_hundredths(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        2 => frac.parse().ok()?,
        _ => return None,
    };

    whole.checked_mul(100)?.checked_add(frac)
}

/// Integer division rounding half away from zero, saturating at the i64 range
fn div_round(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX })
}

/// Error type for money and quantity parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid number format: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1050)), "$10.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
        assert_eq!(format!("{}", Money::from_cents(-1050)), "-$10.50");
        assert_eq!(format!("{}", Money::from_cents(5)), "$0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("$10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-10.50").unwrap().cents(), -1050);
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert!(Money::parse("ten").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("10.999").is_err());
        assert!(Money::parse("$0.001").is_err());
    }

    #[test]
    fn test_times_rounds_half_away_from_zero() {
        // 0.33 x $0.50 = 16.5 cents
        let price = Money::from_cents(50);
        assert_eq!(price.times(Quantity::from_hundredths(33)).cents(), 17);
        assert_eq!((-price).times(Quantity::from_hundredths(33)).cents(), -17);
        assert_eq!(price.times(Quantity::units(3)).cents(), 150);
    }

    #[test]
    fn test_times_saturates_instead_of_wrapping() {
        let huge = Quantity::from_hundredths(i64::MAX);
        assert_eq!(Money::from_cents(i64::MAX).times(huge).cents(), i64::MAX);
        assert_eq!(Money::from_cents(-i64::MAX).times(huge).cents(), i64::MIN);
    }

    #[test]
    fn test_apply_rate() {
        // 8.25% of $123.45 = 10.184625
        assert_eq!(Money::from_cents(12345).apply_rate_bps(825).cents(), 1018);
        assert_eq!(Money::from_cents(200).apply_rate_bps(2500).cents(), 50);
        assert_eq!(Money::from_cents(10000).apply_rate_bps(0).cents(), 0);
    }

    #[test]
    fn test_quantity_parse_and_display() {
        assert_eq!(Quantity::parse("1.5").unwrap().hundredths(), 150);
        assert_eq!(Quantity::parse("2").unwrap().hundredths(), 200);
        assert_eq!(Quantity::parse(".25").unwrap().hundredths(), 25);
        assert!(Quantity::parse("-1").is_err());
        assert!(Quantity::parse("1.255").is_err());
        assert_eq!(Quantity::from_hundredths(150).to_string(), "1.5");
        assert_eq!(Quantity::from_hundredths(125).to_string(), "1.25");
        assert_eq!(Quantity::units(4).to_string(), "4");
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");
    }
}

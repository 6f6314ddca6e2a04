//! Value objects for the order domain.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Symbols an order reference is drawn from.
pub const REF_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of an order reference.
pub const REF_LEN: usize = 8;

const REF_SPLIT_AT: usize = 4;

/// Short human-facing order code.
///
/// References are random and not guaranteed to be unique; they are never used
/// as a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct OrderRef(String);

impl OrderRef {
    /// Draws a fresh reference from the 36-symbol alphabet.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..REF_LEN)
            .map(|_| REF_ALPHABET[rng.random_range(0..REF_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Wraps an existing reference.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the reference split for display, e.g. `AB12-CD34`.
    pub fn view(&self) -> String {
        match (self.0.get(..REF_SPLIT_AT), self.0.get(REF_SPLIT_AT..)) {
            (Some(head), Some(tail)) if !tail.is_empty() => format!("{head}-{tail}"),
            _ => self.0.clone(),
        }
    }
}

impl std::fmt::Display for OrderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount represented in cents to avoid floating point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = 10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from whole currency units.
    pub const fn from_units(units: i64) -> Self {
        Self { cents: units * 100 }
    }

    /// Creates a Money amount from a decimal value in currency units, rounded
    /// to the nearest cent.
    ///
    /// Returns `None` if the amount is not finite or does not fit in cents.
    pub fn from_major(amount: f64) -> Option<Self> {
        cents_from_f64(amount * 100.0).map(Self::from_cents)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-unit portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.cents.checked_mul(i64::from(quantity)).map(Money::from_cents)
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Subtracts `rhs`, returning `None` on overflow.
    pub fn checked_sub(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_sub(rhs.cents).map(Money::from_cents)
    }

    /// Returns `rate` percent of this amount, rounded half away from zero to
    /// the nearest cent.
    ///
    /// Returns `None` if the result is not finite or does not fit in cents.
    pub fn percentage(&self, rate: f64) -> Option<Money> {
        cents_from_f64(self.cents as f64 * rate / 100.0).map(Money::from_cents)
    }
}

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
fn cents_from_f64(value: f64) -> Option<i64> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.units(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_from_major_rounds_to_cent() {
        assert_eq!(Money::from_major(45.99), Some(Money::from_cents(4599)));
        assert_eq!(Money::from_major(0.005), Some(Money::from_cents(1)));
        assert_eq!(Money::from_major(-12.5), Some(Money::from_cents(-1250)));
    }

    #[test]
    fn test_money_from_major_rejects_unrepresentable() {
        assert_eq!(Money::from_major(1e20), None);
        assert_eq!(Money::from_major(f64::NAN), None);
        assert_eq!(Money::from_major(f64::INFINITY), None);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_percentage() {
        assert_eq!(Money::from_units(300).percentage(10.0), Some(Money::from_units(30)));
        assert_eq!(Money::from_units(255).percentage(20.0), Some(Money::from_units(51)));
        // 0.125 rounds away from zero
        assert_eq!(Money::from_cents(25).percentage(50.0), Some(Money::from_cents(13)));
        assert_eq!(Money::from_cents(-25).percentage(50.0), Some(Money::from_cents(-13)));
        assert_eq!(Money::from_cents(i64::MAX).percentage(200.0), None);
    }

    #[test]
    fn test_money_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.checked_mul(3), Some(Money::from_cents(3000)));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic_detects_overflow() {
        let half = Money::from_cents(i64::MAX / 2 + 1);
        assert_eq!(half.checked_mul(2), None);
        assert_eq!(half.checked_add(half), None);
        assert_eq!(
            Money::from_cents(i64::MAX / 2).checked_mul(2),
            Some(Money::from_cents(i64::MAX - 1))
        );
    }

    #[test]
    fn test_generated_ref_shape() {
        let reference = OrderRef::generate();
        assert_eq!(reference.as_str().len(), REF_LEN);
        assert!(
            reference
                .as_str()
                .bytes()
                .all(|b| REF_ALPHABET.contains(&b))
        );
    }

    #[test]
    fn test_ref_view() {
        assert_eq!(OrderRef::new("AB12CD34").view(), "AB12-CD34");
        assert_eq!(OrderRef::new("").view(), "");
        assert_eq!(OrderRef::new("ABC").view(), "ABC");
    }
}

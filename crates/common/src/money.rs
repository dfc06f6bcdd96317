//! Money amounts.

use serde::{Deserialize, Serialize};

/// Money amount in minor currency units.
///
/// Integer arithmetic only; percentages round half away from zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a money amount from minor units.
    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds `rhs`, or `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Subtracts `rhs`, or `None` on overflow.
    pub fn checked_sub(&self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Sums amounts, or `None` if the sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Returns `rate` percent of this amount, e.g. `percent(15.0)` for 15%.
    pub fn percent(&self, rate: f64) -> Money {
        Money((self.0 as f64 * rate / 100.0).round() as i64)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Money::new(1000);
        let b = Money::new(400);

        assert_eq!((a + b).amount(), 1400);
        assert_eq!((a - b).amount(), 600);
        assert_eq!(b.checked_multiply(3), Some(Money::new(1200)));
    }

    #[test]
    fn checked_arithmetic_catches_overflow() {
        assert_eq!(Money::new(i64::MAX).checked_multiply(2), None);
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(Money::new(i64::MIN).checked_sub(Money::new(1)), None);
        assert_eq!(
            Money::checked_sum([Money::new(i64::MAX), Money::new(1)]),
            None
        );
        assert_eq!(
            Money::checked_sum([30, 20].map(Money::new)),
            Some(Money::new(50))
        );
    }

    #[test]
    fn percent_rounds_to_nearest_unit() {
        assert_eq!(Money::new(5000).percent(80.0).amount(), 4000);
        assert_eq!(Money::new(4999).percent(15.0).amount(), 750);
        assert_eq!(Money::new(0).percent(50.0), Money::zero());
    }

    #[test]
    fn sums_an_iterator() {
        let total: Money = [30, 20, 1].into_iter().map(Money::new).sum();
        assert_eq!(total, Money::new(51));
    }

    #[test]
    fn sign_checks() {
        assert!(Money::new(1).is_positive());
        assert!(Money::zero().is_zero());
        assert!(Money::new(-1).is_negative());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::new(50000)).unwrap();
        assert_eq!(json, "50000");
    }
}

use std::{
    cmp::min,
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------        Money         ---------------------------------------------------------
/// An amount of money, held as a whole number of the currency's smallest unit.
///
/// Amounts are never represented as floats. All totals, debts and ledger entries in the engine are `Money`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// `self × quantity`, or `None` if the result does not fit in a money amount.
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// The part of `self` that can be applied against `limit`. Negative limits clamp to zero.
    pub fn clamp_to(self, limit: Money) -> Money {
        if limit.0 <= 0 {
            Money::ZERO
        } else {
            Money(min(self.0, limit.0))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let mut a = Money::from(55_000);
        a -= Money::from(5_000);
        assert_eq!(a, Money::from(50_000));
        a += Money::from(1);
        assert_eq!(a + Money::from(9), Money::from(50_010));
        assert_eq!(-Money::from(7), Money::from(-7));
        let total: Money = [10, 20, 30].into_iter().map(Money::from).sum();
        assert_eq!(total, Money::from(60));
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(Money::from(1_250).checked_mul(4), Some(Money::from(5_000)));
        assert_eq!(Money::from(i64::MAX / 2).checked_mul(4), None);
        assert_eq!(Money::from(i64::MAX).checked_add(Money::from(1)), None);
        assert_eq!(Money::from(7).checked_add(Money::from(3)), Some(Money::from(10)));
        assert_eq!(Money::from(i64::MIN).checked_sub(Money::from(1)), None);
        assert_eq!(Money::from(7).checked_sub(Money::from(10)), Some(Money::from(-3)));
    }

    #[test]
    fn clamping() {
        let requested = Money::from(1_000_000);
        assert_eq!(requested.clamp_to(Money::from(55_000)), Money::from(55_000));
        assert_eq!(Money::from(20).clamp_to(Money::from(55_000)), Money::from(20));
        assert_eq!(Money::from(20).clamp_to(Money::ZERO), Money::ZERO);
        assert_eq!(Money::from(20).clamp_to(Money::from(-3)), Money::ZERO);
    }

    #[test]
    fn conversion_from_u64() {
        assert_eq!(Money::try_from(42u64).unwrap(), Money::from(42));
        assert!(Money::try_from(u64::MAX).is_err());
    }

    #[test]
    fn serializes_as_a_bare_integer() {
        let json = serde_json::to_string(&Money::from(30_000)).unwrap();
        assert_eq!(json, "30000");
        let m: Money = serde_json::from_str("20000").unwrap();
        assert_eq!(m, Money::from(20_000));
    }
}

//! Monetary amounts in the smallest currency unit.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// An amount in minor currency units (e.g. kuruş).
///
/// Signed on purpose: settlement only ever writes positive amounts, but the
/// due-date sweep must be able to represent and skip non-positive totals it
/// finds in the store.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(amount: i64) -> Self {
        Self(amount)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::invariant("monetary amount overflow"))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_sub(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::invariant("monetary amount overflow"))
    }

    /// Sum a sequence of amounts with overflow checking.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> DomainResult<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, a| acc.checked_add(a))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Two-decimal major/minor rendering, sign on the major part.
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn checked_add_detects_overflow() {
        let err = Money::from_minor(i64::MAX)
            .checked_add(Money::from_minor(1))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => assert!(msg.contains("overflow")),
            _ => panic!("expected invariant violation"),
        }
    }

    #[test]
    fn checked_sum_adds_all_amounts() {
        let total = Money::checked_sum([
            Money::from_minor(100),
            Money::from_minor(20),
            Money::from_minor(-5),
        ])
        .unwrap();
        assert_eq!(total, Money::from_minor(115));
    }

    #[test]
    fn displays_minor_units_with_two_decimals() {
        assert_eq!(Money::from_minor(12_050).to_string(), "120.50");
        assert_eq!(Money::from_minor(-7).to_string(), "-0.07");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    proptest! {
        /// Property: addition then subtraction of the same amount is identity
        /// whenever both operations stay in range.
        #[test]
        fn add_then_sub_is_identity(a in -1_000_000_000i64..1_000_000_000i64,
                                    b in -1_000_000_000i64..1_000_000_000i64) {
            let a = Money::from_minor(a);
            let b = Money::from_minor(b);
            let round_trip = a.checked_add(b).unwrap().checked_sub(b).unwrap();
            prop_assert_eq!(round_trip, a);
        }
    }
}

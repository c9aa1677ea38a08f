use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A percentage with two decimal places, e.g. `33.33` for one third.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Percentage(pub Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);

    /// `part / whole * 100`, rounded half-up to two decimals. Zero when `whole` is zero.
    pub fn from_ratio(part: U256, whole: U256) -> Self {
        if whole.is_zero() {
            return Self::ZERO;
        }

        // hundredths of a percent, doubled so the half-up rounding stays integral
        let doubled = part.full_mul(U256::from(20_000u64)) / U512::from(whole);
        let hundredths = (doubled + U512::one()) / U512::from(2u64);

        let capped = if hundredths > U512::from(i64::MAX as u64) {
            i64::MAX
        } else {
            hundredths.low_u64() as i64
        };

        Self(Decimal::new(capped, 2))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_whole_is_zero_percent() {
        assert_eq!(Percentage::from_ratio(U256::from(5u64), U256::zero()), Percentage::ZERO);
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        assert_eq!(Percentage::from_ratio(1u64.into(), 3u64.into()).value(), dec!(33.33));
        assert_eq!(Percentage::from_ratio(2u64.into(), 3u64.into()).value(), dec!(66.67));
        assert_eq!(Percentage::from_ratio(1u64.into(), 8u64.into()).value(), dec!(12.50));
        assert_eq!(Percentage::from_ratio(7u64.into(), 7u64.into()).value(), dec!(100));
    }

    #[test]
    fn test_half_up_at_boundary() {
        // 1/16 = 6.25%, 1/160000 = 0.000625% -> 0.00
        assert_eq!(Percentage::from_ratio(1u64.into(), 16u64.into()).value(), dec!(6.25));
        assert_eq!(Percentage::from_ratio(1u64.into(), 160_000u64.into()).value(), dec!(0));
        // 1/20000 = 0.005% -> 0.01
        assert_eq!(Percentage::from_ratio(1u64.into(), 20_000u64.into()).value(), dec!(0.01));
    }

    #[test]
    fn test_large_share_counts() {
        let total = U256::MAX;
        let part = total / U256::from(4u64);
        assert_eq!(Percentage::from_ratio(part, total).value(), dec!(25));
    }

    #[test]
    fn test_display() {
        assert_eq!(Percentage::from_ratio(1u64.into(), 3u64.into()).to_string(), "33.33");
        assert_eq!(Percentage::ZERO.to_string(), "0.00");
    }
}

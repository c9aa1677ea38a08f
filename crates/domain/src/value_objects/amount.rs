use crate::error::DomainError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractional digits used by both pool tokens and by pool shares.
pub const TOKEN_DECIMALS: u8 = 18;

/// Largest scale whose unit `10^decimals` fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

/// A non-negative token quantity held in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Result<Self, DomainError> {
        if decimals > MAX_DECIMALS {
            return Err(DomainError::UnsupportedDecimals(decimals));
        }
        Ok(Self { raw, decimals })
    }

    /// Wraps a base-unit quantity of an 18-decimal token.
    pub fn from_base_units(raw: impl Into<U256>) -> Self {
        Self {
            raw: raw.into(),
            decimals: TOKEN_DECIMALS,
        }
    }

    pub fn zero() -> Self {
        Self::from_base_units(U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Parses a decimal string such as `"1.5"` into base units.
    pub fn from_decimal_str(input: &str, decimals: u8) -> Result<Self, DomainError> {
        Self::new(parse_units(input, decimals)?, decimals)
    }

    /// Like [`Amount::from_decimal_str`] but rejects zero.
    pub fn parse_positive(input: &str) -> Result<Self, DomainError> {
        let amount: Amount = input.parse()?;
        if amount.is_zero() {
            return Err(DomainError::ZeroAmount);
        }
        Ok(amount)
    }

    /// Renders the amount as a decimal string with trailing zeros trimmed.
    pub fn to_decimal_string(&self) -> String {
        format_units(self.raw, self.decimals)
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.raw
            .checked_add(other.raw)
            .map(|raw| Self { raw, ..*self })
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        self.raw
            .checked_sub(other.raw)
            .map(|raw| Self { raw, ..*self })
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s, TOKEN_DECIMALS)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Self::from_base_units(v)
    }
}

/// Converts a decimal string into an integer scaled by `10^decimals`.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, DomainError> {
    let invalid = |reason: &str| DomainError::InvalidAmount {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if decimals > MAX_DECIMALS {
        return Err(DomainError::UnsupportedDecimals(decimals));
    }

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty amount"));
    }

    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected digits with an optional decimal point"));
    }
    if frac_part.len() > decimals as usize {
        return Err(invalid("too many fractional digits"));
    }

    let mut digits = String::with_capacity(int_part.len() + decimals as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    for _ in frac_part.len()..decimals as usize {
        digits.push('0');
    }

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(significant).map_err(|_| invalid("value exceeds 256 bits"))
}

/// Formats an integer scaled by `10^decimals` as a decimal string.
///
/// Scales above [`MAX_DECIMALS`] exceed every 256-bit value, so the whole part is zero.
pub fn format_units(value: U256, decimals: u8) -> String {
    let (whole, fraction) = match U256::from(10).checked_pow(U256::from(decimals)) {
        Some(divisor) => (value / divisor, value % divisor),
        None => (U256::zero(), value),
    };

    if fraction.is_zero() {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fractional_amount() {
        let amount: Amount = "1.5".parse().unwrap();
        assert_eq!(amount.raw, U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(amount.to_decimal_string(), "1.5");
    }

    #[test]
    fn test_round_trip_preserves_value() {
        for input in ["10", "0.000000000000000001", "123456789.123456789012345678", ".25"] {
            let amount: Amount = input.parse().unwrap();
            let back: Amount = amount.to_decimal_string().parse().unwrap();
            assert_eq!(amount, back, "input {input}");
        }
        assert_eq!("0.250".parse::<Amount>().unwrap().to_string(), "0.25");
        assert_eq!("007".parse::<Amount>().unwrap().to_string(), "7");
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in ["", "  ", ".", "-1", "+1", "1e18", "1.2.3", "abc", "1,5"] {
            assert!(input.parse::<Amount>().is_err(), "input {input:?}");
        }
    }

    #[test]
    fn test_rejects_excess_precision() {
        let err = "0.0000000000000000001".parse::<Amount>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount { .. }));
    }

    #[test]
    fn test_rejects_overflow() {
        let huge = "9".repeat(80);
        assert!(huge.parse::<Amount>().is_err());
    }

    #[test]
    fn test_parse_positive() {
        assert!(Amount::parse_positive("0.1").is_ok());
        assert_eq!(Amount::parse_positive("0.0"), Err(DomainError::ZeroAmount));
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from(5u64);
        let b = Amount::from(7u64);
        assert_eq!(a.checked_add(b), Some(Amount::from(12u64)));
        assert_eq!(a.checked_sub(b), None);
    }

    #[test]
    fn test_rejects_unrepresentable_scale() {
        assert_eq!(
            Amount::new(U256::one(), 78),
            Err(DomainError::UnsupportedDecimals(78))
        );
        assert_eq!(
            Amount::from_decimal_str("0.1", 78),
            Err(DomainError::UnsupportedDecimals(78))
        );

        let widest = Amount::new(U256::one(), MAX_DECIMALS).unwrap();
        assert_eq!(widest.to_string(), format!("0.{}1", "0".repeat(76)));
        assert_eq!(format_units(U256::from(5), 90), format!("0.{}5", "0".repeat(89)));
    }
}

use thiserror::Error;

/// Errors raised while building domain values from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("{0} decimals cannot be represented in 256 bits")]
    UnsupportedDecimals(u8),
}

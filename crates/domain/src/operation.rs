//! User commands and the ledger operations they expand into.

use crate::enums::{CommandKind, SwapDirection, TokenRef};
use crate::error::DomainError;
use crate::value_objects::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single write against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingOperation {
    /// Grant the pool an allowance on one of its tokens.
    Approve { token: TokenRef, amount: Amount },
    Swap { amount: Amount, direction: SwapDirection },
    AddLiquidity { amount1: Amount, amount2: Amount },
    RemoveLiquidity { shares: Amount },
}

impl PendingOperation {
    pub fn name(&self) -> &'static str {
        match self {
            PendingOperation::Approve { .. } => "approve",
            PendingOperation::Swap { .. } => "swap",
            PendingOperation::AddLiquidity { .. } => "add-liquidity",
            PendingOperation::RemoveLiquidity { .. } => "remove-liquidity",
        }
    }
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOperation::Approve { token, amount } => write!(f, "Approve({token}, {amount})"),
            PendingOperation::Swap { amount, direction } => {
                write!(f, "Swap({amount}, {})", direction.token1_in())
            }
            PendingOperation::AddLiquidity { amount1, amount2 } => {
                write!(f, "AddLiquidity({amount1}, {amount2})")
            }
            PendingOperation::RemoveLiquidity { shares } => write!(f, "RemoveLiquidity({shares})"),
        }
    }
}

/// A user-initiated action on the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Swap { amount: Amount, direction: SwapDirection },
    AddLiquidity { amount1: Amount, amount2: Amount },
    RemoveLiquidity { shares: Amount },
}

impl Command {
    /// Builds a swap from a decimal string.
    pub fn swap(amount: &str, direction: SwapDirection) -> Result<Self, DomainError> {
        Ok(Command::Swap {
            amount: Amount::parse_positive(amount)?,
            direction,
        })
    }

    pub fn add_liquidity(amount1: &str, amount2: &str) -> Result<Self, DomainError> {
        Ok(Command::AddLiquidity {
            amount1: Amount::parse_positive(amount1)?,
            amount2: Amount::parse_positive(amount2)?,
        })
    }

    pub fn remove_liquidity(shares: &str) -> Result<Self, DomainError> {
        Ok(Command::RemoveLiquidity {
            shares: Amount::parse_positive(shares)?,
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Swap { .. } => CommandKind::Swap,
            Command::AddLiquidity { .. } => CommandKind::AddLiquidity,
            Command::RemoveLiquidity { .. } => CommandKind::RemoveLiquidity,
        }
    }

    /// Checks that every amount carried by the command is non-zero.
    pub fn validate(&self) -> Result<(), DomainError> {
        let has_zero = match self {
            Command::Swap { amount, .. } => amount.is_zero(),
            Command::AddLiquidity { amount1, amount2 } => amount1.is_zero() || amount2.is_zero(),
            Command::RemoveLiquidity { shares } => shares.is_zero(),
        };

        if has_zero {
            return Err(DomainError::ZeroAmount);
        }
        Ok(())
    }

    /// The ordered ledger writes that realise this command.
    pub fn plan(&self) -> Vec<PendingOperation> {
        match *self {
            Command::Swap { amount, direction } => vec![
                PendingOperation::Approve {
                    token: direction.input_token(),
                    amount,
                },
                PendingOperation::Swap { amount, direction },
            ],
            Command::AddLiquidity { amount1, amount2 } => vec![
                PendingOperation::Approve {
                    token: TokenRef::Token1,
                    amount: amount1,
                },
                PendingOperation::Approve {
                    token: TokenRef::Token2,
                    amount: amount2,
                },
                PendingOperation::AddLiquidity { amount1, amount2 },
            ],
            Command::RemoveLiquidity { shares } => {
                vec![PendingOperation::RemoveLiquidity { shares }]
            }
        }
    }
}

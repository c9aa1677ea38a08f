use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two tokens of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenRef {
    Token1,
    Token2,
}

impl TokenRef {
    pub fn other(self) -> Self {
        match self {
            TokenRef::Token1 => TokenRef::Token2,
            TokenRef::Token2 => TokenRef::Token1,
        }
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRef::Token1 => f.write_str("Token1"),
            TokenRef::Token2 => f.write_str("Token2"),
        }
    }
}

/// Which token is sold in a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    Token1ToToken2,
    Token2ToToken1,
}

impl SwapDirection {
    /// The token the caller pays in.
    pub fn input_token(self) -> TokenRef {
        match self {
            SwapDirection::Token1ToToken2 => TokenRef::Token1,
            SwapDirection::Token2ToToken1 => TokenRef::Token2,
        }
    }

    pub fn output_token(self) -> TokenRef {
        self.input_token().other()
    }

    /// Flag expected by the pool contract: `true` when Token1 is the input.
    pub fn token1_in(self) -> bool {
        matches!(self, SwapDirection::Token1ToToken2)
    }

    pub fn from_token1_in(token1_in: bool) -> Self {
        if token1_in {
            SwapDirection::Token1ToToken2
        } else {
            SwapDirection::Token2ToToken1
        }
    }

    pub fn reversed(self) -> Self {
        Self::from_token1_in(!self.token1_in())
    }
}

/// Kind of user command, used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Swap,
    AddLiquidity,
    RemoveLiquidity,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Swap => f.write_str("swap"),
            CommandKind::AddLiquidity => f.write_str("add-liquidity"),
            CommandKind::RemoveLiquidity => f.write_str("remove-liquidity"),
        }
    }
}

/// Lifecycle of a single pending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Created,
    Submitted,
    Confirmed,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Confirmed | OperationStatus::Failed)
    }
}

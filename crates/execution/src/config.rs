//! Orchestrator and pool configuration.

use cpamm_client_domain::{Address, TOKEN_DECIMALS, Token, TokenPair};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Pool contract of the reference deployment.
pub const DEFAULT_POOL_ADDRESS: &str = "0xfF9b782697076e893e78b25Dc008eea2EBD58660";

/// Token1 (TK1) of the reference deployment.
pub const DEFAULT_TOKEN1_ADDRESS: &str = "0x50E00bC33d107108D935B07EF7D82594651B1968";

/// Token2 (TK2) of the reference deployment.
pub const DEFAULT_TOKEN2_ADDRESS: &str = "0x3070ef83F647838DB86f276c7D9E58B83559a788";

/// Errors raised while building configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Configuration for the transaction orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on the wait for a single step's finality.
    pub finality_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            finality_timeout: Duration::from_secs(120),
        }
    }
}

impl OrchestratorConfig {
    #[must_use]
    pub fn with_finality_timeout(mut self, timeout: Duration) -> Self {
        self.finality_timeout = timeout;
        self
    }
}

/// Addresses of the pool contract and its two tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Pool contract; also the spender for approvals.
    pub pool_address: Address,
    pub tokens: TokenPair,
}

impl PoolConfig {
    pub fn new(pool_address: Address, token1: Address, token2: Address) -> Self {
        Self {
            pool_address,
            tokens: TokenPair::new(
                Token::new(token1, "TK1", TOKEN_DECIMALS),
                Token::new(token2, "TK2", TOKEN_DECIMALS),
            ),
        }
    }

    /// Parses `0x`-prefixed hex addresses.
    pub fn from_addresses(pool: &str, token1: &str, token2: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(
            parse_address("pool", pool)?,
            parse_address("token1", token1)?,
            parse_address("token2", token2)?,
        ))
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_addresses(
            DEFAULT_POOL_ADDRESS,
            DEFAULT_TOKEN1_ADDRESS,
            DEFAULT_TOKEN2_ADDRESS,
        )
        .expect("Invalid default pool addresses")
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    let invalid = || ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    };
    let hex = value.trim().strip_prefix("0x").ok_or_else(invalid)?;
    if hex.len() != 40 {
        return Err(invalid());
    }
    Address::from_str(hex).map_err(|_| invalid())
}

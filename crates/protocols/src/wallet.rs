//! Wallet session interface.

use crate::error::LedgerError;
use crate::ledger::LedgerClient;
use async_trait::async_trait;
use cpamm_client_domain::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The connected account and the network it is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub address: Address,
    pub chain_id: u64,
}

/// Result of a successful wallet connection: who we are and a ledger client
/// that signs as that account.
#[derive(Clone)]
pub struct Connection {
    pub identity: Identity,
    pub ledger: Arc<dyn LedgerClient>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Source of signing capability, e.g. a browser wallet or a local key.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Requests account access and returns a signing ledger client.
    async fn connect(&self) -> Result<Connection, LedgerError>;

    fn is_connected(&self) -> bool;
}

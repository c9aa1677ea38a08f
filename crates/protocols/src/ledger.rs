//! Contract surface of the deployed pool and its tokens.

use crate::error::LedgerError;
use async_trait::async_trait;
use cpamm_client_domain::{Address, Amount};
use primitive_types::H256;
use serde::{Deserialize, Serialize};

/// Transaction hash.
pub type TxHash = H256;

/// A submitted write that can be awaited to finality.
pub type PendingTx = Box<dyn TxHandle>;

/// Terminal outcome of a submitted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finality {
    /// Irreversibly included.
    Confirmed { block: u64 },
    /// Reverted or dropped, with the ledger's reason.
    Rejected { reason: String },
}

impl Finality {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Finality::Confirmed { .. })
    }
}

/// Handle to a transaction that has been handed to the ledger.
#[async_trait]
pub trait TxHandle: Send {
    fn hash(&self) -> TxHash;

    /// Suspends until the ledger reports the transaction confirmed or rejected.
    async fn await_finality(self: Box<Self>) -> Finality;
}

/// Reads and writes against the pool contract on behalf of one signer.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current `(reserve1, reserve2)`.
    async fn get_reserves(&self) -> Result<(Amount, Amount), LedgerError>;

    async fn total_shares(&self) -> Result<Amount, LedgerError>;

    async fn shares_of(&self, account: Address) -> Result<Amount, LedgerError>;

    /// ERC-20 `approve(spender, amount)` on `token`.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<PendingTx, LedgerError>;

    /// `swap(amount, token1_in)`; `token1_in` selects Token1 as the input.
    async fn swap(&self, amount: Amount, token1_in: bool) -> Result<PendingTx, LedgerError>;

    async fn add_liquidity(&self, amount1: Amount, amount2: Amount)
    -> Result<PendingTx, LedgerError>;

    async fn remove_liquidity(&self, shares: Amount) -> Result<PendingTx, LedgerError>;
}

use thiserror::Error;

/// Errors reported by a ledger client or wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transport or node failure while talking to the ledger.
    #[error("rpc error: {0}")]
    Rpc(String),
    /// The write was refused before it reached the ledger (signing denied, estimation revert).
    #[error("{0}")]
    Rejected(String),
    /// No wallet is available to sign with.
    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),
}

impl LedgerError {
    /// Human readable reason without the error category prefix.
    pub fn reason(&self) -> &str {
        match self {
            LedgerError::Rpc(reason)
            | LedgerError::Rejected(reason)
            | LedgerError::WalletUnavailable(reason) => reason,
        }
    }
}

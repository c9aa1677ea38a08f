use super::ledger::SandboxLedger;
use crate::error::LedgerError;
use crate::wallet::{Connection, Identity, WalletProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

/// Wallet that signs for the sandbox ledger's account.
#[derive(Debug)]
pub struct SandboxWallet {
    ledger: SandboxLedger,
    chain_id: AtomicU64,
    connected: AtomicBool,
    available: AtomicBool,
}

impl SandboxWallet {
    pub fn new(ledger: SandboxLedger, chain_id: u64) -> Self {
        Self {
            ledger,
            chain_id: AtomicU64::new(chain_id),
            connected: AtomicBool::new(false),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates the user switching networks in the wallet.
    pub fn switch_chain(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id.load(Ordering::SeqCst)
    }

    /// Simulates a missing or locked wallet.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if !available {
            self.connected.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl WalletProvider for SandboxWallet {
    async fn connect(&self) -> Result<Connection, LedgerError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::WalletUnavailable(
                "no wallet available to sign".to_string(),
            ));
        }

        let identity = Identity {
            address: self.ledger.signer(),
            chain_id: self.chain_id(),
        };
        self.connected.store(true, Ordering::SeqCst);
        info!(account = ?identity.address, chain_id = identity.chain_id, "Sandbox wallet connected");

        Ok(Connection {
            identity,
            ledger: Arc::new(self.ledger.clone()),
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpamm_client_domain::Address;

    #[tokio::test]
    async fn test_connect_reports_signer_and_chain() {
        let ledger = SandboxLedger::new(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(0x10),
        );
        let wallet = SandboxWallet::new(ledger, 31337);
        assert!(!wallet.is_connected());

        let connection = wallet.connect().await.unwrap();
        assert_eq!(connection.identity.address, Address::repeat_byte(0x10));
        assert_eq!(connection.identity.chain_id, 31337);
        assert!(wallet.is_connected());

        wallet.set_available(false);
        assert!(!wallet.is_connected());
        assert!(wallet.connect().await.is_err());
    }
}

//! Process-wide wallet session.

use cpamm_client_protocols::{Connection, Identity, LedgerError, WalletProvider};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Single wallet session shared by every consumer of the pool client.
///
/// Created once with the wallet provider, connected explicitly, and torn down
/// on disconnect or when the wallet moves to another network.
pub struct Session {
    wallet: Arc<dyn WalletProvider>,
    connection: RwLock<Option<Connection>>,
}

impl Session {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            wallet,
            connection: RwLock::new(None),
        }
    }

    /// Connects the wallet unless a connection already exists.
    pub async fn connect(&self) -> Result<Identity, LedgerError> {
        let mut connection = self.connection.write().await;
        if let Some(existing) = connection.as_ref() {
            return Ok(existing.identity);
        }

        let established = self.wallet.connect().await.inspect_err(|e| {
            warn!(error = %e, "Failed to connect wallet");
        })?;
        let identity = established.identity;
        *connection = Some(established);

        info!(
            account = ?identity.address,
            chain_id = identity.chain_id,
            "Wallet session established"
        );
        Ok(identity)
    }

    /// Drops the current connection, if any.
    pub async fn disconnect(&self) {
        if let Some(previous) = self.connection.write().await.take() {
            info!(account = ?previous.identity.address, "Wallet session closed");
        }
    }

    /// Tears the session down when the wallet reports a different chain.
    ///
    /// Returns `true` if the session was dropped.
    pub async fn handle_network_change(&self, chain_id: u64) -> bool {
        let mut connection = self.connection.write().await;
        match connection.as_ref() {
            Some(current) if current.identity.chain_id != chain_id => {
                info!(
                    from = current.identity.chain_id,
                    to = chain_id,
                    "Network changed, closing wallet session"
                );
                *connection = None;
                true
            }
            _ => false,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.connection.read().await.as_ref().map(|c| c.identity)
    }

    pub async fn connection(&self) -> Option<Connection> {
        self.connection.read().await.clone()
    }

    /// Runs `f` only while `identity` is still the connected one.
    ///
    /// Teardown waits for `f` to return.
    pub async fn if_current<R>(&self, identity: &Identity, f: impl FnOnce() -> R) -> Option<R> {
        let connection = self.connection.read().await;
        match connection.as_ref() {
            Some(current) if current.identity == *identity => Some(f()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpamm_client_domain::Address;
    use cpamm_client_protocols::sandbox::{SandboxLedger, SandboxWallet};

    fn wallet() -> Arc<SandboxWallet> {
        let ledger = SandboxLedger::new(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(0x10),
        );
        Arc::new(SandboxWallet::new(ledger, 1))
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let session = Session::new(wallet());
        assert!(!session.is_connected().await);

        let identity = session.connect().await.unwrap();
        assert_eq!(identity.address, Address::repeat_byte(0x10));
        assert_eq!(session.identity().await, Some(identity));

        // connecting again reuses the session
        assert_eq!(session.connect().await.unwrap(), identity);

        session.disconnect().await;
        assert!(session.connection().await.is_none());
    }

    #[tokio::test]
    async fn test_network_change_drops_session() {
        let wallet = wallet();
        let session = Session::new(wallet.clone());
        session.connect().await.unwrap();

        assert!(!session.handle_network_change(1).await);
        assert!(session.is_connected().await);

        wallet.switch_chain(5);
        assert!(session.handle_network_change(5).await);
        assert!(!session.is_connected().await);

        let identity = session.connect().await.unwrap();
        assert_eq!(identity.chain_id, 5);
    }

    #[tokio::test]
    async fn test_if_current_requires_same_identity() {
        let wallet = wallet();
        let session = Session::new(wallet.clone());
        let identity = session.connect().await.unwrap();

        assert_eq!(session.if_current(&identity, || 7).await, Some(7));

        wallet.switch_chain(5);
        session.handle_network_change(5).await;
        session.connect().await.unwrap();
        assert_eq!(session.if_current(&identity, || 7).await, None);
    }

    #[tokio::test]
    async fn test_unavailable_wallet() {
        let wallet = wallet();
        wallet.set_available(false);
        let session = Session::new(wallet);
        assert!(matches!(
            session.connect().await,
            Err(LedgerError::WalletUnavailable(_))
        ));
    }
}

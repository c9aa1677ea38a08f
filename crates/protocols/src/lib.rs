//! Ledger-facing interfaces for the pool client.
//!
//! - `LedgerClient` / `TxHandle`: the deployed pool contract and its tokens
//! - `WalletProvider`: account access and signing
//! - `sandbox`: an in-process ledger implementing both

/// Prelude module for convenient imports.
pub mod prelude;

/// Error types.
pub mod error;
/// Pool contract interface.
pub mod ledger;
/// In-process ledger.
pub mod sandbox;
/// Wallet interface.
pub mod wallet;

pub use error::LedgerError;
pub use ledger::{Finality, LedgerClient, PendingTx, TxHandle, TxHash};
pub use wallet::{Connection, Identity, WalletProvider};

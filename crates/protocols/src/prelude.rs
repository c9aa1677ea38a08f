//! Prelude module for convenient imports.
//!
//! ```rust
//! use cpamm_client_protocols::prelude::*;
//! ```

pub use crate::error::LedgerError;
pub use crate::ledger::{Finality, LedgerClient, PendingTx, TxHandle, TxHash};
pub use crate::sandbox::{CallKind, LedgerCall, ReadKind, SandboxLedger, SandboxWallet};
pub use crate::wallet::{Connection, Identity, WalletProvider};

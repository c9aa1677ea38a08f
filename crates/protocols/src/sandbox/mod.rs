//! In-process stand-in for the deployed pool contract.
//!
//! Used by the CLI and by tests:
//! - ERC-20 style balances and allowances for both tokens
//! - Pool reserves and share accounting
//! - Fault injection and a log of submitted calls
//! - Controllable finality

mod ledger;
mod pool_math;
mod wallet;

pub use ledger::{CallKind, LedgerCall, ReadKind, SandboxLedger};
pub use pool_math::SWAP_FEE_BPS;
pub use wallet::SandboxWallet;

//! Domain types for a two-token constant-product pool client.
//!
//! - Token amounts with lossless decimal conversion
//! - Token identities and swap directions
//! - Pool snapshots and pool-share percentages
//! - User commands and the ledger operations they expand into

pub mod enums;
pub mod error;
pub mod operation;
pub mod pool;
pub mod token;
pub mod value_objects;

pub use enums::{CommandKind, OperationStatus, SwapDirection, TokenRef};
pub use error::DomainError;
pub use operation::{Command, PendingOperation};
pub use pool::Snapshot;
pub use token::{Address, Token, TokenPair};
pub use value_objects::{Amount, MAX_DECIMALS, Percentage, TOKEN_DECIMALS};

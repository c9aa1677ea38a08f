//! Transaction orchestration.
//!
//! Turns a user command into its ordered ledger writes and drives them:
//! - One run in flight at a time
//! - Each step awaited to finality before the next is submitted
//! - Snapshot refresh after a completed run

mod executor;
mod state;

pub use executor::*;
pub use state::*;

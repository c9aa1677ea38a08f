//! Run lifecycle tracking.
//!
//! Records the history of orchestration runs:
//! - Run start with the planned steps
//! - Step submission and confirmation
//! - Run completion or failure

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;

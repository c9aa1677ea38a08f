//! Pool snapshot refresh and publication.
//!
//! - Concurrent, all-or-nothing reads of reserves and shares
//! - A single published snapshot with change notifications

mod refresher;
mod store;

pub use refresher::*;
pub use store::*;

//! Transaction orchestration for the pool client.
//!
//! This crate sequences user commands into ledger writes:
//! - Wallet session management
//! - Snapshot refresh and publication
//! - Step-by-step execution with finality waits
//! - Error classification with user-facing messages
//! - Run lifecycle tracking

/// Prelude module for convenient imports.
pub mod prelude;

/// Orchestrator and pool configuration.
pub mod config;
/// Error types.
pub mod error;
/// Run lifecycle tracking.
pub mod lifecycle;
/// Command execution.
pub mod orchestrator;
/// Wallet session.
pub mod session;
/// Pool snapshots.
pub mod snapshot;

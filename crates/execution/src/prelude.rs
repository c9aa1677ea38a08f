//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use cpamm_client_execution::prelude::*;
//! ```

// Config
pub use crate::config::{
    ConfigError, DEFAULT_POOL_ADDRESS, DEFAULT_TOKEN1_ADDRESS, DEFAULT_TOKEN2_ADDRESS,
    OrchestratorConfig, PoolConfig,
};

// Errors
pub use crate::error::{ExecutionError, RunFailure};

// Lifecycle
pub use crate::lifecycle::{
    AggregateStats, RunEvent, RunEventType, RunOutcome, RunSummary, RunTracker, StepRecord,
};

// Orchestrator
pub use crate::orchestrator::{Orchestrator, RunResult, RunState};

// Session
pub use crate::session::Session;

// Snapshot
pub use crate::snapshot::{PublishedSnapshot, SnapshotStore, refresh_snapshot};

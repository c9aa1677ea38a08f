//! Error classification for orchestration runs and snapshot refreshes.

use cpamm_client_domain::{CommandKind, DomainError};
use cpamm_client_protocols::LedgerError;
use std::time::Duration;
use thiserror::Error;

/// Why a run or refresh did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Non-positive or malformed amount, or a local precondition failed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A run is already in flight.
    #[error("another operation is already in progress")]
    OrchestrationBusy,
    /// The ledger refused the write of step `step_index`.
    #[error("step {step_index} rejected: {reason}")]
    StepRejected { step_index: usize, reason: String },
    /// Step `step_index` did not reach finality in time.
    #[error("step {step_index} not final after {timeout:?}")]
    FinalityTimeout { step_index: usize, timeout: Duration },
    /// A read query failed; nothing was published.
    #[error("pool data unavailable: {0}")]
    SnapshotUnavailable(String),
    /// No wallet session.
    #[error("wallet not connected")]
    NotConnected,
    /// The wallet refused to connect.
    #[error("wallet error: {0}")]
    Wallet(#[from] LedgerError),
    /// The run was cancelled before step `step_index` was submitted.
    #[error("cancelled before step {step_index}")]
    Cancelled { step_index: usize },
}

impl From<DomainError> for ExecutionError {
    fn from(err: DomainError) -> Self {
        ExecutionError::InvalidInput(err.to_string())
    }
}

/// Terminal failure of one run, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RunFailure {
    pub command: CommandKind,
    pub error: ExecutionError,
    /// User-facing text.
    pub message: String,
    /// Index of the step that failed, if the failure belongs to a step.
    pub failed_step: Option<usize>,
}

impl RunFailure {
    pub fn new(command: CommandKind, error: ExecutionError) -> Self {
        let failed_step = match &error {
            ExecutionError::StepRejected { step_index, .. }
            | ExecutionError::FinalityTimeout { step_index, .. }
            | ExecutionError::Cancelled { step_index } => Some(*step_index),
            _ => None,
        };
        let message = user_message(command, &error);

        Self {
            command,
            error,
            message,
            failed_step,
        }
    }
}

/// The ledger's own reason when it gave one, otherwise a per-command message.
fn user_message(command: CommandKind, error: &ExecutionError) -> String {
    match error {
        ExecutionError::StepRejected { reason, .. } if !reason.is_empty() => reason.clone(),
        ExecutionError::InvalidInput(reason) => reason.clone(),
        ExecutionError::OrchestrationBusy => error.to_string(),
        ExecutionError::NotConnected => "Please connect your wallet.".to_string(),
        _ => match command {
            CommandKind::Swap => "Swap failed. Please try again.".to_string(),
            CommandKind::AddLiquidity => "Failed to add liquidity. Please try again.".to_string(),
            CommandKind::RemoveLiquidity => {
                "Failed to remove liquidity. Please try again.".to_string()
            }
        },
    }
}

//! Observable state of the current run.

use cpamm_client_domain::CommandKind;
use cpamm_client_protocols::TxHash;

/// Where the orchestrator is in its current (or last) run.
///
/// `Idle -> Building -> StepSubmitted(i) -> StepConfirmed(i) -> ... -> Completed`,
/// with any rejection, timeout or cancellation leading to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run has started yet.
    Idle,
    /// Validating the command and planning its steps.
    Building { command: CommandKind },
    /// Step `index` of `total` is awaiting finality.
    StepSubmitted {
        index: usize,
        total: usize,
        hash: TxHash,
    },
    /// Step `index` of `total` is final.
    StepConfirmed { index: usize, total: usize },
    Completed,
    Failed { step: Option<usize> },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed { .. })
    }

    /// True while a run owns the ledger.
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != RunState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_classification() {
        assert!(!RunState::Idle.is_active());
        assert!(!RunState::Idle.is_terminal());
        assert!(RunState::Building { command: CommandKind::Swap }.is_active());
        assert!(RunState::StepConfirmed { index: 0, total: 2 }.is_active());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed { step: Some(1) }.is_terminal());
    }
}

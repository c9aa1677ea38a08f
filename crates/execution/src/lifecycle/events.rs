//! Lifecycle events for orchestration runs.

use cpamm_client_protocols::TxHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEventType {
    /// Run accepted and its steps planned.
    RunStarted,
    /// A step was handed to the ledger.
    StepSubmitted,
    /// A step reached finality as confirmed.
    StepConfirmed,
    /// A step was rejected or timed out.
    StepFailed,
    /// All steps confirmed and the snapshot refreshed.
    RunCompleted,
    /// The run ended without completing.
    RunFailed,
}

/// A lifecycle event of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// Event ID.
    pub id: String,
    /// Run the event belongs to.
    pub run_id: Uuid,
    /// Event type.
    pub event_type: RunEventType,
    /// Step index, for step events.
    pub step_index: Option<usize>,
    /// Transaction hash, once known.
    pub tx_hash: Option<TxHash>,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Free-form detail such as a rejection reason.
    pub detail: Option<String>,
}

impl RunEvent {
    /// Creates a new run event.
    pub fn new(event_type: RunEventType, run_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            run_id,
            event_type,
            step_index: None,
            tx_hash: None,
            timestamp: chrono::Utc::now(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_step(mut self, index: usize) -> Self {
        self.step_index = Some(index);
        self
    }

    /// Sets the transaction hash.
    #[must_use]
    pub fn with_tx_hash(mut self, hash: TxHash) -> Self {
        self.tx_hash = Some(hash);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_event_creation() {
        let run_id = Uuid::new_v4();
        let event = RunEvent::new(RunEventType::StepSubmitted, run_id)
            .with_step(1)
            .with_tx_hash(TxHash::from_low_u64_be(9));

        assert_eq!(event.run_id, run_id);
        assert_eq!(event.step_index, Some(1));
        assert!(event.detail.is_none());
    }
}

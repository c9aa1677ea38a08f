//! Lifecycle tracker for run history.

use super::{RunEvent, RunEventType};
use crate::error::{ExecutionError, RunFailure};
use cpamm_client_domain::{Command, OperationStatus, PendingOperation};
use cpamm_client_protocols::TxHash;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// One planned step and what became of it.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// The ledger write.
    pub operation: PendingOperation,
    /// Current status.
    pub status: OperationStatus,
    /// Transaction hash once submitted.
    pub tx_hash: Option<TxHash>,
    /// Block the step was confirmed in.
    pub block: Option<u64>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Still executing.
    InProgress,
    /// Every step confirmed.
    Completed,
    /// Stopped early.
    Failed {
        /// User-facing message.
        message: String,
        /// Step that failed, if any.
        failed_step: Option<usize>,
    },
}

/// Summary of a run's lifecycle.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Run ID.
    pub run_id: Uuid,
    /// Command that started the run.
    pub command: Command,
    /// When the run started.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When the run ended.
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Planned steps in order.
    pub steps: Vec<StepRecord>,
    /// Outcome so far.
    pub outcome: RunOutcome,
}

/// Runs kept by [`RunTracker::new`].
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Tracks lifecycle events for the most recent runs of a session.
pub struct RunTracker {
    /// Events by run.
    events: Arc<RwLock<HashMap<Uuid, Vec<RunEvent>>>>,
    /// Run summaries.
    summaries: Arc<RwLock<HashMap<Uuid, RunSummary>>>,
    /// Run ids in start order.
    order: Arc<RwLock<Vec<Uuid>>>,
    /// Finished runs beyond this count are pruned, oldest first.
    max_runs: usize,
}

impl RunTracker {
    /// Creates a new run tracker keeping [`DEFAULT_HISTORY_LIMIT`] runs.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Creates a run tracker keeping at most `max_runs` runs.
    #[must_use]
    pub fn with_limit(max_runs: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            summaries: Arc::new(RwLock::new(HashMap::new())),
            order: Arc::new(RwLock::new(Vec::new())),
            max_runs,
        }
    }

    /// Records a run start with its planned steps.
    pub async fn record_run_started(&self, run_id: Uuid, command: Command, plan: &[PendingOperation]) {
        let event = RunEvent::new(RunEventType::RunStarted, run_id)
            .with_detail(command.kind().to_string());
        let started_at = event.timestamp;
        self.add_event(event).await;

        let summary = RunSummary {
            run_id,
            command,
            started_at,
            finished_at: None,
            steps: plan
                .iter()
                .map(|operation| StepRecord {
                    operation: *operation,
                    status: OperationStatus::Created,
                    tx_hash: None,
                    block: None,
                })
                .collect(),
            outcome: RunOutcome::InProgress,
        };
        self.summaries.write().await.insert(run_id, summary);
        self.order.write().await.push(run_id);
        self.prune(self.max_runs).await;
    }

    /// Drops the oldest finished runs until at most `keep` runs remain.
    ///
    /// Runs still in progress are never dropped. Returns the number removed.
    pub async fn prune(&self, keep: usize) -> usize {
        let mut summaries = self.summaries.write().await;
        if summaries.len() <= keep {
            return 0;
        }

        let mut order = self.order.write().await;
        let excess = summaries.len() - keep;
        let removed: Vec<Uuid> = order
            .iter()
            .filter(|run_id| {
                summaries
                    .get(*run_id)
                    .is_some_and(|s| s.outcome != RunOutcome::InProgress)
            })
            .take(excess)
            .copied()
            .collect();

        let mut events = self.events.write().await;
        for run_id in &removed {
            summaries.remove(run_id);
            events.remove(run_id);
        }
        order.retain(|run_id| !removed.contains(run_id));

        if !removed.is_empty() {
            debug!(removed = removed.len(), "Pruned run history");
        }
        removed.len()
    }

    /// Records a step handed to the ledger.
    pub async fn record_step_submitted(&self, run_id: Uuid, index: usize, hash: TxHash) {
        self.add_event(
            RunEvent::new(RunEventType::StepSubmitted, run_id)
                .with_step(index)
                .with_tx_hash(hash),
        )
        .await;

        self.update_step(run_id, index, |step| {
            step.status = OperationStatus::Submitted;
            step.tx_hash = Some(hash);
        })
        .await;
    }

    /// Records a step confirmed at `block`.
    pub async fn record_step_confirmed(&self, run_id: Uuid, index: usize, block: u64) {
        self.add_event(
            RunEvent::new(RunEventType::StepConfirmed, run_id)
                .with_step(index)
                .with_detail(format!("block {block}")),
        )
        .await;

        self.update_step(run_id, index, |step| {
            step.status = OperationStatus::Confirmed;
            step.block = Some(block);
        })
        .await;
    }

    /// Records a completed run.
    pub async fn record_run_completed(&self, run_id: Uuid) {
        let event = RunEvent::new(RunEventType::RunCompleted, run_id);
        let finished_at = event.timestamp;
        self.add_event(event).await;

        if let Some(summary) = self.summaries.write().await.get_mut(&run_id) {
            summary.finished_at = Some(finished_at);
            summary.outcome = RunOutcome::Completed;
        }
    }

    /// Records a failed run, marking the step that was rejected or timed out.
    ///
    /// A cancelled step was never submitted and stays `Created`.
    pub async fn record_run_failed(&self, run_id: Uuid, failure: &RunFailure) {
        if let Some(index) = failure.failed_step {
            let step_failed = matches!(
                failure.error,
                ExecutionError::StepRejected { .. } | ExecutionError::FinalityTimeout { .. }
            );

            if step_failed {
                self.add_event(
                    RunEvent::new(RunEventType::StepFailed, run_id)
                        .with_step(index)
                        .with_detail(failure.error.to_string()),
                )
                .await;
                self.update_step(run_id, index, |step| step.status = OperationStatus::Failed)
                    .await;
            }
        }

        let event =
            RunEvent::new(RunEventType::RunFailed, run_id).with_detail(failure.message.clone());
        let finished_at = event.timestamp;
        self.add_event(event).await;

        if let Some(summary) = self.summaries.write().await.get_mut(&run_id) {
            summary.finished_at = Some(finished_at);
            summary.outcome = RunOutcome::Failed {
                message: failure.message.clone(),
                failed_step: failure.failed_step,
            };
        }
    }

    async fn update_step(&self, run_id: Uuid, index: usize, update: impl FnOnce(&mut StepRecord)) {
        if let Some(step) = self
            .summaries
            .write()
            .await
            .get_mut(&run_id)
            .and_then(|summary| summary.steps.get_mut(index))
        {
            update(step);
        }
    }

    /// Adds an event to the tracker.
    async fn add_event(&self, event: RunEvent) {
        debug!(run_id = %event.run_id, event = ?event.event_type, step = ?event.step_index, "Run event");
        let mut events = self.events.write().await;
        events.entry(event.run_id).or_default().push(event);
    }

    /// Gets all events for a run.
    pub async fn get_events(&self, run_id: &Uuid) -> Vec<RunEvent> {
        self.events
            .read()
            .await
            .get(run_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Gets the summary for a run.
    pub async fn get_summary(&self, run_id: &Uuid) -> Option<RunSummary> {
        self.summaries.read().await.get(run_id).cloned()
    }

    /// Gets all summaries, oldest first.
    pub async fn get_all_summaries(&self) -> Vec<RunSummary> {
        let summaries = self.summaries.read().await;
        let order = self.order.read().await;
        order
            .iter()
            .filter_map(|run_id| summaries.get(run_id).cloned())
            .collect()
    }

    /// Gets the most recently started run.
    pub async fn latest(&self) -> Option<RunSummary> {
        let summaries = self.summaries.read().await;
        let order = self.order.read().await;
        order
            .last()
            .and_then(|run_id| summaries.get(run_id).cloned())
    }

    /// Gets aggregate statistics.
    pub async fn get_aggregate_stats(&self) -> AggregateStats {
        let summaries = self.summaries.read().await;

        let mut stats = AggregateStats::default();
        for summary in summaries.values() {
            stats.total_runs += 1;
            match summary.outcome {
                RunOutcome::InProgress => stats.in_progress += 1,
                RunOutcome::Completed => stats.completed += 1,
                RunOutcome::Failed { .. } => stats.failed += 1,
            }
            stats.steps_confirmed += summary
                .steps
                .iter()
                .filter(|s| s.status == OperationStatus::Confirmed)
                .count() as u32;
        }

        stats
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate statistics across all runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Runs recorded.
    pub total_runs: u32,
    /// Runs still executing.
    pub in_progress: u32,
    /// Runs that completed.
    pub completed: u32,
    /// Runs that failed.
    pub failed: u32,
    /// Confirmed steps across all runs.
    pub steps_confirmed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpamm_client_domain::CommandKind;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_tracker() {
        let tracker = RunTracker::new();
        let run_id = Uuid::new_v4();
        let command = Command::add_liquidity("5", "5").unwrap();

        tracker
            .record_run_started(run_id, command, &command.plan())
            .await;
        tracker
            .record_step_submitted(run_id, 0, TxHash::from_low_u64_be(1))
            .await;
        tracker.record_step_confirmed(run_id, 0, 10).await;
        tracker
            .record_step_submitted(run_id, 1, TxHash::from_low_u64_be(2))
            .await;

        let failure = RunFailure::new(
            CommandKind::AddLiquidity,
            ExecutionError::StepRejected {
                step_index: 1,
                reason: "denied".to_string(),
            },
        );
        tracker.record_run_failed(run_id, &failure).await;

        let summary = tracker.get_summary(&run_id).await.unwrap();
        let statuses: Vec<_> = summary.steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            [
                OperationStatus::Confirmed,
                OperationStatus::Failed,
                OperationStatus::Created
            ]
        );
        assert_eq!(
            summary.outcome,
            RunOutcome::Failed {
                message: "denied".to_string(),
                failed_step: Some(1)
            }
        );

        let events = tracker.get_events(&run_id).await;
        assert_eq!(events.len(), 6);
        assert_eq!(events.last().unwrap().event_type, RunEventType::RunFailed);

        let stats = tracker.get_aggregate_stats().await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.steps_confirmed, 1);
    }

    #[tokio::test]
    async fn test_completed_run() {
        let tracker = RunTracker::new();
        let run_id = Uuid::new_v4();
        let command = Command::remove_liquidity("1").unwrap();

        tracker
            .record_run_started(run_id, command, &command.plan())
            .await;
        tracker
            .record_step_submitted(run_id, 0, TxHash::from_low_u64_be(1))
            .await;
        tracker.record_step_confirmed(run_id, 0, 3).await;
        tracker.record_run_completed(run_id).await;

        let latest = tracker.latest().await.unwrap();
        assert_eq!(latest.run_id, run_id);
        assert_eq!(latest.outcome, RunOutcome::Completed);
        assert!(latest.finished_at.is_some());
        assert_eq!(latest.steps[0].block, Some(3));
    }

    #[tokio::test]
    async fn test_refused_submission_marks_step_failed() {
        let tracker = RunTracker::new();
        let run_id = Uuid::new_v4();
        let command = Command::remove_liquidity("1").unwrap();

        tracker
            .record_run_started(run_id, command, &command.plan())
            .await;
        let failure = RunFailure::new(
            CommandKind::RemoveLiquidity,
            ExecutionError::StepRejected {
                step_index: 0,
                reason: "user rejected transaction".to_string(),
            },
        );
        tracker.record_run_failed(run_id, &failure).await;

        let summary = tracker.get_summary(&run_id).await.unwrap();
        assert_eq!(summary.steps[0].status, OperationStatus::Failed);
        let types: Vec<_> = tracker
            .get_events(&run_id)
            .await
            .iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            types,
            [
                RunEventType::RunStarted,
                RunEventType::StepFailed,
                RunEventType::RunFailed
            ]
        );
    }

    #[tokio::test]
    async fn test_timeout_and_cancel_step_status() {
        let tracker = RunTracker::new();
        let command = Command::swap("1", cpamm_client_domain::SwapDirection::Token1ToToken2).unwrap();

        let timed_out = Uuid::new_v4();
        tracker
            .record_run_started(timed_out, command, &command.plan())
            .await;
        tracker
            .record_step_submitted(timed_out, 0, TxHash::from_low_u64_be(1))
            .await;
        let failure = RunFailure::new(
            CommandKind::Swap,
            ExecutionError::FinalityTimeout {
                step_index: 0,
                timeout: Duration::from_secs(1),
            },
        );
        tracker.record_run_failed(timed_out, &failure).await;
        let summary = tracker.get_summary(&timed_out).await.unwrap();
        assert_eq!(summary.steps[0].status, OperationStatus::Failed);

        let cancelled = Uuid::new_v4();
        tracker
            .record_run_started(cancelled, command, &command.plan())
            .await;
        let failure = RunFailure::new(CommandKind::Swap, ExecutionError::Cancelled { step_index: 0 });
        tracker.record_run_failed(cancelled, &failure).await;
        let summary = tracker.get_summary(&cancelled).await.unwrap();
        assert_eq!(summary.steps[0].status, OperationStatus::Created);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let tracker = RunTracker::with_limit(2);
        let command = Command::remove_liquidity("1").unwrap();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let run_id = Uuid::new_v4();
            tracker
                .record_run_started(run_id, command, &command.plan())
                .await;
            tracker.record_run_completed(run_id).await;
            ids.push(run_id);
        }

        assert_eq!(tracker.get_all_summaries().await.len(), 2);
        assert!(tracker.get_summary(&ids[0]).await.is_none());
        assert!(tracker.get_events(&ids[0]).await.is_empty());
        assert!(tracker.get_summary(&ids[2]).await.is_some());

        // in-progress runs survive pruning
        let running = Uuid::new_v4();
        tracker
            .record_run_started(running, command, &command.plan())
            .await;
        assert_eq!(tracker.get_all_summaries().await.len(), 2);
        assert_eq!(tracker.prune(0).await, 1);
        assert_eq!(tracker.latest().await.unwrap().run_id, running);
    }
}

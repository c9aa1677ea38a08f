//! Orchestrator executing user commands against the ledger.

use super::RunState;
use crate::config::{OrchestratorConfig, PoolConfig};
use crate::error::{ExecutionError, RunFailure};
use crate::lifecycle::RunTracker;
use crate::session::Session;
use crate::snapshot::{PublishedSnapshot, SnapshotStore, refresh_snapshot};
use cpamm_client_domain::{Command, PendingOperation, Snapshot};
use cpamm_client_protocols::{Connection, Finality, Identity, LedgerClient};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of [`Orchestrator::run`]: the refreshed snapshot, or why the run stopped.
pub type RunResult = Result<Snapshot, RunFailure>;

/// Sequences the ledger writes of user commands.
///
/// Owns the published snapshot and the in-flight flag. At most one run
/// executes at a time; a second `run` while one is active fails with
/// [`ExecutionError::OrchestrationBusy`] instead of queueing.
pub struct Orchestrator {
    /// Wallet session.
    session: Arc<Session>,
    /// Pool and token addresses.
    pool: PoolConfig,
    /// Configuration.
    config: OrchestratorConfig,
    /// Held for the whole duration of a run, and by manual refreshes.
    in_flight: Mutex<()>,
    /// Last published snapshot.
    snapshots: SnapshotStore,
    /// Current run state.
    state: watch::Sender<RunState>,
    /// Set by `cancel`, checked before each submission.
    cancel_requested: AtomicBool,
    /// Run history.
    lifecycle: Arc<RunTracker>,
}

impl Orchestrator {
    /// Creates a new orchestrator over an existing session.
    pub fn new(session: Arc<Session>, pool: PoolConfig, config: OrchestratorConfig) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            session,
            pool,
            config,
            in_flight: Mutex::new(()),
            snapshots: SnapshotStore::new(),
            state,
            cancel_requested: AtomicBool::new(false),
            lifecycle: Arc::new(RunTracker::new()),
        }
    }

    /// Gets the session.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Gets the pool configuration.
    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    /// Gets the lifecycle tracker.
    pub fn lifecycle(&self) -> &Arc<RunTracker> {
        &self.lifecycle
    }

    /// Connects the wallet and publishes a first snapshot.
    pub async fn connect(&self) -> Result<Snapshot, ExecutionError> {
        self.session.connect().await?;
        self.refresh().await
    }

    /// Closes the wallet session and forgets the published snapshot.
    ///
    /// An in-flight run submits nothing further and publishes nothing.
    pub async fn disconnect(&self) {
        self.session.disconnect().await;
        self.on_session_closed();
    }

    /// Forwards a wallet network change; clears the snapshot if the session was dropped.
    pub async fn handle_network_change(&self, chain_id: u64) -> bool {
        let dropped = self.session.handle_network_change(chain_id).await;
        if dropped {
            self.on_session_closed();
        }
        dropped
    }

    fn on_session_closed(&self) {
        self.snapshots.clear();
        if self.is_running() {
            self.cancel_requested.store(true, Ordering::SeqCst);
            info!("Session closed, stopping in-flight run");
        }
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.snapshots.current().map(|published| published.snapshot)
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<PublishedSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Receiver notified on every run state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    /// Stops the in-flight run before its next submission.
    ///
    /// Steps already handed to the ledger are not withdrawn. Returns `false`
    /// when no run is in flight.
    pub fn cancel(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.cancel_requested.store(true, Ordering::SeqCst);
        info!("Cancellation requested for in-flight run");
        true
    }

    /// Re-reads the pool state and publishes it.
    ///
    /// Waits for an in-flight run to finish first. On failure the previously
    /// published snapshot is kept.
    pub async fn refresh(&self) -> Result<Snapshot, ExecutionError> {
        let _guard = self.in_flight.lock().await;
        let connection = self
            .session
            .connection()
            .await
            .ok_or(ExecutionError::NotConnected)?;
        self.refresh_and_publish(&connection).await
    }

    /// Executes `command` step by step and returns the refreshed snapshot.
    pub async fn run(&self, command: Command) -> RunResult {
        let kind = command.kind();
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!(command = %kind, "Run rejected, another run is in flight");
            return Err(RunFailure::new(kind, ExecutionError::OrchestrationBusy));
        };

        self.cancel_requested.store(false, Ordering::SeqCst);
        self.set_state(RunState::Building { command: kind });

        let run_id = Uuid::new_v4();
        let plan = command.plan();
        self.lifecycle
            .record_run_started(run_id, command, &plan)
            .await;

        info!(
            run_id = %run_id,
            command = %kind,
            steps = plan.len(),
            "Starting run"
        );

        let result = self
            .execute(run_id, &command, &plan)
            .await
            .map_err(|e| RunFailure::new(kind, e));

        match &result {
            Ok(snapshot) => {
                self.lifecycle.record_run_completed(run_id).await;
                self.set_state(RunState::Completed);
                info!(
                    run_id = %run_id,
                    command = %kind,
                    pool_share = %snapshot.pool_share_percent(),
                    "Run completed"
                );
            }
            Err(failure) => {
                self.lifecycle.record_run_failed(run_id, failure).await;
                self.set_state(RunState::Failed {
                    step: failure.failed_step,
                });
                error!(
                    run_id = %run_id,
                    command = %kind,
                    failed_step = ?failure.failed_step,
                    error = %failure.error,
                    "Run failed"
                );
            }
        }

        result
    }

    async fn execute(
        &self,
        run_id: Uuid,
        command: &Command,
        plan: &[PendingOperation],
    ) -> Result<Snapshot, ExecutionError> {
        let connection = self
            .session
            .connection()
            .await
            .ok_or(ExecutionError::NotConnected)?;
        self.check_preconditions(command, &connection.identity)?;

        let total = plan.len();
        for (index, operation) in plan.iter().enumerate() {
            self.ensure_session(&connection.identity).await?;
            if self.cancel_requested.swap(false, Ordering::SeqCst) {
                info!(run_id = %run_id, step = index, "Run cancelled before submission");
                return Err(ExecutionError::Cancelled { step_index: index });
            }

            self.execute_step(run_id, connection.ledger.as_ref(), index, total, operation)
                .await?;
        }

        self.refresh_and_publish(&connection).await
    }

    /// Local checks; the ledger stays authoritative.
    fn check_preconditions(
        &self,
        command: &Command,
        identity: &Identity,
    ) -> Result<(), ExecutionError> {
        command.validate()?;

        if let Command::RemoveLiquidity { shares } = command
            && let Some(snapshot) = self.snapshots.current_for(identity.address)
            && *shares > snapshot.caller_shares
        {
            return Err(ExecutionError::InvalidInput(format!(
                "Cannot remove {} shares, only {} held",
                shares, snapshot.caller_shares
            )));
        }

        Ok(())
    }

    /// Submits one step and waits for its finality.
    async fn execute_step(
        &self,
        run_id: Uuid,
        ledger: &dyn LedgerClient,
        index: usize,
        total: usize,
        operation: &PendingOperation,
    ) -> Result<(), ExecutionError> {
        debug!(run_id = %run_id, step = index, operation = %operation, "Submitting step");

        let submitted = match *operation {
            PendingOperation::Approve { token, amount } => {
                ledger
                    .approve(
                        self.pool.tokens.address_of(token),
                        self.pool.pool_address,
                        amount,
                    )
                    .await
            }
            PendingOperation::Swap { amount, direction } => {
                ledger.swap(amount, direction.token1_in()).await
            }
            PendingOperation::AddLiquidity { amount1, amount2 } => {
                ledger.add_liquidity(amount1, amount2).await
            }
            PendingOperation::RemoveLiquidity { shares } => ledger.remove_liquidity(shares).await,
        };

        let handle = submitted.map_err(|e| {
            warn!(run_id = %run_id, step = index, error = %e, "Step submission refused");
            ExecutionError::StepRejected {
                step_index: index,
                reason: e.reason().to_string(),
            }
        })?;

        let hash = handle.hash();
        self.set_state(RunState::StepSubmitted { index, total, hash });
        self.lifecycle
            .record_step_submitted(run_id, index, hash)
            .await;
        info!(
            run_id = %run_id,
            step = index,
            operation = %operation,
            hash = ?hash,
            "Step submitted, awaiting finality"
        );

        match timeout(self.config.finality_timeout, handle.await_finality()).await {
            Ok(Finality::Confirmed { block }) => {
                self.lifecycle
                    .record_step_confirmed(run_id, index, block)
                    .await;
                self.set_state(RunState::StepConfirmed { index, total });
                info!(run_id = %run_id, step = index, block, "Step confirmed");
                Ok(())
            }
            Ok(Finality::Rejected { reason }) => {
                warn!(run_id = %run_id, step = index, reason = %reason, "Step rejected by ledger");
                Err(ExecutionError::StepRejected {
                    step_index: index,
                    reason,
                })
            }
            Err(_) => {
                warn!(
                    run_id = %run_id,
                    step = index,
                    timeout = ?self.config.finality_timeout,
                    "Step finality timed out"
                );
                Err(ExecutionError::FinalityTimeout {
                    step_index: index,
                    timeout: self.config.finality_timeout,
                })
            }
        }
    }

    async fn refresh_and_publish(&self, connection: &Connection) -> Result<Snapshot, ExecutionError> {
        let identity = connection.identity;
        let snapshot = refresh_snapshot(connection.ledger.as_ref(), &identity).await?;
        self.session
            .if_current(&identity, || self.snapshots.publish(identity.address, snapshot))
            .await
            .ok_or_else(|| {
                warn!(account = ?identity.address, "Session closed during refresh, snapshot dropped");
                ExecutionError::NotConnected
            })?;
        Ok(snapshot)
    }

    /// Fails with `NotConnected` once the session the run started on is gone.
    async fn ensure_session(&self, identity: &Identity) -> Result<(), ExecutionError> {
        if self.session.identity().await.as_ref() != Some(identity) {
            warn!(account = ?identity.address, "Session closed during run");
            return Err(ExecutionError::NotConnected);
        }
        Ok(())
    }

    fn set_state(&self, state: RunState) {
        debug!(state = ?state, "Run state changed");
        self.state.send_replace(state);
    }
}

//! Holder of the last published snapshot.

use chrono::{DateTime, Utc};
use cpamm_client_domain::{Address, Snapshot};
use tokio::sync::watch;
use tracing::debug;

/// A snapshot together with the account it was read for.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedSnapshot {
    pub owner: Address,
    pub snapshot: Snapshot,
    pub refreshed_at: DateTime<Utc>,
}

/// The single published snapshot. Replaced wholesale, never patched.
pub struct SnapshotStore {
    current: watch::Sender<Option<PublishedSnapshot>>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn publish(&self, owner: Address, snapshot: Snapshot) {
        debug!(owner = ?owner, "Publishing snapshot");
        self.current.send_replace(Some(PublishedSnapshot {
            owner,
            snapshot,
            refreshed_at: Utc::now(),
        }));
    }

    pub fn current(&self) -> Option<PublishedSnapshot> {
        self.current.borrow().clone()
    }

    /// The published snapshot, if it was read for `owner`.
    pub fn current_for(&self, owner: Address) -> Option<Snapshot> {
        self.current
            .borrow()
            .as_ref()
            .filter(|published| published.owner == owner)
            .map(|published| published.snapshot)
    }

    pub fn clear(&self) {
        self.current.send_replace(None);
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedSnapshot>> {
        self.current.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::model::{ParameterId, Snapshot};
use crate::stream::SnapshotStream;

/// Outcome bookkeeping across poll cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollHealth {
    /// Whether the most recent cycle produced a snapshot.
    pub last_update_success: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    /// Message of the most recent failure, cleared on success.
    pub last_error: Option<String>,
    pub successes: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
}

/// The snapshot and the health that describes it, replaced together.
#[derive(Debug, Default)]
struct Current {
    snapshot: Option<Arc<Snapshot>>,
    health: PollHealth,
}

/// Single-writer holder of the latest [`Snapshot`] and [`PollHealth`].
///
/// Reads never block and never see a snapshot paired with another cycle's
/// health: both live in one `watch` value. Subscribers are woken through
/// a second channel only after that value is updated. Only the poller
/// writes.
pub struct SnapshotStore {
    current: watch::Sender<Current>,
    updates: watch::Sender<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(Current::default());
        let (updates, _) = watch::channel(None);
        Self { current, updates }
    }

    // ── Readers ──────────────────────────────────────────────────────

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.current.borrow().snapshot.clone()
    }

    pub fn health(&self) -> PollHealth {
        self.current.borrow().health.clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.current.borrow().health.last_update_success
    }

    /// `true` when the last cycle succeeded and returned `id`.
    pub fn is_available(&self, id: ParameterId) -> bool {
        let current = self.current.borrow();
        current.health.last_update_success
            && current
                .snapshot
                .as_ref()
                .is_some_and(|snap| snap.contains(id))
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.updates.subscribe())
    }

    // ── Writers (poller only) ────────────────────────────────────────

    /// Replace the snapshot and record a successful cycle.
    pub(crate) fn publish(&self, snapshot: Arc<Snapshot>) {
        let at = snapshot.received_at();
        self.current.send_modify(|current| {
            current.snapshot = Some(Arc::clone(&snapshot));
            let health = &mut current.health;
            health.last_update_success = true;
            health.last_success_at = Some(at);
            health.last_error = None;
            health.successes += 1;
            health.consecutive_failures = 0;
        });
        self.updates.send_replace(Some(snapshot));
    }

    /// Record a failed cycle. The snapshot is left untouched.
    pub(crate) fn record_failure(&self, message: impl Into<String>) {
        let message = message.into();
        self.current.send_modify(|current| {
            let health = &mut current.health;
            health.last_update_success = false;
            health.last_error = Some(message);
            health.failures += 1;
            health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        });
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

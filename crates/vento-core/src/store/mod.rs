// ── Snapshot store ──
//
// Latest-value storage for poll results with push-based change
// notification, plus the callback registry the poller notifies.

mod listeners;
mod snapshot_store;

pub use listeners::ListenerHandle;
pub(crate) use listeners::ListenerRegistry;
pub use snapshot_store::{PollHealth, SnapshotStore};

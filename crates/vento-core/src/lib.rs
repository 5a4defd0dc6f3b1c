//! Polling and snapshot layer between `vento-proto` and consumers (CLI).
//!
//! - **[`Poller`]**: owns the polling cadence for one controller. Each
//!   cycle builds a request, sends it through the retrying transport,
//!   decodes the response and publishes a new [`Snapshot`]. Failed cycles
//!   leave the previous snapshot in place. [`Poller::oneshot()`] runs a
//!   single cycle for CLI use.
//!
//! - **[`SnapshotStore`]**: single-writer holder of the latest snapshot
//!   and poll health, backed by `tokio::sync::watch`.
//!
//! - **[`SnapshotStream`]**: subscription handle vended by the poller,
//!   exposing `current()` / `latest()` / `changed()` and a `Stream` adapter.
//!
//! - **[`catalog`]**: display metadata and value formatters keyed by
//!   [`ParameterId`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod poller;
pub mod store;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::{ParameterInfo, format_value};
pub use config::PollerConfig;
pub use error::CoreError;
pub use model::{ParameterId, ParameterValue, Snapshot};
pub use poller::{PollEvent, PollState, Poller};
pub use store::{ListenerHandle, PollHealth, SnapshotStore};
pub use stream::SnapshotStream;

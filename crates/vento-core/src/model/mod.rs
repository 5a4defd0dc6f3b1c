// ── Domain model ──
//
// Identity and value types come straight from the wire layer; the
// snapshot is the unit the poller publishes.

mod snapshot;

pub use snapshot::Snapshot;
pub use vento_proto::{ParameterId, ParameterMap, ParameterValue};

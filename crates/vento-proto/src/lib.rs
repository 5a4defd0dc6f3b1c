//! Wire-level client for VentoExpert ventilation controllers.
//!
//! The controller speaks a small binary protocol over UDP. This crate owns
//! everything that touches bytes:
//!
//! - **[`codec`]**: pure request framing ([`build_request`]) and response
//!   decoding ([`parse_response`]). No I/O, no state.
//! - **[`transport`]**: the [`Transport`] seam and its UDP implementation,
//!   which performs exactly one request/response exchange per call.
//! - **[`retry`]**: [`RetryingTransport`], bounded retries with a fixed
//!   backoff between attempts and cancellation at every suspension point.
//!
//! Polling cadence, snapshot bookkeeping and subscriber fan-out live in
//! `vento-core`.

pub mod codec;
pub mod error;
pub mod param;
pub mod retry;
pub mod transport;

pub use codec::{ParameterMap, RequestFrame, build_request, checksum, parse_response};
pub use error::Error;
pub use param::{ParameterId, ParameterValue, ParseParameterIdError, ValueWidth};
pub use retry::{RetryPolicy, RetryingTransport};
pub use transport::{Transport, UdpTransport};

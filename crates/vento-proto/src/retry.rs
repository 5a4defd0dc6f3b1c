// ── Retry orchestration ──
//
// Wraps a Transport with a bounded number of attempts and a fixed pause
// between them. Both the exchange and the pause observe a cancellation
// token so an owner can abandon a request without waiting it out.

use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::Error;
use crate::transport::Transport;

/// Default number of attempts per logical request.
pub const DEFAULT_ATTEMPTS: u32 = 3;
/// Default pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause after a failed attempt, skipped after the last one.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// A [`Transport`] plus a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingTransport<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Send `frame` until a response arrives or the attempts run out.
    ///
    /// Returns the first non-empty response. After the last failed attempt
    /// returns [`Error::NoResponse`]; if `cancel` fires while waiting,
    /// returns [`Error::Cancelled`]. Errors that are not
    /// [transient](Error::is_transient) end the request at once.
    pub async fn send(&self, frame: &[u8], cancel: &CancellationToken) -> Result<Bytes, Error> {
        let attempts = self.policy.attempts.max(1);

        for attempt in 1..=attempts {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                result = self.transport.exchange(frame) => result,
            };

            match result {
                Ok(data) => {
                    debug!(attempt, len = data.len(), "response received");
                    return Ok(data);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "no response from device");
                }
            }

            if attempt < attempts {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                    () = tokio::time::sleep(self.policy.backoff) => {}
                }
            }
        }

        error!(attempts, "all attempts failed");
        Err(Error::NoResponse { attempts })
    }
}

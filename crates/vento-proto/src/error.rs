use thiserror::Error;

/// Top-level error type for the `vento-proto` crate.
///
/// Every variant produced by a [`Transport`](crate::Transport) is a
/// "no data" outcome for that attempt; the retry layer treats them all the
/// same and only surfaces [`NoResponse`](Error::NoResponse) or
/// [`Cancelled`](Error::Cancelled) to its caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// No datagram arrived before the per-attempt timeout.
    #[error("No response from {addr} within {timeout_ms}ms")]
    Timeout { addr: String, timeout_ms: u64 },

    /// Socket-level failure (bind, send, receive).
    #[error("UDP socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The device answered with a zero-length datagram.
    #[error("Empty datagram from {addr}")]
    EmptyDatagram { addr: String },

    /// Host name did not resolve to any socket address.
    #[error("Cannot resolve {host}:{port}")]
    Resolve { host: String, port: u16 },

    // ── Retry ───────────────────────────────────────────────────────
    /// Every attempt of one logical request came back empty.
    #[error("No response after {attempts} attempt(s)")]
    NoResponse { attempts: u32 },

    /// The caller cancelled the request while it was waiting.
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` for single-attempt failures worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Io(_) | Self::EmptyDatagram { .. } | Self::Resolve { .. }
        )
    }
}

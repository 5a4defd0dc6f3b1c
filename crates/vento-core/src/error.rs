// ── Core error types ──
//
// User-facing errors from vento-core. Consumers never see socket errors
// directly; the `From<vento_proto::Error>` impl folds transport outcomes
// into cycle-level variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    /// Rejected at setup time, before any polling starts.
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// The first refresh after `start()` failed.
    #[error("Device not ready: {source}")]
    NotReady {
        #[source]
        source: Box<CoreError>,
    },

    #[error("Poller is already running")]
    AlreadyRunning,

    // ── Cycle errors ─────────────────────────────────────────────────
    /// Every attempt of one cycle went unanswered.
    #[error("Update failed: no response from device after {attempts} attempt(s)")]
    NoResponse { attempts: u32 },

    /// A response arrived but contained no decodable parameters.
    #[error("Update failed: malformed response ({len} bytes)")]
    MalformedResponse { len: usize },

    /// Single-attempt transport failure that escaped the retry layer.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The poller was stopped while a cycle was waiting.
    #[error("Poller stopped")]
    Cancelled,
}

impl CoreError {
    /// `true` for failures of one poll cycle, which leave the previous
    /// snapshot in place and are retried on the next tick.
    pub fn is_cycle_failure(&self) -> bool {
        matches!(
            self,
            Self::NoResponse { .. } | Self::MalformedResponse { .. } | Self::Transport { .. }
        )
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vento_proto::Error> for CoreError {
    fn from(err: vento_proto::Error) -> Self {
        match err {
            vento_proto::Error::NoResponse { attempts } => Self::NoResponse { attempts },
            vento_proto::Error::Cancelled => Self::Cancelled,
            vento_proto::Error::Resolve { host, port } => {
                Self::invalid("host", format!("cannot resolve {host}:{port}"))
            }
            e @ (vento_proto::Error::Timeout { .. }
            | vento_proto::Error::Io(_)
            | vento_proto::Error::EmptyDatagram { .. }) => Self::Transport {
                message: e.to_string(),
            },
        }
    }
}

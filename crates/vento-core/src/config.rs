// ── Runtime poller configuration ──
//
// Describes *which* controller to poll and how. Carries the password
// but never touches disk; `vento-config` builds one of these from TOML
// profiles and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use vento_proto::codec::{DEVICE_ID_LEN, PASSWORD_LEN};
use vento_proto::retry::{DEFAULT_ATTEMPTS, DEFAULT_BACKOFF};
use vento_proto::transport::{DEFAULT_PORT, DEFAULT_TIMEOUT};
use vento_proto::{ParameterId, RetryPolicy};

use crate::error::CoreError;

/// Factory device id.
pub const DEFAULT_DEVICE_ID: &str = "DEFAULT_DEVICEID";
/// Factory password.
pub const DEFAULT_PASSWORD: &str = "1111";
/// Default polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for polling a single controller.
///
/// Immutable once handed to a [`Poller`](crate::Poller).
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Controller host name or IP address.
    pub host: String,
    /// Controller UDP port.
    pub port: u16,
    /// Device id (up to 16 ASCII characters).
    pub device_id: String,
    /// Device password (up to 4 ASCII characters).
    pub password: SecretString,
    /// Parameters requested every cycle, in request order.
    pub parameters: Vec<ParameterId>,
    /// Time between cycle starts.
    pub interval: Duration,
    /// Attempts per cycle.
    pub retries: u32,
    /// Per-attempt receive timeout.
    pub timeout: Duration,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl PollerConfig {
    /// Factory defaults for the controller at `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            device_id: DEFAULT_DEVICE_ID.into(),
            password: SecretString::from(DEFAULT_PASSWORD),
            parameters: ParameterId::DEFAULTS.to_vec(),
            interval: DEFAULT_INTERVAL,
            retries: DEFAULT_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retries,
            backoff: self.backoff,
        }
    }

    /// Check everything that can be checked without touching the network.
    ///
    /// The codec silently truncates over-long ids and passwords; this is
    /// where such values are rejected instead.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::invalid("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(CoreError::invalid("port", "must be between 1 and 65535"));
        }
        check_field("device_id", &self.device_id, DEVICE_ID_LEN)?;
        check_field("password", self.password.expose_secret(), PASSWORD_LEN)?;
        if self.parameters.is_empty() {
            return Err(CoreError::invalid("parameters", "at least one parameter is required"));
        }
        if self.interval.is_zero() {
            return Err(CoreError::invalid("interval", "must be greater than zero"));
        }
        if self.retries == 0 {
            return Err(CoreError::invalid("retries", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(CoreError::invalid("timeout", "must be greater than zero"));
        }
        Ok(())
    }
}

fn check_field(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    if !value.is_ascii() {
        return Err(CoreError::invalid(field, "must be ASCII"));
    }
    if value.len() > max {
        return Err(CoreError::invalid(
            field,
            format!("at most {max} characters, got {}", value.len()),
        ));
    }
    Ok(())
}

//! Configuration for the vento CLI.
//!
//! TOML device profiles, password resolution (env + plaintext), and
//! translation to `vento_core::PollerConfig`. Layering is defaults →
//! `config.toml` → `VENTO_*` environment variables, with `__` separating
//! nested keys (`VENTO_DEFAULTS__RETRIES=5`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vento_core::{ParameterId, PollerConfig};
use vento_core::catalog::parse_parameter;
use vento_core::config::{DEFAULT_DEVICE_ID, DEFAULT_PASSWORD};

/// Default controller port.
pub const DEFAULT_PORT: u16 = 4000;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown device '{name}' (configured: {available})")]
    UnknownDevice { name: String, available: String },

    #[error("no device selected and no default_device configured")]
    NoDevice,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Device used when `--device` is not given.
    pub default_device: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub devices: HashMap<String, DeviceProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Polling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Attempts per poll.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Per-attempt receive timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            interval: default_interval(),
            retries: default_retries(),
            timeout_ms: default_timeout_ms(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_interval() -> u64 {
    10
}
fn default_retries() -> u32 {
    3
}
fn default_timeout_ms() -> u64 {
    2000
}
fn default_backoff_ms() -> u64 {
    500
}

impl Defaults {
    /// A poller config for `host` carrying these defaults.
    pub fn poller_config(&self, host: impl Into<String>) -> PollerConfig {
        let mut config = PollerConfig::new(host);
        config.interval = Duration::from_secs(self.interval);
        config.retries = self.retries;
        config.timeout = Duration::from_millis(self.timeout_ms);
        config.backoff = Duration::from_millis(self.backoff_ms);
        config
    }
}

/// A named controller profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceProfile {
    /// Controller host name or IP address.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_device_id")]
    pub device_id: String,

    /// Plaintext password; prefer `password_env`.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Parameters to poll, as catalog keys or numeric ids.
    pub parameters: Option<Vec<String>>,

    /// Override polling interval (seconds).
    pub interval: Option<u64>,

    /// Override attempts per poll.
    pub retries: Option<u32>,

    /// Override receive timeout (milliseconds).
    pub timeout_ms: Option<u64>,

    /// Override pause between attempts (milliseconds).
    pub backoff_ms: Option<u64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_device_id() -> String {
    DEFAULT_DEVICE_ID.into()
}

impl DeviceProfile {
    /// A profile for `host` with factory credentials.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            device_id: default_device_id(),
            password: None,
            password_env: None,
            parameters: None,
            interval: None,
            retries: None,
            timeout_ms: None,
            backoff_ms: None,
        }
    }

    /// Resolve the password: `password_env` → plaintext → factory default.
    pub fn resolve_password(&self) -> SecretString {
        if let Some(val) = self
            .password_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
        {
            return SecretString::from(val);
        }
        SecretString::from(self.password.as_deref().unwrap_or(DEFAULT_PASSWORD))
    }

    /// Build a `PollerConfig` from this profile on top of `defaults`.
    ///
    /// Does not validate ranges; `Poller` does that before polling.
    pub fn to_poller_config(&self, defaults: &Defaults) -> Result<PollerConfig, ConfigError> {
        let mut config = defaults.poller_config(self.host.clone());
        config.port = self.port;
        config.device_id.clone_from(&self.device_id);
        config.password = self.resolve_password();

        if let Some(ref params) = self.parameters {
            config.parameters = parse_parameters(params)?;
        }
        if let Some(secs) = self.interval {
            config.interval = Duration::from_secs(secs);
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.backoff_ms {
            config.backoff = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

/// Parse parameter names or ids, rejecting the first bad entry.
pub fn parse_parameters<S: AsRef<str>>(
    inputs: &[S],
) -> Result<Vec<ParameterId>, ConfigError> {
    inputs
        .iter()
        .map(|s| {
            parse_parameter(s.as_ref()).map_err(|e| ConfigError::Validation {
                field: "parameters".into(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl Config {
    /// Resolve a device by name, falling back to `default_device`.
    pub fn device<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a DeviceProfile), ConfigError> {
        let name = name
            .or(self.default_device.as_deref())
            .ok_or(ConfigError::NoDevice)?;
        self.devices
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownDevice {
                name: name.into(),
                available: self.device_names().join(", "),
            })
    }

    /// Configured device names, sorted.
    pub fn device_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "vento", "vento").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vento");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VENTO_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

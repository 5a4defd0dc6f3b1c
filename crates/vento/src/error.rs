//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vento_config::ConfigError;
use vento_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device communication ─────────────────────────────────────────
    #[error("No response from controller after {attempts} attempt(s)")]
    #[diagnostic(
        code(vento::no_response),
        help(
            "Check that the controller is powered, reachable over UDP and on the\n\
             configured port (default 4000). Wrong device id or password also\n\
             results in silence.\n\
             Try: vento read --timeout 5s --retries 5"
        )
    )]
    NoResponse { attempts: u32 },

    #[error("Controller sent a response with no readable parameters ({len} bytes)")]
    #[diagnostic(
        code(vento::malformed_response),
        help("Check the device id and password, and try -vv to see the exchange.")
    )]
    MalformedResponse { len: usize },

    #[error("Transport error: {message}")]
    #[diagnostic(code(vento::transport))]
    Transport { message: String },

    #[error("Interrupted")]
    #[diagnostic(code(vento::interrupted))]
    Interrupted,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vento::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Device '{name}' not found in configuration")]
    #[diagnostic(
        code(vento::device_not_found),
        help(
            "Configured devices: {available}\n\
             Create one with: vento config init --name {name} --host <HOST>"
        )
    )]
    DeviceNotFound { name: String, available: String },

    #[error("No controller selected")]
    #[diagnostic(
        code(vento::no_device),
        help(
            "Pass --host, select a profile with --device, or create a config with:\n\
             vento config init --host <HOST>\n\
             Config path: {path}"
        )
    )]
    NoDevice { path: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(code(vento::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(vento::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(vento::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(vento::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(vento::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoResponse { .. } => exit_code::TIMEOUT,
            Self::Transport { .. } => exit_code::CONNECTION,
            Self::Validation { .. } | Self::NoDevice { .. } | Self::ConfigExists { .. } => {
                exit_code::USAGE
            }
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig { field, reason } => Self::Validation { field, reason },
            CoreError::NotReady { source } => Self::from(*source),
            CoreError::NoResponse { attempts } => Self::NoResponse { attempts },
            CoreError::MalformedResponse { len } => Self::MalformedResponse { len },
            CoreError::Transport { message } => Self::Transport { message },
            CoreError::Cancelled => Self::Interrupted,
            CoreError::AlreadyRunning => Self::Validation {
                field: "poller".into(),
                reason: "already running".into(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownDevice { name, available } => {
                Self::DeviceNotFound { name, available }
            }
            other => Self::Config(Box::new(other)),
        }
    }
}

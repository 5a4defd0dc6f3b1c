//! Clap derive structures for the `vento` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vento -- telemetry poller for VentoExpert ventilation controllers
#[derive(Debug, Parser)]
#[command(
    name = "vento",
    version,
    about = "Read live telemetry from VentoExpert ventilation controllers",
    long_about = "Polls a VentoExpert controller over its binary UDP protocol and\n\
        prints the decoded parameters: power, speed stage, boost, humidity,\n\
        fan speeds and operating mode.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'd', env = "VENTO_DEVICE", global = true)]
    pub device: Option<String>,

    /// Controller host or IP (overrides profile)
    #[arg(long, short = 'H', env = "VENTO_HOST", global = true)]
    pub host: Option<String>,

    /// Controller UDP port
    #[arg(long, env = "VENTO_PORT", global = true)]
    pub port: Option<u16>,

    /// Device id (up to 16 characters)
    #[arg(long, env = "VENTO_DEVICE_ID", global = true)]
    pub device_id: Option<String>,

    /// Device password (up to 4 characters)
    #[arg(long, env = "VENTO_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "VENTO_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Per-attempt receive timeout (e.g. 2s, 500ms)
    #[arg(long, value_parser = humantime::parse_duration, global = true)]
    pub timeout: Option<Duration>,

    /// Attempts per poll
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Config file path [default: platform config dir]
    #[arg(long, env = "VENTO_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain `key=value` lines (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the controller once and print the decoded parameters
    #[command(alias = "r")]
    Read(ReadArgs),

    /// Poll continuously and print every update until Ctrl-C
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// List the known parameters
    #[command(alias = "p")]
    Params,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Poll Arguments ───────────────────────────────────────────────────

/// Which parameters to request.
#[derive(Debug, Args)]
pub struct ParamSelection {
    /// Parameters to request, by key or id (e.g. power,fan1_speed,0x0064)
    #[arg(long = "param", short = 'P', value_delimiter = ',')]
    pub params: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    #[command(flatten)]
    pub selection: ParamSelection,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub selection: ParamSelection,

    /// Time between polls (e.g. 10s, 1m)
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Exit after this many successful updates
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display the resolved configuration (passwords redacted)
    Show,

    /// Write a starter config with one device profile
    Init {
        /// Controller host or IP
        #[arg(long)]
        host: String,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! Command handlers.

pub mod config_cmd;
pub mod params;
pub mod read;
pub mod watch;

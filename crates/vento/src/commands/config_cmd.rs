//! Config subcommand handlers.

use std::collections::HashMap;

use vento_config::{Config, DeviceProfile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = config::load(global)?;
            for profile in cfg.devices.values_mut() {
                if profile.password.is_some() {
                    profile.password = Some(REDACTED.into());
                }
            }
            let rendered = toml::to_string_pretty(&cfg)?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { host, name, force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let cfg = Config {
                default_device: Some(name.clone()),
                devices: HashMap::from([(name, DeviceProfile::new(host))]),
                ..Config::default()
            };
            let written = match global.config {
                Some(ref path) => {
                    vento_config::save_config_to(&cfg, path)?;
                    path.clone()
                }
                None => vento_config::save_config(&cfg)?,
            };

            if !global.quiet {
                eprintln!("Wrote {}", written.display());
            }
            Ok(())
        }
    }
}

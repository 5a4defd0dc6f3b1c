//! CLI-specific configuration glue.
//!
//! Loading and profile types live in `vento-config`; this module layers
//! the global flags on top and picks the output format.

use std::path::PathBuf;

use clap::ValueEnum;
use secrecy::SecretString;

use vento_config::Config;
use vento_core::PollerConfig;

use crate::cli::{GlobalOpts, OutputFormat, ParamSelection};
use crate::error::CliError;

/// Config file in effect: `--config` / `VENTO_CONFIG`, else the platform path.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(vento_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let cfg = match global.config {
        Some(ref path) => vento_config::load_config_from(path)?,
        None => vento_config::load_config()?,
    };
    Ok(cfg)
}

/// Resolve the poller configuration: profile (or bare `--host`), then
/// flag overrides, then an optional parameter selection.
pub fn resolve_poller_config(
    global: &GlobalOpts,
    cfg: &Config,
    selection: &ParamSelection,
) -> Result<PollerConfig, CliError> {
    let mut poller = match (&global.device, &global.host) {
        // Bare host without a profile: config defaults only.
        (None, Some(host)) if cfg.default_device.is_none() => {
            cfg.defaults.poller_config(host.clone())
        }
        (None, None) if cfg.default_device.is_none() => {
            return Err(CliError::NoDevice {
                path: config_path(global).display().to_string(),
            });
        }
        _ => {
            let (name, profile) = cfg.device(global.device.as_deref())?;
            tracing::debug!(device = name, "using device profile");
            profile.to_poller_config(&cfg.defaults)?
        }
    };

    if let Some(ref host) = global.host {
        poller.host.clone_from(host);
    }
    if let Some(port) = global.port {
        poller.port = port;
    }
    if let Some(ref device_id) = global.device_id {
        poller.device_id.clone_from(device_id);
    }
    if let Some(ref password) = global.password {
        poller.password = SecretString::from(password.clone());
    }
    if let Some(timeout) = global.timeout {
        poller.timeout = timeout;
    }
    if let Some(retries) = global.retries {
        poller.retries = retries;
    }
    if !selection.params.is_empty() {
        poller.parameters = vento_config::parse_parameters(&selection.params)?;
    }

    Ok(poller)
}

/// Output format: flag, then `defaults.output`, then table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&cfg.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;
    use vento_config::DeviceProfile;
    use vento_core::ParameterId;

    use super::*;
    use crate::cli::{Cli, Command};

    fn parse(args: &[&str]) -> (GlobalOpts, ParamSelection) {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Read(read) => (cli.global, read.selection),
            other => panic!("expected read, got {other:?}"),
        }
    }

    fn with_profile() -> Config {
        let mut cfg = Config {
            default_device: Some("attic".into()),
            ..Config::default()
        };
        let mut profile = DeviceProfile::new("192.168.1.50");
        profile.password = Some("4321".into());
        cfg.devices.insert("attic".into(), profile);
        cfg
    }

    #[test]
    fn bare_host_uses_defaults() {
        let (global, selection) = parse(&["vento", "--host", "10.0.0.5", "read"]);
        let poller = resolve_poller_config(&global, &Config::default(), &selection).unwrap();

        assert_eq!(poller.host, "10.0.0.5");
        assert_eq!(poller.port, 4000);
        assert_eq!(poller.password.expose_secret(), "1111");
        assert_eq!(poller.parameters, ParameterId::DEFAULTS.to_vec());
    }

    #[test]
    fn nothing_selected_is_an_error() {
        let (global, selection) = parse(&["vento", "read"]);
        let err = resolve_poller_config(&global, &Config::default(), &selection).unwrap_err();
        assert!(matches!(err, CliError::NoDevice { .. }));
    }

    #[test]
    fn flags_override_profile() {
        let (global, selection) = parse(&[
            "vento",
            "--port",
            "4100",
            "--password",
            "0000",
            "--retries",
            "1",
            "read",
            "-P",
            "humidity",
        ]);
        let poller = resolve_poller_config(&global, &with_profile(), &selection).unwrap();

        assert_eq!(poller.host, "192.168.1.50");
        assert_eq!(poller.port, 4100);
        assert_eq!(poller.password.expose_secret(), "0000");
        assert_eq!(poller.retries, 1);
        assert_eq!(poller.parameters, vec![ParameterId::HUMIDITY]);
    }

    #[test]
    fn unknown_profile_is_reported() {
        let (global, selection) = parse(&["vento", "-d", "garage", "read"]);
        let err = resolve_poller_config(&global, &with_profile(), &selection).unwrap_err();
        assert!(matches!(err, CliError::DeviceNotFound { ref name, .. } if name == "garage"));
    }

    #[test]
    fn output_falls_back_to_config() {
        let (global, _) = parse(&["vento", "read"]);
        let mut cfg = Config::default();
        assert_eq!(output_format(&global, &cfg), OutputFormat::Table);

        cfg.defaults.output = "json-compact".into();
        assert_eq!(output_format(&global, &cfg), OutputFormat::JsonCompact);
    }
}

//! `vento read`: poll once and print.

use vento_core::Poller;

use crate::cli::{GlobalOpts, ReadArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ReadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let poller_config = config::resolve_poller_config(global, &cfg, &args.selection)?;
    let format = config::output_format(global, &cfg);

    tracing::debug!(
        host = %poller_config.host,
        port = poller_config.port,
        params = poller_config.parameters.len(),
        "reading"
    );
    let snapshot = Poller::oneshot(poller_config).await?;

    output::print_output(&output::render_snapshot(format, &snapshot)?, global.quiet);
    Ok(())
}

//! `vento params`: list the parameter catalog.

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let format = config::output_format(global, &cfg);
    output::print_output(&output::render_catalog(format)?, global.quiet);
    Ok(())
}

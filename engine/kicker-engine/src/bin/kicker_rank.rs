//! # Kicker Rank Binary
//!
//! Command-line front end for the ranking pipeline.

use anyhow::Result;
use clap::Parser;
use kicker_engine::cli::{Cli, CliHandler};
use kicker_engine::logging::initialize_from_config;
use kicker_engine::RankerConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RankerConfig::load(cli.config.as_deref())?;
    initialize_from_config(&config.logging)?;
    tracing::debug!("Kicker engine v{} starting", kicker_engine::VERSION);

    let handler = CliHandler::new(config);
    handler.handle_command(cli.command)?;

    Ok(())
}

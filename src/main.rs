mod agents;
mod cli;
mod config;
mod error;
mod host;
mod logging;
mod manifest;
mod utils;
mod workflow;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use config::UpdaterConfig;
use host::HostFactory;
use jiff::Timestamp;
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    if let Err(e) = run(&cli) {
        tracing::debug!(cause = ?e.root(), "update failed");
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> error::Result<()> {
    let config = UpdaterConfig::from_cli(cli)?;
    let host = HostFactory::create(&config)?;
    workflow::execute_update(&config, host.as_ref(), Timestamp::now())?;
    Ok(())
}

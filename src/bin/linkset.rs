//! Linkset CLI Binary
//!
//! Command-line interface for the linkset asset-group manager.

use anyhow::Context;
use clap::Parser;
use linkset::logging;
use linkset::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut context = CliContext::new(cli.workspace.clone(), cli.config.clone())
        .context("failed to initialize workspace")?;

    let logging_config = context.logging_config(&cli);
    logging::init_logging(Some(&logging_config)).context("failed to initialize logging")?;

    let output = context.execute(&cli.command)?;
    println!("{}", output);
    Ok(())
}

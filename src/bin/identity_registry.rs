//! Identity Registry CLI Binary

use anyhow::Context;
use clap::Parser;
use identity_registry::config::ConfigLoader;
use identity_registry::logging::init_logging;
use identity_registry::tooling::cli::{Cli, CliContext};
use identity_registry::{ApiError, RegistryError};
use std::process;

fn run(cli: Cli) -> anyhow::Result<String> {
    let mut config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(output) = cli.log_output {
        config.logging.output = output;
    }
    init_logging(Some(&config.logging)).context("Failed to initialize logging")?;

    let context = CliContext::new(&config, cli.store, cli.caller)
        .context("Failed to open registry")?;
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(ApiError::Registry(RegistryError::Storage(inner))) => {
                    eprintln!("Error: {}", inner);
                }
                Some(ApiError::Registry(registry_error)) => {
                    eprintln!("Error [{}]: {}", registry_error.code(), registry_error);
                }
                _ => eprintln!("Error: {:#}", e),
            }
            process::exit(1);
        }
    }
}

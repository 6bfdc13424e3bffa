//! Configuration command implementations

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::OutputFormat;
use crate::cli::commands::print_structured;
use crate::config::FanoutConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the merged configuration
    Show,
}

/// Execute config commands
pub fn execute(args: ConfigArgs, config: FanoutConfig, format: OutputFormat) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show(&config, format),
    }
}

fn show(config: &FanoutConfig, format: OutputFormat) -> Result<()> {
    let merged = config.get_full_config()?;
    if !print_structured(&merged, format)? {
        print!("{}", toml::to_string_pretty(&merged)?);
    }
    Ok(())
}

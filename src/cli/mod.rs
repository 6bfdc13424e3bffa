//! Command-line interface for fanout
//!
//! Each scenario is its own subcommand and runs with no flags at all, using
//! the configured defaults. Scenario flags override single config values.
//! Per-input failures are part of the printed report and never change the
//! exit code.

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};

mod commands;
mod output;

pub use output::Output;

use crate::config::FanoutConfig;

/// fanout - compare sequential and concurrent execution of small batches
#[derive(Parser)]
#[command(name = "fanout", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Units that only sleep: sequential vs. one thread per unit
    Sleep(commands::sleep::SleepArgs),
    /// HTTP page downloads: sequential vs. one task per URL
    Fetch(commands::fetch::FetchArgs),
    /// Concurrent downloads followed by a pooled table transform
    Pipeline(commands::pipeline::PipelineArgs),
    /// Configuration management
    Config(commands::config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);

        let output = Output::new(self.verbose > 0, self.quiet);
        let config = FanoutConfig::load_with_custom_config(self.config.as_deref())?;

        match self.command {
            Some(Commands::Sleep(args)) => {
                commands::sleep::execute(args, config, self.format, &output).await
            }
            Some(Commands::Fetch(args)) => {
                commands::fetch::execute(args, config, self.format, &output).await
            }
            Some(Commands::Pipeline(args)) => {
                commands::pipeline::execute(args, config, self.format, &output).await
            }
            Some(Commands::Config(args)) => commands::config::execute(args, config, self.format),
            None => {
                // Show help when no command is provided
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,hyper=warn,reqwest=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"), // -vvv shows everything including hyper
        }
    });

    // Logs go to stderr so json/yaml reports on stdout stay parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(verbose > 1)
        .with_writer(std::io::stderr)
        .init();
}

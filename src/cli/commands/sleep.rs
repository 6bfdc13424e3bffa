//! `fanout sleep`

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::commands::{numbered, print_comparison, print_structured};
use crate::cli::{Output, OutputFormat};
use crate::config::FanoutConfig;
use crate::scenarios;

#[derive(Args, Debug, Default, Serialize)]
pub struct SleepArgs {
    /// Number of units to run
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<usize>,

    /// How long each unit sleeps, in milliseconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

pub async fn execute(
    args: SleepArgs,
    config: FanoutConfig,
    format: OutputFormat,
    output: &Output,
) -> Result<()> {
    let settings = config.with_overrides("sleep", &args).sleep()?;
    let labels = numbered((1..=settings.tasks).map(|unit| format!("unit {unit}")));

    if format == OutputFormat::Text {
        output.header(&format!(
            "Sleep: {} units, {} ms each",
            settings.tasks, settings.delay_ms
        ));
    }

    let comparison = tokio::task::spawn_blocking(move || scenarios::sleep::run(&settings))
        .await
        .context("Sleep scenario stopped unexpectedly")??;

    if print_structured(&comparison, format)? {
        return Ok(());
    }
    print_comparison(output, &comparison, &labels, |unit| {
        format!("woke up (unit {unit})")
    });
    Ok(())
}

//! `fanout fetch`

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::commands::{numbered, print_comparison, print_structured};
use crate::cli::{Output, OutputFormat};
use crate::config::FanoutConfig;
use crate::scenarios;

#[derive(Args, Debug, Default, Serialize)]
pub struct FetchArgs {
    /// URLs to download instead of the configured list
    #[arg(value_name = "URL")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

pub async fn execute(
    args: FetchArgs,
    config: FanoutConfig,
    format: OutputFormat,
    output: &Output,
) -> Result<()> {
    let settings = config.with_overrides("fetch", &args).fetch()?;

    if format == OutputFormat::Text {
        output.header(&format!(
            "Fetch: {} URLs, {} s timeout",
            settings.urls.len(),
            settings.timeout_secs
        ));
    }

    let comparison = scenarios::fetch::run(&settings).await?;

    if print_structured(&comparison, format)? {
        return Ok(());
    }
    let labels = numbered(settings.urls.iter().cloned());
    print_comparison(output, &comparison, &labels, |page| {
        format!("{} bytes", page.bytes)
    });
    Ok(())
}

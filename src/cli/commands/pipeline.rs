//! `fanout pipeline`

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::commands::{numbered, print_batch, print_structured};
use crate::cli::{Output, OutputFormat};
use crate::config::{FanoutConfig, PipelineConfig};
use crate::scenarios::pipeline::{self, PipelineReport, TOTAL_COLUMN};
use crate::tabular::Table;

#[derive(Args, Debug, Default, Serialize)]
pub struct PipelineArgs {
    /// Directory the table files are written to
    #[arg(long, value_name = "DIR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Simulated download time per file, in milliseconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_delay_ms: Option<u64>,

    /// Skip re-reading the processed files
    #[arg(long)]
    #[serde(skip)]
    pub no_verify: bool,
}

pub async fn execute(
    args: PipelineArgs,
    config: FanoutConfig,
    format: OutputFormat,
    output: &Output,
) -> Result<()> {
    let runner = config.runner()?;
    let mut settings = config.with_overrides("pipeline", &args).pipeline()?;
    if args.no_verify {
        settings.verify = false;
    }

    if format == OutputFormat::Text {
        output.header(&format!(
            "Pipeline: {} files into {}",
            settings.files.len(),
            settings.output_dir.display()
        ));
    }

    let report = pipeline::run(&settings, &runner).await?;

    if print_structured(&report, format)? {
        return Ok(());
    }
    render(output, &settings, &report);
    Ok(())
}

/// Configured file names, numbered by download position
fn download_labels(settings: &PipelineConfig) -> Vec<(usize, String)> {
    numbered(settings.files.iter().map(|file| file.name.clone()))
}

/// Transform inputs keep the number and name of the download they came from
fn transform_labels(settings: &PipelineConfig, report: &PipelineReport) -> Vec<(usize, String)> {
    report
        .downloads
        .successes()
        .map(|(index, path)| {
            let name = settings
                .files
                .get(index)
                .map(|file| file.name.clone())
                .unwrap_or_else(|| path.display().to_string());
            (index, name)
        })
        .collect()
}

/// Summary lines printed under each re-read file
fn verification_lines(table: &Table) -> Vec<(&'static str, String)> {
    let total = match table.column_sum(TOTAL_COLUMN) {
        Ok(sum) => sum.to_string(),
        Err(err) => err.to_string(),
    };
    vec![
        ("Columns:", table.headers().join(", ")),
        ("Rows:", table.len().to_string()),
        ("Total sum:", total),
    ]
}

fn render(output: &Output, settings: &PipelineConfig, report: &PipelineReport) {
    output.section_header("Cleanup");
    if report.cleanup.removed.is_empty() && report.cleanup.failed.is_empty() {
        output.info("Nothing to clean up");
    }
    for path in &report.cleanup.removed {
        output.action_result("Removed", &path.display().to_string(), true);
    }
    for (path, reason) in &report.cleanup.failed {
        output.action_result("Could not remove", &format!("{}: {reason}", path.display()), false);
    }

    let labels = download_labels(settings);
    print_batch(output, "Stage 1: download", &report.downloads, &labels, |path| {
        path.display().to_string()
    });

    let Some(transforms) = &report.transforms else {
        output.warning("No files were downloaded, skipping the transform stage");
        return;
    };

    let labels = transform_labels(settings, report);
    print_batch(output, "Stage 2: transform", transforms, &labels, |summary| {
        format!(
            "{} rows, {} = {}",
            summary.rows_processed,
            summary.columns_added.join(", "),
            summary.total_sum
        )
    });

    if !report.verified.is_empty() {
        output.section_header("Verification");
        for verification in &report.verified {
            output.step(&verification.path.display().to_string());
            match &verification.table {
                Ok(table) => {
                    for (key, value) in verification_lines(table) {
                        output.key_value(key, &value, false);
                    }
                    output.indent(&table.to_text());
                }
                Err(err) => output.error(&format!("{}: {err}", verification.path.display())),
            }
        }
    }

    output.separator();
    let processed = transforms.success_count();
    let message = format!(
        "{processed}/{} files processed in {:.2} s",
        report.downloads.total_inputs,
        report.elapsed.as_secs_f64()
    );
    if processed == report.downloads.total_inputs {
        output.success(&message);
    } else {
        output.warning(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSpec;
    use crate::parallel::{BatchReport, ErrorKind, ErrorRecord, ExecutionMode};
    use crate::scenarios::pipeline::Cleanup;
    use std::time::Duration;
    use uuid::Uuid;

    fn settings() -> PipelineConfig {
        PipelineConfig {
            files: ["data1.csv", "data2.csv", "data3.csv"]
                .iter()
                .map(|name| FileSpec {
                    name: name.to_string(),
                    source: format!("remote/{name}"),
                })
                .collect(),
            ..PipelineConfig::default()
        }
    }

    fn report_with_first_download_failed() -> PipelineReport {
        let downloads = BatchReport::new(
            Uuid::new_v4(),
            ExecutionMode::Concurrent,
            vec![
                Err(ErrorRecord::new(ErrorKind::ExternalCallFailure, "disk full")),
                Ok(PathBuf::from("table_files/data2.csv")),
                Ok(PathBuf::from("table_files/data3.csv")),
            ],
            Duration::from_millis(5),
        );
        PipelineReport {
            cleanup: Cleanup {
                removed: Vec::new(),
                failed: Vec::new(),
            },
            downloads,
            transforms: None,
            verified: Vec::new(),
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_download_labels_use_file_names() {
        let labels = download_labels(&settings());
        assert_eq!(
            labels,
            vec![
                (0, "data1.csv".to_string()),
                (1, "data2.csv".to_string()),
                (2, "data3.csv".to_string()),
            ]
        );
    }

    #[test]
    fn test_transform_labels_keep_download_positions() {
        let labels = transform_labels(&settings(), &report_with_first_download_failed());
        assert_eq!(
            labels,
            vec![(1, "data2.csv".to_string()), (2, "data3.csv".to_string())]
        );
    }

    #[test]
    fn test_verification_lines() {
        let table = crate::tabular::add_computed_column(
            pipeline::sample_table(),
            TOTAL_COLUMN,
            |row| Ok((row.number("Price")? * row.number("Quantity")?).to_string()),
        )
        .unwrap();

        let lines = verification_lines(&table);
        assert_eq!(lines[0], ("Columns:", "Product, Price, Quantity, Total".to_string()));
        assert_eq!(lines[1], ("Rows:", "4".to_string()));
        assert_eq!(lines[2], ("Total sum:", "1450".to_string()));
    }

    #[test]
    fn test_verification_lines_without_total() {
        let lines = verification_lines(&pipeline::sample_table());
        assert_eq!(lines[1], ("Rows:", "4".to_string()));
        assert!(lines[2].1.contains("Total"));
    }
}

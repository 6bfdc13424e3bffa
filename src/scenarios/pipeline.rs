//! Two-stage pipeline: an I/O-bound "download" stage on async tasks, then a
//! CPU-bound table transform on a worker pool sized from the core count.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{FileSpec, PipelineConfig, RunnerConfig};
use crate::parallel::report::serialize_secs;
use crate::parallel::{self, BatchReport, ExecutionMode, TaskError};
use crate::tabular::{self, Row, Table};

/// Column added by the transform stage
pub const TOTAL_COLUMN: &str = "Total";

/// One file to "download": where it goes and where it comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub path: PathBuf,
    pub source: String,
}

/// Transform result for one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub columns_added: Vec<String>,
    pub total_sum: f64,
    pub rows_processed: usize,
}

/// Stale file removal
#[derive(Debug, Serialize)]
pub struct Cleanup {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Re-read of a processed file
#[derive(Debug)]
pub struct Verification {
    pub path: PathBuf,
    pub table: Result<Table, TaskError>,
}

/// Everything one pipeline run produced
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub cleanup: Cleanup,
    pub downloads: BatchReport<PathBuf>,
    /// Absent when no download succeeded
    pub transforms: Option<BatchReport<FileSummary>>,
    #[serde(skip)]
    pub verified: Vec<Verification>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

/// Resolve the configured files under the output directory.
///
/// Every request gets its own path, so concurrent writers never collide;
/// duplicate names are a configuration error.
pub fn requests(settings: &PipelineConfig) -> Result<Vec<DownloadRequest>> {
    let mut seen = HashSet::new();
    settings
        .files
        .iter()
        .map(|FileSpec { name, source }| {
            if !seen.insert(name.as_str()) {
                anyhow::bail!("Duplicate pipeline file name: {name}");
            }
            Ok(DownloadRequest {
                path: settings.output_dir.join(name),
                source: source.clone(),
            })
        })
        .collect()
}

/// Remove files left over from a previous run
pub fn cleanup(paths: &[PathBuf]) -> Cleanup {
    let mut removed = Vec::new();
    let mut failed = Vec::new();
    for path in paths.iter().filter(|path| path.exists()) {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed stale file {}", path.display());
                removed.push(path.clone());
            }
            Err(err) => {
                warn!("Could not remove {}: {}", path.display(), err);
                failed.push((path.clone(), err.to_string()));
            }
        }
    }
    Cleanup { removed, failed }
}

/// The table every simulated download produces
pub fn sample_table() -> Table {
    let mut table = Table::new(["Product", "Price", "Quantity"]);
    table.push_row(["Product A", "100", "2"]);
    table.push_row(["Product B", "200", "1"]);
    table.push_row(["Product C", "150", "3"]);
    table.push_row(["Product D", "300", "2"]);
    table
}

/// Write the sample table to `path`, creating parent directories
pub fn create_sample_file(path: &Path) -> Result<(), TaskError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| tabular::with_path(parent, err))?;
    }
    tabular::write_table(path, &sample_table())
}

/// Simulated download: wait `delay`, then write the sample table
pub async fn mock_download(request: DownloadRequest, delay: Duration) -> Result<PathBuf, TaskError> {
    debug!("Downloading {} from {}", request.path.display(), request.source);
    tokio::time::sleep(delay).await;

    let path = request.path;
    tokio::task::spawn_blocking(move || create_sample_file(&path).map(|()| path))
        .await
        .map_err(TaskError::external)?
}

/// Add `Total = Price * Quantity` to a table file and write it back
pub fn calculate_total(path: PathBuf) -> Result<FileSummary, TaskError> {
    let table = tabular::read_table(&path)?;
    debug!("Read {} with columns {:?}", path.display(), table.headers());

    if !table.has_column("Price") || !table.has_column("Quantity") {
        return Err(TaskError::MissingData(format!(
            "'{}' lacks Price and/or Quantity; available columns: {:?}",
            path.display(),
            table.headers()
        )));
    }

    let table = tabular::add_computed_column(table, TOTAL_COLUMN, line_total)?;
    tabular::write_table(&path, &table)?;

    Ok(FileSummary {
        total_sum: table.column_sum(TOTAL_COLUMN)?,
        rows_processed: table.len(),
        columns_added: vec![TOTAL_COLUMN.to_string()],
        path,
    })
}

fn line_total(row: &Row<'_>) -> Result<String, TaskError> {
    Ok((row.number("Price")? * row.number("Quantity")?).to_string())
}

/// Re-read every processed file
pub fn verify(paths: &[PathBuf]) -> Vec<Verification> {
    paths
        .iter()
        .map(|path| Verification {
            path: path.clone(),
            table: tabular::read_table(path),
        })
        .collect()
}

/// Clean up, download every file concurrently, transform the downloaded ones
/// on a worker pool, and optionally verify the results.
pub async fn run(settings: &PipelineConfig, runner: &RunnerConfig) -> Result<PipelineReport> {
    let started = Instant::now();
    let requests = requests(settings)?;

    let paths: Vec<PathBuf> = requests.iter().map(|request| request.path.clone()).collect();
    let cleanup = cleanup(&paths);

    let delay = settings.download_delay();
    let downloads = parallel::run_async(
        requests,
        move |request| mock_download(request, delay),
        ExecutionMode::Concurrent,
    )
    .await?;
    info!(
        "Downloaded {}/{} files",
        downloads.success_count(),
        downloads.total_inputs
    );

    let downloaded: Vec<PathBuf> = downloads.successes().map(|(_, path)| path.clone()).collect();
    let (transforms, verified) = if downloaded.is_empty() {
        (None, Vec::new())
    } else {
        let workers =
            parallel::optimal_workers(runner.max_threads, runner.thread_percentage, downloaded.len());
        let inputs = downloaded.clone();
        let transforms = tokio::task::spawn_blocking(move || {
            parallel::run(inputs, calculate_total, ExecutionMode::Pooled { workers })
        })
        .await
        .context("Transform stage stopped unexpectedly")??;

        let verified = if settings.verify {
            verify(&downloaded)
        } else {
            Vec::new()
        };
        (Some(transforms), verified)
    };

    Ok(PipelineReport {
        cleanup,
        downloads,
        transforms,
        verified,
        elapsed: started.elapsed(),
    })
}

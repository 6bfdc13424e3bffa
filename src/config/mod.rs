//! Configuration management for fanout
//!
//! Settings are layered with figment (see [`FanoutConfig`]) and extracted into
//! the typed sections below. Every section has defaults, so a partial config
//! file only needs the keys it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod core;

pub use self::core::FanoutConfig;

/// Pool sizing for pooled batches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Percentage of CPU cores to use (1-100)
    pub thread_percentage: u8,

    /// Maximum number of pooled workers (0 = no limit)
    pub max_threads: usize,
}

/// Sleep scenario: N units that each wait a fixed delay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Number of units of work
    pub tasks: usize,

    /// Delay per unit (milliseconds)
    pub delay_ms: u64,
}

/// Fetch scenario: pages downloaded over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Pages to fetch, in report order
    pub urls: Vec<String>,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

/// Pipeline scenario: simulated downloads followed by a table transform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory the table files are written to
    pub output_dir: PathBuf,

    /// Files to produce; each name must be unique
    pub files: Vec<FileSpec>,

    /// Simulated download latency per file (milliseconds)
    pub download_delay_ms: u64,

    /// Re-read and print every processed file afterwards
    pub verify: bool,
}

/// One pipeline file and the source it is "downloaded" from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub name: String,
    pub source: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            thread_percentage: 75,
            max_threads: 0,
        }
    }
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            tasks: 5,
            delay_ms: 1000,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("table_files"),
            files: Vec::new(),
            download_delay_ms: 1000,
            verify: true,
        }
    }
}

impl SleepConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }
}

#[cfg(test)]
mod tests;

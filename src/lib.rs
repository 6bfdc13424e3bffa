//! # fanout - Fan-out/fan-in execution, side by side
//!
//! Runs a batch of independent inputs through a unit of work either one after
//! another or all at once, and reports per-input outcomes in input order
//! together with the wall-clock time each strategy took.
//!
//! ## Features
//!
//! - **Ordered results**: `results[i]` always belongs to `inputs[i]`
//! - **Failure isolation**: an error or panic in one unit becomes an error record in its slot
//! - **Threads or tasks**: scoped OS threads for blocking work, tokio tasks for async work
//! - **Worker pools**: pooled mode sized from the core count
//!
//! ## Quick Start
//!
//! ```bash
//! # Sleeping units, sequential vs. concurrent
//! fanout sleep
//!
//! # Download pages concurrently
//! fanout fetch https://www.rust-lang.org https://crates.io
//!
//! # Download-then-transform pipeline
//! fanout pipeline --output-dir /tmp/tables
//! ```

pub mod cli;
pub mod config;
pub mod parallel;
pub mod scenarios;
pub mod tabular;

pub use cli::{Cli, Output};
pub use config::FanoutConfig;

/// Result type alias for fanout operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

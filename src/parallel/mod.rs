//! Fan-out/fan-in execution harness
//!
//! This module runs a fixed list of independent units of work either one at a
//! time or concurrently, and hands back a [`BatchReport`] with one outcome per
//! input and the wall-clock time of the whole batch.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Execution Strategy**: Sequential, thread-per-input, bounded pool, or one async task per input
//! - **Ordering**: `results[i]` always belongs to `inputs[i]`, independent of completion order
//! - **Failure Isolation**: a failing or panicking unit only fills its own slot with an [`ErrorRecord`]
//! - **Resource Calculation**: sizes pools from the available CPU cores via `num_cpus::get()`
//!
//! ## What This Module Does NOT Do:
//! - **Scheduling**: no queues beyond the bounded pool channel, no priorities
//! - **Retries or Cancellation**: units apply their own timeouts and report failures as errors
//! - **Domain Logic**: units of work come from the caller (see `crate::scenarios`)
//!
//! # Slot Model
//!
//! ```text
//! inputs:   [ a ]   [ b ]   [ c ]
//!             │       │       │      one unit of execution per input
//!             ▼       ▼       ▼
//! slots:    [ 0 ]   [ 1 ]   [ 2 ]    each unit writes only its own slot
//!             └───────┼───────┘
//!                     ▼
//!               barrier wait → BatchReport
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use fanout::parallel::{self, ExecutionMode, TaskError};
//!
//! let report = parallel::run(
//!     vec![1, 2, 3],
//!     |x: u32| -> Result<u32, TaskError> { Ok(x * 10) },
//!     ExecutionMode::Concurrent,
//! )?;
//! assert_eq!(report.into_successes(), vec![10, 20, 30]);
//! # Ok::<(), parallel::RunnerError>(())
//! ```

pub mod core;
pub mod report;
pub mod runtime;

// Re-export main types for easier access
pub use self::core::{ExecutionMode, RunnerError, compare, optimal_workers, run};
pub use report::{BatchReport, Comparison, ErrorKind, ErrorRecord, TaskError, TaskOutcome};
pub use runtime::{compare_async, run_async};

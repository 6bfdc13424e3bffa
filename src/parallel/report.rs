use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::core::ExecutionMode;

/// Category of a failed unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network or file error inside a unit of work
    ExternalCallFailure,
    /// An expected field or column is absent
    MissingData,
    /// Zero-byte or nonexistent input file
    EmptyInput,
    /// An external call exceeded its deadline
    Timeout,
    /// The remote end could not be reached
    Connection,
    /// The remote end answered with a non-success status
    HttpStatus,
    /// The unit of work panicked instead of returning an error
    Panicked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::ExternalCallFailure => "external call failure",
            ErrorKind::MissingData => "missing data",
            ErrorKind::EmptyInput => "empty input",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::HttpStatus => "http status",
            ErrorKind::Panicked => "panicked",
        };
        f.write_str(label)
    }
}

/// Error returned by a unit of work.
///
/// Never crosses the runner's barrier: each one is turned into an
/// [`ErrorRecord`] in the slot of the input that produced it.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    External(String),

    #[error("{0}")]
    MissingData(String),

    #[error("{0}")]
    EmptyInput(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },
}

impl TaskError {
    pub fn external(message: impl fmt::Display) -> Self {
        TaskError::External(message.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::External(_) => ErrorKind::ExternalCallFailure,
            TaskError::MissingData(_) => ErrorKind::MissingData,
            TaskError::EmptyInput(_) => ErrorKind::EmptyInput,
            TaskError::Timeout(_) => ErrorKind::Timeout,
            TaskError::Connection(_) => ErrorKind::Connection,
            TaskError::HttpStatus { .. } => ErrorKind::HttpStatus,
        }
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        TaskError::external(err)
    }
}

/// Failure stored in a result slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build a record from a panic payload caught at the unit boundary
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unit of work panicked".to_string()
        };
        Self::new(ErrorKind::Panicked, message)
    }
}

impl From<TaskError> for ErrorRecord {
    fn from(err: TaskError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Outcome of one unit of work, in the slot of its input
pub type TaskOutcome<R> = Result<R, ErrorRecord>;

/// Result of one runner invocation.
///
/// `results[i]` always belongs to `inputs[i]`, whatever order the units
/// finished in.
#[derive(Debug, Serialize)]
pub struct BatchReport<R> {
    pub batch_id: Uuid,
    pub mode: ExecutionMode,
    pub total_inputs: usize,
    pub results: Vec<TaskOutcome<R>>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl<R> BatchReport<R> {
    pub(crate) fn new(
        batch_id: Uuid,
        mode: ExecutionMode,
        results: Vec<TaskOutcome<R>>,
        elapsed: Duration,
    ) -> Self {
        Self {
            batch_id,
            mode,
            total_inputs: results.len(),
            results,
            elapsed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|outcome| outcome.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total_inputs - self.success_count()
    }

    /// Successful values with their input positions
    pub fn successes(&self) -> impl Iterator<Item = (usize, &R)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.as_ref().ok().map(|value| (index, value)))
    }

    /// Error records with their input positions
    pub fn failures(&self) -> impl Iterator<Item = (usize, &ErrorRecord)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.as_ref().err().map(|record| (index, record)))
    }

    /// Consume the report, keeping only successful values in input order
    pub fn into_successes(self) -> Vec<R> {
        self.results.into_iter().filter_map(Result::ok).collect()
    }
}

/// The same inputs run once sequentially and once concurrently
#[derive(Debug, Serialize)]
pub struct Comparison<R> {
    pub sequential: BatchReport<R>,
    pub concurrent: BatchReport<R>,
}

impl<R> Comparison<R> {
    /// Sequential elapsed divided by concurrent elapsed
    pub fn speedup(&self) -> Option<f64> {
        let concurrent = self.concurrent.elapsed.as_secs_f64();
        (concurrent > 0.0).then(|| self.sequential.elapsed.as_secs_f64() / concurrent)
    }

    /// How much faster the concurrent run was, as a percentage of the sequential one
    pub fn improvement_percent(&self) -> Option<f64> {
        let sequential = self.sequential.elapsed.as_secs_f64();
        let concurrent = self.concurrent.elapsed.as_secs_f64();
        (sequential > 0.0 && concurrent > 0.0)
            .then(|| (sequential - concurrent) / sequential * 100.0)
    }
}

pub(crate) fn serialize_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

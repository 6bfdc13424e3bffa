use crossbeam::channel::{Receiver, Sender, bounded};
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::report::{BatchReport, Comparison, ErrorKind, ErrorRecord, TaskError, TaskOutcome};

/// How a batch of units of work is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One unit at a time, in input order
    Sequential,
    /// One unit of execution per input, all started before the barrier wait
    Concurrent,
    /// At most `workers` units in flight at once
    Pooled { workers: usize },
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Concurrent => f.write_str("concurrent"),
            ExecutionMode::Pooled { workers } => write!(f, "pooled ({workers} workers)"),
        }
    }
}

/// Failures in the runner's own setup. Unit-of-work failures never show up here.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("pooled execution needs at least one worker")]
    NoWorkers,

    #[error("failed to spawn worker {index}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("a worker thread panicked outside its unit of work")]
    WorkerPanicked,

    #[error("worker pool was closed before all units were scheduled")]
    PoolClosed,
}

/// Run `unit_of_work` once per input on OS threads and collect the outcomes in input order.
///
/// - `Sequential` calls the unit on the current thread, one input after another.
/// - `Concurrent` spawns one scoped thread per input. Each thread owns the
///   result slot at its input's index, so the collection needs no lock.
/// - `Pooled` feeds inputs through a bounded channel to a fixed set of workers.
///
/// A unit that returns an error or panics fills its own slot with an
/// [`ErrorRecord`]; every other unit still runs to completion.
pub fn run<T, R, F>(
    inputs: Vec<T>,
    unit_of_work: F,
    mode: ExecutionMode,
) -> Result<BatchReport<R>, RunnerError>
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R, TaskError> + Sync,
{
    if let ExecutionMode::Pooled { workers: 0 } = mode {
        return Err(RunnerError::NoWorkers);
    }

    let batch_id = Uuid::new_v4();
    let total = inputs.len();
    info!(%batch_id, %mode, total, "starting batch");

    let started = Instant::now();
    let results = if inputs.is_empty() {
        Vec::new()
    } else {
        match mode {
            ExecutionMode::Sequential => SequentialExecutor::execute(inputs, &unit_of_work),
            ExecutionMode::Concurrent => ConcurrentExecutor::execute(inputs, &unit_of_work)?,
            ExecutionMode::Pooled { workers } => {
                PooledExecutor::new(workers).execute(inputs, &unit_of_work)?
            }
        }
    };
    let report = BatchReport::new(batch_id, mode, results, started.elapsed());

    info!(
        %batch_id,
        succeeded = report.success_count(),
        failed = report.failure_count(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "batch finished"
    );
    Ok(report)
}

/// Run the same inputs sequentially, then concurrently
pub fn compare<T, R, F>(inputs: Vec<T>, unit_of_work: F) -> Result<Comparison<R>, RunnerError>
where
    T: Clone + Send,
    R: Send,
    F: Fn(T) -> Result<R, TaskError> + Sync,
{
    let sequential = run(inputs.clone(), &unit_of_work, ExecutionMode::Sequential)?;
    let concurrent = run(inputs, &unit_of_work, ExecutionMode::Concurrent)?;
    Ok(Comparison {
        sequential,
        concurrent,
    })
}

/// Worker count for a pooled batch.
///
/// Takes `thread_percentage` of the available cores, caps it at
/// `max_threads` when that is non-zero, and never exceeds the number of
/// work items. Always at least 1.
pub fn optimal_workers(max_threads: usize, thread_percentage: u8, work_count: usize) -> usize {
    let available_cores = num_cpus::get();

    let by_percentage = std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

    let capped = if max_threads > 0 {
        std::cmp::min(max_threads, by_percentage)
    } else {
        by_percentage
    };

    std::cmp::min(capped, work_count.max(1))
}

/// Call the unit of work for one input and turn any failure into a record
pub(crate) fn invoke<T, R, F>(unit_of_work: &F, index: usize, input: T) -> TaskOutcome<R>
where
    F: Fn(T) -> Result<R, TaskError>,
{
    debug!(index, "unit started");
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| unit_of_work(input))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ErrorRecord::from(err)),
        Err(payload) => Err(ErrorRecord::from_panic(&*payload)),
    };
    log_outcome(index, &outcome);
    outcome
}

pub(crate) fn log_outcome<R>(index: usize, outcome: &TaskOutcome<R>) {
    match outcome {
        Ok(_) => debug!(index, "unit finished"),
        Err(record) => warn!(index, kind = %record.kind, "unit failed: {}", record.message),
    }
}

fn empty_slots<R>(len: usize) -> Vec<Option<TaskOutcome<R>>> {
    (0..len).map(|_| None).collect()
}

/// A slot left empty means its unit never reported back
fn settle_slots<R>(slots: Vec<Option<TaskOutcome<R>>>) -> Vec<TaskOutcome<R>> {
    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                Err(ErrorRecord::new(
                    ErrorKind::Panicked,
                    "unit of work did not report a result",
                ))
            })
        })
        .collect()
}

struct SequentialExecutor;

impl SequentialExecutor {
    fn execute<T, R, F>(inputs: Vec<T>, unit_of_work: &F) -> Vec<TaskOutcome<R>>
    where
        F: Fn(T) -> Result<R, TaskError>,
    {
        inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| invoke(unit_of_work, index, input))
            .collect()
    }
}

struct ConcurrentExecutor;

impl ConcurrentExecutor {
    fn execute<T, R, F>(inputs: Vec<T>, unit_of_work: &F) -> Result<Vec<TaskOutcome<R>>, RunnerError>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R, TaskError> + Sync,
    {
        let mut slots = empty_slots(inputs.len());

        // The scope is the barrier: it joins every spawned thread before returning
        crossbeam::thread::scope(|s| -> Result<(), RunnerError> {
            for (index, (slot, input)) in slots.iter_mut().zip(inputs).enumerate() {
                s.builder()
                    .name(format!("fanout-unit-{index}"))
                    .spawn(move |_| {
                        *slot = Some(invoke(unit_of_work, index, input));
                    })
                    .map_err(|source| RunnerError::Spawn { index, source })?;
            }
            Ok(())
        })
        .map_err(|_| RunnerError::WorkerPanicked)??;

        Ok(settle_slots(slots))
    }
}

/// Bounded worker pool using a producer-consumer pattern
struct PooledExecutor {
    max_workers: usize,
    buffer_size: usize,
}

impl PooledExecutor {
    fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            buffer_size: max_workers * 2,
        }
    }

    fn execute<T, R, F>(&self, inputs: Vec<T>, unit_of_work: &F) -> Result<Vec<TaskOutcome<R>>, RunnerError>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R, TaskError> + Sync,
    {
        let total = inputs.len();
        let actual_workers = std::cmp::min(self.max_workers, total);
        let mut slots = empty_slots(total);

        crossbeam::thread::scope(|s| -> Result<(), RunnerError> {
            // Channels live inside the scope so an early return drops every
            // sender and lets already-spawned workers drain and exit.
            let (work_tx, work_rx): (Sender<(usize, T)>, Receiver<(usize, T)>) =
                bounded(self.buffer_size);
            let (result_tx, result_rx): (
                Sender<(usize, TaskOutcome<R>)>,
                Receiver<(usize, TaskOutcome<R>)>,
            ) = bounded(self.buffer_size);

            for worker_id in 0..actual_workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                s.builder()
                    .name(format!("fanout-worker-{worker_id}"))
                    .spawn(move |_| {
                        while let Ok((index, input)) = work_rx.recv() {
                            let outcome = invoke(unit_of_work, index, input);
                            if result_tx.send((index, outcome)).is_err() {
                                break; // Collector dropped
                            }
                        }
                    })
                    .map_err(|source| RunnerError::Spawn {
                        index: worker_id,
                        source,
                    })?;
            }

            drop(work_rx);
            drop(result_tx);

            // Producer: hand out inputs tagged with their position
            s.spawn(move |_| {
                for item in inputs.into_iter().enumerate() {
                    if work_tx.send(item).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            // Collector: results arrive in completion order, slots restore input order
            for (index, outcome) in result_rx.iter() {
                slots[index] = Some(outcome);
            }
            Ok(())
        })
        .map_err(|_| RunnerError::WorkerPanicked)??;

        Ok(settle_slots(slots))
    }
}

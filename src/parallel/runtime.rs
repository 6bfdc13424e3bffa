//! Cooperative-task flavour of the runner, for units of work that are futures.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};
use uuid::Uuid;

use super::core::{ExecutionMode, RunnerError, log_outcome};
use super::report::{BatchReport, Comparison, ErrorKind, ErrorRecord, TaskError, TaskOutcome};

/// Async counterpart of [`run`](super::run).
///
/// Every unit runs in its own tokio task so a panic stays inside that task.
/// `Sequential` awaits each task before spawning the next, `Concurrent`
/// spawns them all and then awaits the handles in input order, and `Pooled`
/// holds a semaphore permit per in-flight task.
pub async fn run_async<T, R, F, Fut>(
    inputs: Vec<T>,
    unit_of_work: F,
    mode: ExecutionMode,
) -> Result<BatchReport<R>, RunnerError>
where
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
{
    if let ExecutionMode::Pooled { workers: 0 } = mode {
        return Err(RunnerError::NoWorkers);
    }

    let batch_id = Uuid::new_v4();
    let total = inputs.len();
    info!(%batch_id, %mode, total, "starting async batch");

    let started = Instant::now();
    let mut results = Vec::with_capacity(total);
    match mode {
        ExecutionMode::Sequential => {
            for (index, input) in inputs.into_iter().enumerate() {
                debug!(index, "task started");
                let joined = tokio::spawn(unit_of_work(input)).await;
                results.push(settle(index, joined));
            }
        }
        ExecutionMode::Concurrent => {
            let handles: Vec<JoinHandle<Result<R, TaskError>>> = inputs
                .into_iter()
                .enumerate()
                .map(|(index, input)| {
                    debug!(index, "task started");
                    tokio::spawn(unit_of_work(input))
                })
                .collect();
            // Barrier: one handle per slot, awaited in input order
            for (index, handle) in handles.into_iter().enumerate() {
                results.push(settle(index, handle.await));
            }
        }
        ExecutionMode::Pooled { workers } => {
            let permits = Arc::new(Semaphore::new(workers));
            let mut handles = Vec::with_capacity(total);
            for (index, input) in inputs.into_iter().enumerate() {
                let permit = permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| RunnerError::PoolClosed)?;
                debug!(index, "task started");
                let task = unit_of_work(input);
                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    task.await
                }));
            }
            for (index, handle) in handles.into_iter().enumerate() {
                results.push(settle(index, handle.await));
            }
        }
    }
    let report = BatchReport::new(batch_id, mode, results, started.elapsed());

    info!(
        %batch_id,
        succeeded = report.success_count(),
        failed = report.failure_count(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "async batch finished"
    );
    Ok(report)
}

/// Async counterpart of [`compare`](super::compare)
pub async fn compare_async<T, R, F, Fut>(
    inputs: Vec<T>,
    unit_of_work: F,
) -> Result<Comparison<R>, RunnerError>
where
    T: Clone,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
{
    let sequential = run_async(inputs.clone(), &unit_of_work, ExecutionMode::Sequential).await?;
    let concurrent = run_async(inputs, &unit_of_work, ExecutionMode::Concurrent).await?;
    Ok(Comparison {
        sequential,
        concurrent,
    })
}

fn settle<R>(index: usize, joined: Result<Result<R, TaskError>, JoinError>) -> TaskOutcome<R> {
    let outcome = match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ErrorRecord::from(err)),
        Err(join_err) if join_err.is_panic() => {
            Err(ErrorRecord::from_panic(&*join_err.into_panic()))
        }
        Err(join_err) => Err(ErrorRecord::new(ErrorKind::Panicked, join_err.to_string())),
    };
    log_outcome(index, &outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn delayed_echo(value: u64) -> Result<u64, TaskError> {
        tokio::time::sleep(Duration::from_millis(value * 20)).await;
        Ok(value)
    }

    #[tokio::test]
    async fn test_sequential_async_run() {
        let report = run_async(vec![1, 2, 3], delayed_echo, ExecutionMode::Sequential)
            .await
            .unwrap();
        assert_eq!(report.into_successes(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concurrent_async_keeps_input_order() {
        let report = run_async(vec![4, 3, 2, 1, 0], delayed_echo, ExecutionMode::Concurrent)
            .await
            .unwrap();
        assert_eq!(report.into_successes(), vec![4, 3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn test_pooled_async_keeps_input_order() {
        let inputs: Vec<u64> = vec![3, 0, 2, 1, 3, 0];
        let report = run_async(inputs.clone(), delayed_echo, ExecutionMode::Pooled { workers: 2 })
            .await
            .unwrap();
        assert_eq!(report.into_successes(), inputs);
    }

    #[tokio::test]
    async fn test_async_failures_and_panics_are_isolated() {
        let report = run_async(
            vec![1_u32, 2, 3, 4],
            |x| async move {
                match x {
                    2 => Err(TaskError::EmptyInput("nothing here".into())),
                    3 => panic!("task {x} blew up"),
                    _ => Ok(x),
                }
            },
            ExecutionMode::Concurrent,
        )
        .await
        .unwrap();

        assert_eq!(report.total_inputs, 4);
        assert_eq!(report.results[0], Ok(1));
        assert_eq!(report.results[3], Ok(4));
        assert_eq!(report.results[1].as_ref().unwrap_err().kind, ErrorKind::EmptyInput);
        let panicked = report.results[2].as_ref().unwrap_err();
        assert_eq!(panicked.kind, ErrorKind::Panicked);
        assert!(panicked.message.contains("task 3 blew up"));
    }

    #[tokio::test]
    async fn test_async_empty_inputs() {
        let report = run_async(Vec::<u64>::new(), delayed_echo, ExecutionMode::Concurrent)
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_async_pooled_rejects_zero_workers() {
        let err = run_async(vec![1], delayed_echo, ExecutionMode::Pooled { workers: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::NoWorkers));
    }

    #[tokio::test]
    async fn test_compare_async() {
        let comparison = compare_async(vec![1, 1, 1], delayed_echo).await.unwrap();
        assert_eq!(comparison.sequential.into_successes(), vec![1, 1, 1]);
        assert_eq!(comparison.concurrent.into_successes(), vec![1, 1, 1]);
    }
}

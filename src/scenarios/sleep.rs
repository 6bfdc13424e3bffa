//! Units that do nothing but wait, so any speedup comes from overlap alone.

use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::config::SleepConfig;
use crate::parallel::{self, Comparison, RunnerError, TaskError};

/// Sleep for `delay`, then hand back the unit number
pub fn nap(unit: usize, delay: Duration) -> Result<usize, TaskError> {
    thread::sleep(delay);
    debug!("thread {unit} woke up");
    Ok(unit)
}

/// Run units `1..=tasks` sequentially, then one thread per unit
pub fn run(settings: &SleepConfig) -> Result<Comparison<usize>, RunnerError> {
    let inputs: Vec<usize> = (1..=settings.tasks).collect();
    let delay = settings.delay();
    parallel::compare(inputs, move |unit| nap(unit, delay))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_scenario() {
        let settings = SleepConfig {
            tasks: 5,
            delay_ms: 100,
        };
        let comparison = run(&settings).unwrap();

        assert_eq!(comparison.sequential.into_successes(), vec![1, 2, 3, 4, 5]);
        assert_eq!(comparison.concurrent.into_successes(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_zero_tasks() {
        let settings = SleepConfig {
            tasks: 0,
            delay_ms: 100,
        };
        let comparison = run(&settings).unwrap();
        assert!(comparison.sequential.is_empty());
        assert!(comparison.concurrent.is_empty());
    }
}

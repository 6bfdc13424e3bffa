//! Command implementations for the fanout CLI
//!
//! Each scenario lives in its own module. The helpers here render the batch
//! reports every scenario shares.

pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod sleep;

use anyhow::Result;
use serde::Serialize;

use super::{Output, OutputFormat};
use crate::parallel::{BatchReport, Comparison};

/// Write `value` to stdout as json or yaml.
///
/// Returns `false` for [`OutputFormat::Text`], leaving rendering to the caller.
pub(crate) fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Text => Ok(false),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value)?);
            Ok(true)
        }
    }
}

/// Label inputs by their own position
pub(crate) fn numbered(labels: impl IntoIterator<Item = String>) -> Vec<(usize, String)> {
    labels.into_iter().enumerate().collect()
}

/// Print every slot of a batch in input order, then its totals.
///
/// `labels[i]` is the number and name shown for result `i`; `describe`
/// renders a successful value.
pub(crate) fn print_batch<R>(
    output: &Output,
    title: &str,
    report: &BatchReport<R>,
    labels: &[(usize, String)],
    describe: impl Fn(&R) -> String,
) {
    output.section_header(&format!("{title} ({})", report.mode));
    output.verbose(&format!("batch {}", report.batch_id));

    if report.is_empty() {
        output.info("No inputs");
        return;
    }

    for (index, outcome) in report.results.iter().enumerate() {
        let (position, label) = labels
            .get(index)
            .map(|(position, label)| (*position, label.as_str()))
            .unwrap_or((index, ""));
        match outcome {
            Ok(value) => output.slot(position, label, &describe(value), true),
            Err(record) => output.slot(position, label, &record.to_string(), false),
        }
    }

    output.key_value(
        "Succeeded:",
        &format!("{}/{}", report.success_count(), report.total_inputs),
        report.failure_count() == 0,
    );
    output.key_value("Elapsed:", &format!("{:.2} s", report.elapsed.as_secs_f64()), false);
}

/// Print both runs of a comparison and how they relate
pub(crate) fn print_comparison<R>(
    output: &Output,
    comparison: &Comparison<R>,
    labels: &[(usize, String)],
    describe: impl Fn(&R) -> String,
) {
    print_batch(output, "Sequential", &comparison.sequential, labels, &describe);
    print_batch(output, "Concurrent", &comparison.concurrent, labels, &describe);

    output.section_header("Comparison");
    output.key_value(
        "Sequential:",
        &format!("{:.2} s", comparison.sequential.elapsed.as_secs_f64()),
        false,
    );
    output.key_value(
        "Concurrent:",
        &format!("{:.2} s", comparison.concurrent.elapsed.as_secs_f64()),
        false,
    );
    match (comparison.speedup(), comparison.improvement_percent()) {
        (Some(speedup), Some(improvement)) => {
            output.key_value("Speedup:", &format!("{speedup:.2}x"), speedup > 1.0);
            output.key_value("Improvement:", &format!("{improvement:.1}%"), improvement > 0.0);
        }
        _ => output.info("Runs finished too quickly to compare"),
    }
}

// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown reports for benchmark results.

use hwbench_core::{BenchmarkResult, InvocationStatus};
use std::fmt::{self, Write};

/// Generate a markdown summary table from benchmark results.
pub fn generate_summary(results: &[BenchmarkResult]) -> String {
    let mut output = String::new();
    render_summary(&mut output, results).unwrap_or_default();
    output
}

/// Generate a detailed markdown report with every metric sample and
/// sub-invocation outcome.
pub fn generate_detailed_report(results: &[BenchmarkResult]) -> String {
    let mut output = String::new();
    render_detailed(&mut output, results).unwrap_or_default();
    output
}

fn render_summary(output: &mut String, results: &[BenchmarkResult]) -> fmt::Result {
    writeln!(output, "# Benchmark Summary")?;
    writeln!(output)?;
    writeln!(output, "Generated: {}", chrono::Utc::now().to_rfc3339())?;
    writeln!(output)?;
    writeln!(output, "## Results")?;
    writeln!(output)?;
    writeln!(output, "| Benchmark | Return Code | Runs | Metrics |")?;
    writeln!(output, "|-----------|-------------|------|---------|")?;

    for result in results {
        writeln!(
            output,
            "| {} | {} | {} | {} |",
            result.name,
            result.return_code(),
            result.run_count,
            result.metrics().len()
        )?;
    }

    let succeeded = results.iter().filter(|r| r.return_code().is_success()).count();
    writeln!(output)?;
    writeln!(output, "---")?;
    writeln!(output, "Total benchmarks: {} ({} succeeded)", results.len(), succeeded)
}

fn render_detailed(output: &mut String, results: &[BenchmarkResult]) -> fmt::Result {
    writeln!(output, "# Detailed Benchmark Report")?;
    writeln!(output)?;
    writeln!(output, "Generated: {}", chrono::Utc::now().to_rfc3339())?;
    writeln!(output)?;

    for result in results {
        writeln!(output, "## {}", result.name)?;
        writeln!(output)?;
        writeln!(output, "**Return code:** {}", result.return_code())?;
        if let (Some(start), Some(end)) = (result.start_time, result.end_time) {
            writeln!(output, "**Started:** {}", start.to_rfc3339())?;
            writeln!(output, "**Duration:** {} ms", (end - start).num_milliseconds())?;
        }
        writeln!(output)?;

        if !result.metrics().is_empty() {
            writeln!(output, "| Metric | Samples |")?;
            writeln!(output, "|--------|---------|")?;
            for (name, series) in result.metrics() {
                let samples: Vec<String> = series.values().iter().map(|v| v.to_string()).collect();
                writeln!(output, "| {} | {} |", name, samples.join(", "))?;
            }
            writeln!(output)?;
        }

        let failures: Vec<_> = result.outcomes().iter().filter(|o| !o.is_parsed()).collect();
        if !failures.is_empty() {
            writeln!(output, "**Failed sub-invocations:**")?;
            for outcome in failures {
                let reason = match &outcome.status {
                    InvocationStatus::ParseFailed { reason } => format!("parse failed: {}", reason),
                    InvocationStatus::ExecutionFailed { reason } => format!("execution failed: {}", reason),
                    InvocationStatus::Parsed { .. } => continue,
                };
                writeln!(
                    output,
                    "- #{} `{}` run {}: {}",
                    outcome.index, outcome.label, outcome.run, reason
                )?;
            }
            writeln!(output)?;
        }
    }

    Ok(())
}

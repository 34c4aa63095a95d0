// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The capability set every concrete benchmark implements.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use hwbench_adapters::locate_binary;
use hwbench_core::{BenchmarkConfig, OptionSpec};
use tracing::{info, warn};

use crate::context::RunContext;
use crate::error::{BenchmarkError, ExecutionError};
use crate::invocation::{Action, SubInvocation};
use crate::parser::{Metrics, ParseError};

/// Default per sub-invocation timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: i64 = 600;

/// A concrete benchmark: its options, how a configuration becomes
/// sub-invocations, how those are executed and how their output is read.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Options accepted in addition to the lifecycle's own.
    fn options(&self) -> Vec<OptionSpec>;

    /// Build the ordered sub-invocation list.
    ///
    /// An empty list means nothing requested can run here.
    fn resolve(
        &self,
        config: &BenchmarkConfig,
        context: &RunContext,
    ) -> Result<Vec<SubInvocation>, BenchmarkError>;

    /// Read metrics out of the raw output of `invocation`.
    fn parse(&self, invocation: &SubInvocation, raw: &str) -> Result<Metrics, ParseError>;

    /// Execute every sub-invocation once and return one raw output per entry,
    /// in index order.
    async fn execute(
        &self,
        invocations: &[SubInvocation],
        config: &BenchmarkConfig,
        context: &RunContext,
    ) -> Vec<Result<String, ExecutionError>> {
        execute_processes(invocations, config, context).await
    }
}

/// Options shared by benchmarks that run a vendor binary.
pub fn invoke_options() -> Vec<OptionSpec> {
    vec![
        OptionSpec::text("bin_dir", "", "Directory holding the benchmark binary; empty means <micro_path>/bin"),
        OptionSpec::integer("timeout", DEFAULT_TIMEOUT_SECS, "Per sub-invocation timeout in seconds").at_least(1),
    ]
}

/// Locate `name` in the configured binary directory.
pub fn resolve_binary(
    config: &BenchmarkConfig,
    context: &RunContext,
    name: &str,
) -> Result<PathBuf, BenchmarkError> {
    let bin_dir = config.text("bin_dir")?;
    let bin_dir = if bin_dir.is_empty() {
        context.default_bin_dir()
    } else {
        PathBuf::from(bin_dir)
    };
    Ok(locate_binary(&bin_dir, name)?)
}

/// Run process sub-invocations one after another through the context's runner.
///
/// A non-zero exit status is logged but the captured output is still
/// returned; only the parser decides whether it is usable.
pub async fn execute_processes(
    invocations: &[SubInvocation],
    config: &BenchmarkConfig,
    context: &RunContext,
) -> Vec<Result<String, ExecutionError>> {
    let timeout = config
        .integer("timeout")
        .ok()
        .and_then(|secs| u64::try_from(secs).ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS as u64);
    let timeout = Duration::from_secs(timeout);

    let mut outputs = Vec::with_capacity(invocations.len());
    for invocation in invocations {
        let command = match &invocation.action {
            Action::Process(command) => command,
            other => {
                outputs.push(Err(ExecutionError::Unsupported(other.to_string())));
                continue;
            }
        };

        info!(index = invocation.index, label = %invocation.label, command = %command, "Executing sub-invocation");
        let output = match context.runner.run(command, timeout).await {
            Ok(output) => output,
            Err(e) => {
                outputs.push(Err(e.into()));
                continue;
            }
        };

        if !output.success() {
            warn!(
                index = invocation.index,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "Sub-invocation exited with failure"
            );
        }
        outputs.push(Ok(output.stdout));
    }
    outputs
}

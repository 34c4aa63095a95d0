// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The state machine every benchmark goes through.
//!
//! ```text
//! Created -> Configured -> Preprocessed -> {Executing -> Parsing}* -> Finalized
//!                 \              \               \
//!                  +--------------+---------------+--> Failed
//! ```
//!
//! Configuration and resource problems end the run before any
//! sub-invocation executes. Failures of individual sub-invocations are
//! recorded as outcomes; the run succeeds as long as one metric was produced.

use chrono::Utc;
use hwbench_core::{
    BenchmarkConfig, BenchmarkResult, BenchmarkType, InvocationOutcome, InvocationStatus, OptionSpec,
    Parameters, ReturnCode,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::context::RunContext;
use crate::error::{BenchmarkError, ExecutionError};
use crate::invocation::SubInvocation;
use crate::workload::Workload;

/// Lifecycle state of a [`Benchmark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Constructed, options not yet merged.
    Created,
    /// Options validated.
    Configured,
    /// Sub-invocations resolved.
    Preprocessed,
    /// Sub-invocations running.
    Executing,
    /// Raw outputs being parsed.
    Parsing,
    /// Run complete; the return code is final.
    Finalized,
    /// Stopped before execution; the return code says why.
    Failed,
}

/// Options every benchmark accepts.
pub fn base_options() -> Vec<OptionSpec> {
    vec![
        OptionSpec::integer("run_count", 1, "Number of times all sub-invocations are executed").at_least(1),
        OptionSpec::flag("log_raw_data", false, "Log raw output of every sub-invocation"),
    ]
}

/// One benchmark instance: a workload, its validated configuration and the
/// result it builds.
pub struct Benchmark {
    name: String,
    workload: Box<dyn Workload>,
    context: RunContext,
    state: LifecycleState,
    config: Option<BenchmarkConfig>,
    invocations: Vec<SubInvocation>,
    result: BenchmarkResult,
    current_run: usize,
    started: bool,
}

impl Benchmark {
    /// Create and configure a benchmark.
    ///
    /// Invalid parameters leave the instance in [`LifecycleState::Failed`]
    /// with `INVALID_ARGUMENT`; `run` then reports failure without executing.
    pub fn new(
        name: impl Into<String>,
        workload: Box<dyn Workload>,
        parameters: &Parameters,
        context: RunContext,
    ) -> Self {
        let name = name.into();
        let mut benchmark = Self {
            result: BenchmarkResult::new(name.clone(), BenchmarkType::Micro, 1),
            name,
            workload,
            context,
            state: LifecycleState::Created,
            config: None,
            invocations: Vec::new(),
            current_run: 0,
            started: false,
        };
        benchmark.configure(parameters);
        benchmark
    }

    fn configure(&mut self, parameters: &Parameters) {
        let mut specs = base_options();
        specs.extend(self.workload.options());

        let config = match BenchmarkConfig::resolve(&specs, parameters) {
            Ok(config) => config,
            Err(e) => return self.fail(BenchmarkError::Config(e)),
        };
        let run_count = match config.integer("run_count") {
            Ok(count) => usize::try_from(count).unwrap_or(1),
            Err(e) => return self.fail(BenchmarkError::Config(e)),
        };

        self.result.run_count = run_count;
        self.config = Some(config);
        self.state = LifecycleState::Configured;
    }

    /// Resolve the sub-invocation list.
    ///
    /// Returns `false` and moves to [`LifecycleState::Failed`] when nothing
    /// can run or a required resource is missing.
    pub fn preprocess(&mut self) -> bool {
        if self.state != LifecycleState::Configured {
            return self.state == LifecycleState::Preprocessed;
        }
        let Some(config) = self.config.as_ref() else {
            return false;
        };

        match self.workload.resolve(config, &self.context) {
            Ok(invocations) if invocations.is_empty() => {
                let requested = config
                    .list("precision")
                    .map(|labels| labels.to_vec())
                    .unwrap_or_default();
                self.fail(BenchmarkError::NoRunnableVariant { requested });
                false
            }
            Ok(invocations) => {
                info!(
                    benchmark = %self.name,
                    count = invocations.len(),
                    "Resolved sub-invocations"
                );
                self.invocations = invocations;
                self.state = LifecycleState::Preprocessed;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Record `raw` for sub-invocation `index` and parse it.
    ///
    /// The raw text is stored whatever the parse outcome. Returns whether
    /// the output parsed.
    pub fn process_raw_output(&mut self, index: usize, raw: &str) -> bool {
        self.result.add_raw_data(index, raw);
        if self.logs_raw_data() {
            info!(benchmark = %self.name, index, raw = %raw, "Raw output");
        }

        let Some(invocation) = self.invocations.get(index) else {
            error!(benchmark = %self.name, index, "No sub-invocation at index");
            return false;
        };
        let label = invocation.label.clone();
        let parsed = self.workload.parse(invocation, raw);

        let status = match parsed {
            Ok(metrics) => {
                let count = metrics.len();
                for (name, value) in metrics {
                    self.result.add_metric(name, value);
                }
                InvocationStatus::Parsed { metrics: count }
            }
            Err(e) => {
                error!(benchmark = %self.name, index, label = %label, error = %e, "Failed to parse raw output");
                InvocationStatus::ParseFailed { reason: e.to_string() }
            }
        };

        let parsed = matches!(status, InvocationStatus::Parsed { .. });
        self.result.add_outcome(InvocationOutcome {
            index,
            run: self.current_run,
            label,
            status,
        });
        parsed
    }

    /// Drive the benchmark to completion and report whether it succeeded.
    ///
    /// A benchmark runs at most once; a second call returns
    /// [`BenchmarkError::AlreadyRun`] and leaves the result untouched.
    pub async fn run(&mut self) -> Result<bool, BenchmarkError> {
        if self.started {
            return Err(BenchmarkError::AlreadyRun(self.name.clone()));
        }
        self.started = true;

        let start = Utc::now();
        info!(benchmark = %self.name, platform = %self.context.platform, "Starting benchmark");

        if self.state == LifecycleState::Configured {
            self.preprocess();
        }
        if self.state == LifecycleState::Preprocessed {
            self.execute_all().await;
            self.finalize();
        }

        self.result.set_timestamps(start, Utc::now());
        let return_code = self.result.return_code();
        if return_code.is_success() {
            info!(benchmark = %self.name, metrics = self.result.metrics().len(), "Benchmark succeeded");
        } else {
            error!(benchmark = %self.name, return_code = %return_code, "Benchmark failed");
        }
        Ok(return_code.is_success())
    }

    async fn execute_all(&mut self) {
        let Some(config) = self.config.clone() else {
            return;
        };

        for run in 0..self.result.run_count {
            self.current_run = run;
            self.state = LifecycleState::Executing;
            let outputs = self
                .workload
                .execute(&self.invocations, &config, &self.context)
                .await;
            if outputs.len() != self.invocations.len() {
                warn!(
                    benchmark = %self.name,
                    expected = self.invocations.len(),
                    received = outputs.len(),
                    "Executor returned an unexpected number of outputs"
                );
            }

            self.state = LifecycleState::Parsing;
            let mut outputs = outputs.into_iter();
            for index in 0..self.invocations.len() {
                match outputs.next().unwrap_or(Err(ExecutionError::Missing)) {
                    Ok(raw) => {
                        self.process_raw_output(index, &raw);
                    }
                    Err(e) => self.record_execution_failure(index, e),
                }
            }
        }
    }

    fn record_execution_failure(&mut self, index: usize, e: ExecutionError) {
        let label = self
            .invocations
            .get(index)
            .map(|invocation| invocation.label.clone())
            .unwrap_or_default();
        error!(benchmark = %self.name, index, label = %label, error = %e, "Sub-invocation failed to execute");

        self.result.add_raw_data(index, "");
        self.result.add_outcome(InvocationOutcome {
            index,
            run: self.current_run,
            label,
            status: InvocationStatus::ExecutionFailed { reason: e.to_string() },
        });
    }

    fn finalize(&mut self) {
        let code = if !self.result.metrics().is_empty() {
            ReturnCode::Success
        } else if self
            .result
            .outcomes()
            .iter()
            .all(|o| matches!(o.status, InvocationStatus::ExecutionFailed { .. }))
        {
            ReturnCode::MicrobenchmarkExecutionFailure
        } else {
            ReturnCode::MicrobenchmarkResultParsingFailure
        };

        let partial = self.result.outcomes().iter().filter(|o| !o.is_parsed()).count();
        if code.is_success() && partial > 0 {
            warn!(
                benchmark = %self.name,
                failed = partial,
                total = self.result.outcomes().len(),
                "Some sub-invocations produced no metrics"
            );
        }

        self.result.set_return_code(code);
        self.state = LifecycleState::Finalized;
    }

    fn fail(&mut self, e: BenchmarkError) {
        error!(benchmark = %self.name, error = %e, "Benchmark cannot run");
        self.result.set_return_code(e.return_code());
        self.state = LifecycleState::Failed;
    }

    fn logs_raw_data(&self) -> bool {
        self.config
            .as_ref()
            .and_then(|config| config.flag("log_raw_data").ok())
            .unwrap_or(false)
    }

    /// Benchmark name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Validated configuration, absent if configuration failed.
    pub fn config(&self) -> Option<&BenchmarkConfig> {
        self.config.as_ref()
    }

    /// Resolved sub-invocations.
    pub fn invocations(&self) -> &[SubInvocation] {
        &self.invocations
    }

    /// Result built so far.
    pub fn result(&self) -> &BenchmarkResult {
        &self.result
    }

    /// Aggregate return code.
    pub fn return_code(&self) -> ReturnCode {
        self.result.return_code()
    }

    /// Consume the benchmark and keep its result.
    pub fn into_result(self) -> BenchmarkResult {
        self.result
    }
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("invocations", &self.invocations.len())
            .field("return_code", &self.result.return_code())
            .finish_non_exhaustive()
    }
}

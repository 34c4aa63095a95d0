// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark result types.
//!
//! A [`BenchmarkResult`] is owned by exactly one benchmark instance and is
//! built incrementally while its sub-invocations execute. Metric series are
//! append-only and raw captures are kept verbatim whether or not they parsed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::return_code::ReturnCode;

/// Category of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkType {
    /// Micro-benchmark driving a vendor binary or a probe.
    Micro,
}

/// Named, ordered sequence of numeric samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSeries(Vec<f64>);

impl MetricSeries {
    /// Append one sample.
    pub fn push(&mut self, value: f64) {
        self.0.push(value);
    }

    /// All samples in insertion order.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Unmodified output of one sub-invocation, one entry per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapture {
    /// Index of the sub-invocation that produced the output.
    pub index: usize,
    /// Captured text, one element per run.
    pub runs: Vec<String>,
}

impl RawCapture {
    /// Key under which this capture is reported.
    pub fn key(&self) -> String {
        format!("raw_output_{}", self.index)
    }
}

/// What happened to a single sub-invocation in a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationStatus {
    /// Output parsed and produced metrics.
    Parsed {
        /// Number of metric samples recorded.
        metrics: usize,
    },
    /// Output was captured but could not be parsed.
    ParseFailed {
        /// Parser error message.
        reason: String,
    },
    /// The sub-invocation could not be executed at all.
    ExecutionFailed {
        /// Execution error message.
        reason: String,
    },
}

/// Per-sub-invocation outcome, kept next to the aggregate return code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    /// Sub-invocation index.
    pub index: usize,
    /// Zero-based run number.
    pub run: usize,
    /// Label the sub-invocation was built for (precision, model, host).
    pub label: String,
    /// Outcome.
    #[serde(flatten)]
    pub status: InvocationStatus,
}

impl InvocationOutcome {
    /// Whether metrics were recorded for this sub-invocation.
    pub fn is_parsed(&self) -> bool {
        matches!(self.status, InvocationStatus::Parsed { .. })
    }
}

/// Result of one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Benchmark name.
    pub name: String,
    /// Benchmark category.
    #[serde(rename = "type")]
    pub benchmark_type: BenchmarkType,
    /// Number of times the sub-invocations are executed.
    pub run_count: usize,
    return_code: ReturnCode,
    /// Time the run started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Time the run finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    raw_data: BTreeMap<usize, RawCapture>,
    #[serde(rename = "result")]
    metrics: BTreeMap<String, MetricSeries>,
    outcomes: Vec<InvocationOutcome>,
}

impl BenchmarkResult {
    /// Create an empty result with a `Success` return code.
    pub fn new(name: impl Into<String>, benchmark_type: BenchmarkType, run_count: usize) -> Self {
        Self {
            name: name.into(),
            benchmark_type,
            run_count,
            return_code: ReturnCode::Success,
            start_time: None,
            end_time: None,
            raw_data: BTreeMap::new(),
            metrics: BTreeMap::new(),
            outcomes: Vec::new(),
        }
    }

    /// Current return code.
    pub fn return_code(&self) -> ReturnCode {
        self.return_code
    }

    /// Record an irrecoverable condition.
    ///
    /// Only the first failure code sticks; later calls and `Success` are
    /// ignored. Returns whether the code was recorded.
    pub fn set_return_code(&mut self, code: ReturnCode) -> bool {
        if code.is_success() || !self.return_code.is_success() {
            return false;
        }
        self.return_code = code;
        true
    }

    /// Append raw output for a sub-invocation.
    pub fn add_raw_data(&mut self, index: usize, text: impl Into<String>) {
        self.raw_data
            .entry(index)
            .or_insert_with(|| RawCapture {
                index,
                runs: Vec::new(),
            })
            .runs
            .push(text.into());
    }

    /// Append a metric sample. Existing samples are never overwritten.
    pub fn add_metric(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.entry(name.into()).or_default().push(value);
    }

    /// Record the outcome of one sub-invocation.
    pub fn add_outcome(&mut self, outcome: InvocationOutcome) {
        self.outcomes.push(outcome);
    }

    /// Set start and end timestamps.
    pub fn set_timestamps(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.start_time = Some(start);
        self.end_time = Some(end);
    }

    /// Metric series by name.
    pub fn metric(&self, name: &str) -> Option<&MetricSeries> {
        self.metrics.get(name)
    }

    /// All metric series, ordered by name.
    pub fn metrics(&self) -> &BTreeMap<String, MetricSeries> {
        &self.metrics
    }

    /// Raw capture for a sub-invocation index.
    pub fn raw_capture(&self, index: usize) -> Option<&RawCapture> {
        self.raw_data.get(&index)
    }

    /// All raw captures, ordered by index.
    pub fn raw_captures(&self) -> impl Iterator<Item = &RawCapture> {
        self.raw_data.values()
    }

    /// Number of sub-invocations with a raw capture.
    pub fn raw_capture_count(&self) -> usize {
        self.raw_data.len()
    }

    /// Per-sub-invocation outcomes in the order they were recorded.
    pub fn outcomes(&self) -> &[InvocationOutcome] {
        &self.outcomes
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

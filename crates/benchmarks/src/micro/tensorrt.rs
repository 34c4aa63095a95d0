// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inference latency of exported vision models through `trtexec`.

use std::path::Path;

use async_trait::async_trait;
use hwbench_adapters::CommandLine;
use hwbench_core::{BenchmarkConfig, OptionSpec};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::context::RunContext;
use crate::error::BenchmarkError;
use crate::invocation::SubInvocation;
use crate::parser::{millisecond_values, Metrics, ParseError};
use crate::workload::{invoke_options, resolve_binary, Workload};

/// Binary file name.
pub const BINARY: &str = "trtexec";

/// Models benchmarked when none are requested.
pub const DEFAULT_MODELS: &[&str] = &[
    "resnet50",
    "resnet101",
    "resnet152",
    "densenet169",
    "densenet201",
    "vgg11",
    "vgg13",
    "vgg16",
    "vgg19",
];

const PRECISIONS: &[&str] = &["int8", "fp16", "fp32"];

static STATISTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[I\]\s+(mean|percentile):").expect("valid statistic regex")
});

static PERCENTILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"at\s+(\d+)%").expect("valid percentile regex"));

static RUNNING_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&&&& RUNNING .*--onnx=(\S+)").expect("valid running-line regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Unknown,
    HostLatency,
    GpuCompute,
    Other,
}

/// `tensorrt-inference` on CUDA.
#[derive(Debug, Clone, Copy, Default)]
pub struct TensorRtInference;

#[async_trait]
impl Workload for TensorRtInference {
    fn options(&self) -> Vec<OptionSpec> {
        let mut options = invoke_options();
        options.extend([
            OptionSpec::list("pytorch_models", DEFAULT_MODELS, "Models to benchmark"),
            OptionSpec::text("precision", "int8", "Inference precision").one_of(PRECISIONS),
            OptionSpec::integer("batch_size", 32, "Batch size").at_least(1),
            OptionSpec::integer("iterations", 256, "Inference iterations").at_least(1),
        ]);
        options
    }

    fn resolve(
        &self,
        config: &BenchmarkConfig,
        context: &RunContext,
    ) -> Result<Vec<SubInvocation>, BenchmarkError> {
        let binary = resolve_binary(config, context, BINARY)?;
        let precision = config.text("precision")?;
        let batch_size = config.integer("batch_size")?;
        let iterations = config.integer("iterations")?;
        let export_batch = u32::try_from(batch_size).unwrap_or(u32::MAX);

        let mut invocations = Vec::new();
        for (index, model) in config.list("pytorch_models")?.iter().enumerate() {
            let onnx = context.model_hub.fetch(model, export_batch)?;
            debug!(model = %model, path = %onnx.display(), "Using model artifact");

            let mut command = CommandLine::new(&binary)
                .arg(format!("--onnx={}", onnx.display()))
                .arg("--explicitBatch")
                .arg(format!("--optShapes=input:{}x3x224x224", batch_size))
                .arg("--workspace=8192");
            if precision != "fp32" {
                command = command.arg(format!("--{}", precision));
            }
            command = command
                .arg(format!("--iterations={}", iterations))
                .arg("--percentile=99");

            invocations.push(SubInvocation::process(index, model.as_str(), model.as_str(), command));
        }
        Ok(invocations)
    }

    fn parse(&self, invocation: &SubInvocation, raw: &str) -> Result<Metrics, ParseError> {
        if let Some(model) = echoed_model(raw) {
            if model != invocation.label {
                return Err(ParseError::LabelMismatch {
                    expected: invocation.label.clone(),
                    found: model,
                });
            }
        }

        let mut section = Section::Unknown;
        let mut metrics = Metrics::new();

        for line in raw.lines() {
            let Some(stat) = STATISTIC.captures(line) else {
                section = section_of(line).unwrap_or(section);
                continue;
            };
            if section == Section::Other {
                continue;
            }

            let tag = if &stat[1] == "mean" {
                "mean".to_string()
            } else {
                PERCENTILE
                    .captures(line)
                    .map(|caps| caps[1].to_string())
                    .ok_or_else(|| ParseError::MissingField("percentile".to_string()))?
            };
            let values = millisecond_values(line);

            match (section, values.as_slice()) {
                (Section::HostLatency, [host, end_to_end, ..]) | (Section::Unknown, [host, end_to_end]) => {
                    metrics.push((format!("host_lat_ms_{}", tag), *host));
                    metrics.push((format!("end_to_end_lat_ms_{}", tag), *end_to_end));
                }
                (Section::GpuCompute, [gpu, ..]) | (Section::Unknown, [gpu]) => {
                    metrics.push((format!("gpu_lat_ms_{}", tag), *gpu));
                }
                (Section::HostLatency | Section::GpuCompute, _) => {
                    return Err(ParseError::MissingField(format!("{} latency", tag)));
                }
                _ => {}
            }
        }

        if metrics.is_empty() {
            return Err(ParseError::Unrecognized);
        }
        Ok(metrics)
    }
}

/// Model named by the `--onnx=` argument `trtexec` echoes when it starts.
fn echoed_model(raw: &str) -> Option<String> {
    let caps = RUNNING_MODEL.captures(raw)?;
    let stem = Path::new(&caps[1]).file_stem()?;
    Some(stem.to_string_lossy().into_owned())
}

/// Section a `trtexec` heading line opens, if it is one.
fn section_of(line: &str) -> Option<Section> {
    let heading = line.rsplit("[I]").next()?.trim();
    match heading {
        "Host Latency" => Some(Section::HostLatency),
        "GPU Compute" | "GPU Compute Time" => Some(Section::GpuCompute),
        "Enqueue Time" | "H2D Latency" | "D2H Latency" | "Latency" | "End-to-End Host Latency" => {
            Some(Section::Other)
        }
        _ => None,
    }
}

// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! GEMM throughput on NVIDIA GPUs through `cutlass_profiler`.
//!
//! Every precision runs a CUTLASS kernel family chosen by compute
//! capability. There are no baseline flags: a precision without a kernel
//! for the detected capability is skipped.

use async_trait::async_trait;
use hwbench_adapters::CommandLine;
use hwbench_core::{BenchmarkConfig, OptionSpec};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::RunContext;
use crate::error::BenchmarkError;
use crate::invocation::SubInvocation;
use crate::micro::gemm::{gemm_options, requested_precisions, GemmShape};
use crate::parser::{parse_number, Metrics, ParseError};
use crate::variant::{ArchFlags, Variant, VariantTable};
use crate::workload::{invoke_options, resolve_binary, Workload};

/// Binary file name.
pub const BINARY: &str = "cutlass_profiler";

/// Compute capabilities with a kernel table.
pub const SUPPORTED_ARCHITECTURES: &[&str] = &["7.0", "8.0"];

const VOLTA_AMPERE: &[&str] = &["7.0", "8.0"];
const VOLTA: &[&str] = &["7.0"];
const AMPERE: &[&str] = &["8.0"];

/// Precisions and CUTLASS kernel patterns per compute capability.
pub static VARIANTS: VariantTable = VariantTable {
    variants: &[
        Variant { label: "FP64", flags: None },
        Variant { label: "FP32", flags: None },
        Variant { label: "FP16", flags: None },
        Variant { label: "FP64_TC", flags: None },
        Variant { label: "TF32_TC", flags: None },
        Variant { label: "BF16_TC", flags: None },
        Variant { label: "FP16_TC", flags: None },
        Variant { label: "INT8_TC", flags: None },
        Variant { label: "INT4_TC", flags: None },
    ],
    substitutions: &[
        kernel("FP64", VOLTA_AMPERE, "cutlass_simt_dgemm_128x128_8x2_*"),
        kernel("FP32", VOLTA_AMPERE, "cutlass_simt_sgemm_128x128_8x2_*"),
        kernel("FP16", VOLTA_AMPERE, "cutlass_simt_hgemm_256x128_8x2_*"),
        kernel("FP64_TC", AMPERE, "cutlass_tensorop_d884gemm_128x128_16x3_*"),
        kernel("TF32_TC", AMPERE, "cutlass_tensorop_tf32_s1688gemm_tf32_256x128_16x3_*"),
        kernel("BF16_TC", AMPERE, "cutlass_tensorop_bf16_s16816gemm_bf16_256x128_32x3_*"),
        kernel("FP16_TC", VOLTA, "cutlass_tensorop_h884gemm_256x128_32x2_*"),
        kernel("FP16_TC", AMPERE, "cutlass_tensorop_h16816gemm_256x128_32x3_*"),
        kernel("INT8_TC", AMPERE, "cutlass_tensorop_s8_i16832gemm_s8_256x128_64x3_*"),
        kernel("INT4_TC", AMPERE, "cutlass_tensorop_s4_i16864gemm_s4_256x128_128x3_*"),
    ],
};

const fn kernel(label: &'static str, architectures: &'static [&'static str], flags: &'static str) -> ArchFlags {
    ArchFlags {
        label,
        architectures,
        flags,
        metric_suffix: "",
    }
}

static MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Math:\s*([0-9.eE+-]+)\s*GFLOP/s").expect("valid math regex"));

/// `gemm-flops` on CUDA.
#[derive(Debug, Clone, Copy, Default)]
pub struct CudaGemmFlops;

#[async_trait]
impl Workload for CudaGemmFlops {
    fn options(&self) -> Vec<OptionSpec> {
        let mut options = invoke_options();
        options.extend(gemm_options());
        options
    }

    fn resolve(
        &self,
        config: &BenchmarkConfig,
        context: &RunContext,
    ) -> Result<Vec<SubInvocation>, BenchmarkError> {
        if !SUPPORTED_ARCHITECTURES
            .iter()
            .any(|arch| context.architectures.contains(*arch))
        {
            let detected: Vec<&str> = context.architectures.iter().map(String::as_str).collect();
            return Err(BenchmarkError::UnsupportedArchitecture(format!(
                "compute capability {:?} is not one of {:?}",
                detected, SUPPORTED_ARCHITECTURES
            )));
        }

        let shape = GemmShape::from_config(config)?;
        let requested = requested_precisions(config)?;
        let binary = resolve_binary(config, context, BINARY)?;

        Ok(VARIANTS
            .resolve(&requested, &context.architectures)
            .into_iter()
            .enumerate()
            .map(|(index, variant)| {
                let command = CommandLine::new(&binary).args([
                    format!("--warmup-iterations={}", shape.num_warmup),
                    "--operation=gemm".to_string(),
                    format!("--n={}", shape.n),
                    format!("--k={}", shape.k),
                    format!("--m={}", shape.m),
                    format!("--kernels={}", variant.flags),
                ]);
                SubInvocation::process(index, variant.label, variant.metric, command)
            })
            .collect())
    }

    fn parse(&self, invocation: &SubInvocation, raw: &str) -> Result<Metrics, ParseError> {
        let pattern = invocation
            .command()
            .and_then(|command| {
                command
                    .arguments()
                    .iter()
                    .find_map(|arg| arg.strip_prefix("--kernels="))
            })
            .ok_or_else(|| ParseError::MissingField("--kernels".to_string()))?;

        let mut operations = 0;
        let mut best: Option<f64> = None;
        for line in raw.lines() {
            let trimmed = line.trim();
            if let Some(operation) = trimmed.strip_prefix("Operation:") {
                let operation = operation.trim();
                if !glob_match(pattern, operation) {
                    return Err(ParseError::LabelMismatch {
                        expected: pattern.to_string(),
                        found: operation.to_string(),
                    });
                }
                operations += 1;
            } else if let Some(caps) = MATH.captures(line) {
                let value = parse_number("Math", &caps[1])?;
                best = Some(best.map_or(value, |b: f64| b.max(value)));
            }
        }

        if operations == 0 {
            return Err(ParseError::Unrecognized);
        }
        let best = best.ok_or_else(|| ParseError::MissingField("Math".to_string()))?;
        Ok(vec![(invocation.metric.clone(), best)])
    }
}

/// Match `name` against a pattern where `*` stands for any run of characters.
fn glob_match(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return name.is_empty();
    };
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

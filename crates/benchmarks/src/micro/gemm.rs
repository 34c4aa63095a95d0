// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Options shared by the GEMM throughput benchmarks.

use hwbench_core::{BenchmarkConfig, ConfigError, OptionSpec};

/// Default problem size along each dimension.
pub const DEFAULT_DIMENSION: i64 = 16384;

/// Default warm-up iterations.
pub const DEFAULT_WARMUP: i64 = 5;

/// `m`, `n`, `k`, `num_warmup` and `precision`.
pub fn gemm_options() -> Vec<OptionSpec> {
    vec![
        OptionSpec::integer("m", DEFAULT_DIMENSION, "Rows of A and C").at_least(1),
        OptionSpec::integer("n", DEFAULT_DIMENSION, "Columns of B and C").at_least(1),
        OptionSpec::integer("k", DEFAULT_DIMENSION, "Columns of A and rows of B").at_least(1),
        OptionSpec::integer("num_warmup", DEFAULT_WARMUP, "Warm-up iterations").at_least(0),
        OptionSpec::list("precision", &[], "Precisions to run; empty runs every supported one"),
    ]
}

/// Problem shape shared by every variant of one GEMM run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmShape {
    /// Rows of A and C.
    pub m: i64,
    /// Columns of B and C.
    pub n: i64,
    /// Inner dimension.
    pub k: i64,
    /// Warm-up iterations.
    pub num_warmup: i64,
}

impl GemmShape {
    /// Read the shape from a validated configuration.
    pub fn from_config(config: &BenchmarkConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            m: config.integer("m")?,
            n: config.integer("n")?,
            k: config.integer("k")?,
            num_warmup: config.integer("num_warmup")?,
        })
    }
}

/// Requested precision labels.
pub fn requested_precisions(config: &BenchmarkConfig) -> Result<Vec<String>, ConfigError> {
    Ok(config.list("precision")?.to_vec())
}

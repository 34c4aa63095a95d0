// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! GEMM throughput on AMD GPUs through `rocblas-bench`.
//!
//! On targets with matrix cores the reduced precisions switch to
//! `gemm_ex` with a wider compute type and report under an `_xDLOPS`
//! suffix.

use async_trait::async_trait;
use hwbench_adapters::CommandLine;
use hwbench_core::{BenchmarkConfig, OptionSpec};

use crate::context::RunContext;
use crate::error::BenchmarkError;
use crate::invocation::SubInvocation;
use crate::micro::gemm::{gemm_options, requested_precisions, GemmShape};
use crate::parser::{csv_column, Metrics, ParseError};
use crate::variant::{ArchFlags, Variant, VariantTable};
use crate::workload::{invoke_options, resolve_binary, Workload};

/// Binary file name.
pub const BINARY: &str = "rocblas-bench";

/// Throughput column of the CSV output.
pub const GFLOPS_COLUMN: &str = "rocblas-Gflops";

/// GPU targets with matrix cores.
pub const XDLOPS_ARCHITECTURES: &[&str] = &["gfx908", "gfx90a", "gfx940", "gfx941", "gfx942"];

const FP32_EX: &str = "-r f32_r -f gemm_ex --compute_type f32_r";
const FP16_EX: &str = "-r f16_r -f gemm_ex --compute_type f32_r";
const BF16_EX: &str = "-r bf16_r -f gemm_ex --compute_type f32_r";
const INT8_EX: &str = "--a_type i8_r --b_type i8_r --c_type i32_r --d_type i32_r -f gemm_ex --compute_type i32_r";

/// Precisions, baseline flags and matrix-core substitutions.
pub static VARIANTS: VariantTable = VariantTable {
    variants: &[
        Variant { label: "FP64", flags: Some("-r f64_r -f gemm") },
        Variant { label: "FP32", flags: Some("-r f32_r -f gemm") },
        Variant { label: "FP16", flags: Some("-r f16_r -f gemm") },
        Variant { label: "BF16", flags: Some(BF16_EX) },
        Variant { label: "INT8", flags: Some(INT8_EX) },
    ],
    substitutions: &[
        xdlops("FP32", FP32_EX),
        xdlops("FP16", FP16_EX),
        xdlops("BF16", BF16_EX),
        xdlops("INT8", INT8_EX),
    ],
};

const fn xdlops(label: &'static str, flags: &'static str) -> ArchFlags {
    ArchFlags {
        label,
        architectures: XDLOPS_ARCHITECTURES,
        flags,
        metric_suffix: "_xDLOPS",
    }
}

const TRANSPOSE: &[&str] = &["N", "T", "C"];

/// `gemm-flops` on ROCm.
#[derive(Debug, Clone, Copy, Default)]
pub struct RocmGemmFlops;

#[async_trait]
impl Workload for RocmGemmFlops {
    fn options(&self) -> Vec<OptionSpec> {
        let mut options = invoke_options();
        options.extend(gemm_options());
        options.extend([
            OptionSpec::text("transposeA", "N", "Transpose of matrix A").one_of(TRANSPOSE),
            OptionSpec::text("transposeB", "T", "Transpose of matrix B").one_of(TRANSPOSE),
            OptionSpec::integer("lda", 8384, "Leading dimension of A").at_least(1),
            OptionSpec::integer("ldb", 8384, "Leading dimension of B").at_least(1),
            OptionSpec::integer("ldc", 8384, "Leading dimension of C").at_least(1),
            OptionSpec::integer("ldd", 8384, "Leading dimension of D").at_least(1),
            OptionSpec::integer("alpha", 1, "Scalar alpha"),
            OptionSpec::integer("beta", 0, "Scalar beta"),
        ]);
        options
    }

    fn resolve(
        &self,
        config: &BenchmarkConfig,
        context: &RunContext,
    ) -> Result<Vec<SubInvocation>, BenchmarkError> {
        let shape = GemmShape::from_config(config)?;
        let requested = requested_precisions(config)?;
        let binary = resolve_binary(config, context, BINARY)?;

        let mut shared = vec![
            "--transposeA".to_string(),
            config.text("transposeA")?.to_string(),
            "--transposeB".to_string(),
            config.text("transposeB")?.to_string(),
        ];
        for (flag, value) in [("-m", shape.m), ("-n", shape.n), ("-k", shape.k)] {
            shared.push(flag.to_string());
            shared.push(value.to_string());
        }
        for name in ["alpha", "beta", "lda", "ldb", "ldc", "ldd"] {
            shared.push(format!("--{}", name));
            shared.push(config.integer(name)?.to_string());
        }

        Ok(VARIANTS
            .resolve(&requested, &context.architectures)
            .into_iter()
            .enumerate()
            .map(|(index, variant)| {
                let command = CommandLine::new(&binary)
                    .args(variant.flags.split_whitespace())
                    .args(shared.iter().cloned());
                SubInvocation::process(index, variant.label, variant.metric, command)
            })
            .collect())
    }

    fn parse(&self, invocation: &SubInvocation, raw: &str) -> Result<Metrics, ParseError> {
        let gflops = csv_column(raw, GFLOPS_COLUMN, ',')?;
        Ok(vec![(invocation.metric.clone(), gflops)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{Benchmark, LifecycleState};
    use hwbench_core::{Parameters, Platform, ReturnCode};
    use std::os::unix::fs::PermissionsExt;

    const PARAMS: &str = "--transposeA N --transposeB T -m 7680 -n 8192 -k 8192 \
                          --alpha 1 --beta 0 --lda 8384 --ldb 8384 --ldc 8384 --ldd 8384";

    fn fake_bin() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BINARY);
        std::fs::write(&path, b"").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        dir
    }

    fn benchmark(dir: &tempfile::TempDir, archs: &[&str]) -> Benchmark {
        let params = Parameters::parse("--m 7680 --n 8192 --k 8192")
            .unwrap()
            .set("bin_dir", dir.path().display().to_string());
        let context = RunContext::new(Platform::Rocm).with_architectures(archs.iter().copied());
        Benchmark::new("gemm-flops", Box::new(RocmGemmFlops), &params, context)
    }

    fn commands(benchmark: &Benchmark, dir: &tempfile::TempDir) -> Vec<String> {
        let prefix = dir.path().display().to_string();
        benchmark
            .invocations()
            .iter()
            .map(|i| {
                let rendered = i.action.to_string();
                rendered
                    .strip_prefix(&prefix)
                    .map(|rest| rest.trim_start_matches('/').to_string())
                    .unwrap_or(rendered)
            })
            .collect()
    }

    #[test]
    fn test_xdlops_commands_and_metrics() {
        let dir = fake_bin();
        let mut bench = benchmark(&dir, &["gfx90a"]);
        assert!(bench.preprocess());
        assert_eq!(bench.return_code(), ReturnCode::Success);

        let config = bench.config().unwrap();
        assert_eq!(config.integer("m").unwrap(), 7680);
        assert_eq!(config.integer("n").unwrap(), 8192);
        assert_eq!(config.integer("k").unwrap(), 8192);

        assert_eq!(
            commands(&bench, &dir),
            vec![
                format!("rocblas-bench -r f64_r -f gemm {}", PARAMS),
                format!("rocblas-bench -r f32_r -f gemm_ex --compute_type f32_r {}", PARAMS),
                format!("rocblas-bench -r f16_r -f gemm_ex --compute_type f32_r {}", PARAMS),
                format!("rocblas-bench -r bf16_r -f gemm_ex --compute_type f32_r {}", PARAMS),
                format!(
                    "rocblas-bench --a_type i8_r --b_type i8_r --c_type i32_r --d_type i32_r -f gemm_ex --compute_type i32_r {}",
                    PARAMS
                ),
            ]
        );

        let outputs = [
            "\ntransA,transB,M,N,K,alpha,lda,beta,ldb,ldc,rocblas-Gflops,us\nN,T,7680,8192,8192,1,8384,0,8384,8384, 10037.5, 102694\n",
            "\ntransA,transB,M,N,K,alpha,lda,beta,ldb,ldc,ldd,batch_count,rocblas-Gflops,us\nN,T,8640,8640,8640,1,8640,0,8640,8640,8640,1, 39441.6, 32705.2\n",
            "\ntransA,transB,M,N,K,alpha,lda,beta,ldb,ldc,ldd,batch_count,rocblas-Gflops,us\nN,T,7680,8192,8192,1,8384,0,8384,8384,8384,1, 153728, 6705.3\n",
            "\ntransA,transB,M,N,K,alpha,lda,beta,ldb,ldc,ldd,batch_count,rocblas-Gflops,us\nN,T,7680,8192,8192,1,8384,0,8384,8384,8384,1, 81374.3, 12667.3\n",
            "\ntransA,transB,M,N,K,alpha,lda,beta,ldb,ldc,ldd,batch_count,rocblas-Gflops,us\nT,N,7680,8192,8192,1,8416,0,8416,8416,8416,1, 162675, 6336.5\n",
        ];
        for (index, raw) in outputs.iter().enumerate() {
            assert!(bench.process_raw_output(index, raw));
        }

        let result = bench.result();
        assert_eq!(result.metric("FP64").unwrap().values(), &[10037.5]);
        assert_eq!(result.metric("FP32_xDLOPS").unwrap().values(), &[39441.6]);
        assert_eq!(result.metric("FP16_xDLOPS").unwrap().values(), &[153728.0]);
        assert_eq!(result.metric("BF16_xDLOPS").unwrap().values(), &[81374.3]);
        assert_eq!(result.metric("INT8_xDLOPS").unwrap().values(), &[162675.0]);

        assert!(!bench.process_raw_output(4, "Invalid raw output"));
        assert_eq!(bench.result().raw_capture(4).unwrap().runs.len(), 2);
    }

    #[test]
    fn test_baseline_flags_without_matrix_cores() {
        let dir = fake_bin();
        let mut bench = benchmark(&dir, &["gfx906"]);
        assert!(bench.preprocess());
        let metrics: Vec<_> = bench.invocations().iter().map(|i| i.metric.as_str()).collect();
        assert_eq!(metrics, vec!["FP64", "FP32", "FP16", "BF16", "INT8"]);
        assert!(commands(&bench, &dir)[1].starts_with("rocblas-bench -r f32_r -f gemm --transposeA"));
    }

    #[test]
    fn test_missing_binary_is_runtime_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut bench = benchmark(&dir, &["gfx90a"]);
        assert!(!bench.preprocess());
        assert_eq!(bench.state(), LifecycleState::Failed);
        assert_eq!(bench.return_code(), ReturnCode::RuntimeError);
    }

    #[test]
    fn test_non_executable_binary_is_runtime_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BINARY);
        std::fs::write(&path, b"").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut bench = benchmark(&dir, &[]);
        assert!(!bench.preprocess());
        assert_eq!(bench.return_code(), ReturnCode::RuntimeError);
    }
}

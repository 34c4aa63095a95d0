// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end lifecycle runs against real processes and sockets.

use async_trait::async_trait;
use hwbench_adapters::CommandLine;
use hwbench_benchmarks::micro::gemm::{gemm_options, requested_precisions, GemmShape};
use hwbench_benchmarks::variant::{Variant, VariantTable};
use hwbench_benchmarks::workload::{invoke_options, resolve_binary};
use hwbench_benchmarks::{
    Benchmark, BenchmarkDescriptor, BenchmarkError, BenchmarkKind, LifecycleState, Metrics, ParseError,
    Registry, RunContext, SubInvocation, Workload,
};
use hwbench_core::{BenchmarkConfig, InvocationStatus, OptionSpec, Parameters, Platform, ReturnCode};

const LABELS: [&str; 9] = [
    "FP64", "FP32", "FP16", "FP64_TC", "TF32_TC", "BF16_TC", "FP16_TC", "INT8_TC", "INT4_TC",
];

static ECHO_VARIANTS: VariantTable = VariantTable {
    variants: &[
        Variant { label: "FP64", flags: Some("") },
        Variant { label: "FP32", flags: Some("") },
        Variant { label: "FP16", flags: Some("") },
        Variant { label: "FP64_TC", flags: Some("") },
        Variant { label: "TF32_TC", flags: Some("") },
        Variant { label: "BF16_TC", flags: Some("") },
        Variant { label: "FP16_TC", flags: Some("") },
        Variant { label: "INT8_TC", flags: Some("") },
        Variant { label: "INT4_TC", flags: Some("") },
    ],
    substitutions: &[],
};

/// GEMM-shaped workload whose "binary" is `echo`, reporting the product of
/// the dimensions it was given.
struct EchoGemm;

#[async_trait]
impl Workload for EchoGemm {
    fn options(&self) -> Vec<OptionSpec> {
        let mut options = invoke_options();
        options.extend(gemm_options());
        options
    }

    fn resolve(&self, config: &BenchmarkConfig, context: &RunContext) -> Result<Vec<SubInvocation>, BenchmarkError> {
        let shape = GemmShape::from_config(config)?;
        let binary = resolve_binary(config, context, "echo")?;

        Ok(ECHO_VARIANTS
            .resolve(&requested_precisions(config)?, &context.architectures)
            .into_iter()
            .enumerate()
            .map(|(index, variant)| {
                let command = CommandLine::new(&binary).args([
                    "--precision".to_string(),
                    variant.label.to_string(),
                    "--m".to_string(),
                    shape.m.to_string(),
                    "--n".to_string(),
                    shape.n.to_string(),
                    "--k".to_string(),
                    shape.k.to_string(),
                    "--num_warmup".to_string(),
                    shape.num_warmup.to_string(),
                ]);
                SubInvocation::process(index, variant.label, variant.metric, command)
            })
            .collect())
    }

    fn parse(&self, invocation: &SubInvocation, raw: &str) -> Result<Metrics, ParseError> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let value_of = |flag: &str| {
            tokens
                .iter()
                .position(|t| *t == flag)
                .and_then(|i| tokens.get(i + 1).copied())
                .ok_or_else(|| ParseError::MissingField(flag.to_string()))
        };

        let label = value_of("--precision")?;
        if label != invocation.label {
            return Err(ParseError::LabelMismatch {
                expected: invocation.label.clone(),
                found: label.to_string(),
            });
        }

        let mut flops = 1.0;
        for flag in ["--m", "--n", "--k"] {
            flops *= hwbench_benchmarks::parser::parse_number(flag, value_of(flag)?)?;
        }
        Ok(vec![(invocation.metric.clone(), flops)])
    }
}

fn echo_gemm() -> Box<dyn Workload> {
    Box::new(EchoGemm)
}

fn echo_benchmark(params: &str) -> Benchmark {
    let params = Parameters::parse(params).unwrap().set("bin_dir", "/bin");
    Benchmark::new("echo-gemm", Box::new(EchoGemm), &params, RunContext::new(Platform::Cpu))
}

#[tokio::test]
async fn test_every_precision_runs_in_order() {
    let mut benchmark = echo_benchmark("");
    assert!(benchmark.run().await.unwrap());
    assert_eq!(benchmark.state(), LifecycleState::Finalized);

    let labels: Vec<_> = benchmark.invocations().iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, LABELS);
    assert!(benchmark.invocations()[3]
        .action
        .to_string()
        .ends_with("--precision FP64_TC --m 16384 --n 16384 --k 16384 --num_warmup 5"));

    let result = benchmark.result();
    assert_eq!(result.return_code(), ReturnCode::Success);
    assert_eq!(result.raw_capture_count(), 9);
    for label in LABELS {
        assert_eq!(result.metric(label).unwrap().values(), &[16384f64.powi(3)]);
    }
    assert!(result.start_time.unwrap() <= result.end_time.unwrap());
}

#[tokio::test]
async fn test_unsupported_precision_is_dropped() {
    let mut benchmark = echo_benchmark("--precision FP64 BF64 --m 4 --n 4 --k 4");
    assert!(benchmark.run().await.unwrap());

    let result = benchmark.result();
    assert_eq!(result.metrics().len(), 1);
    assert_eq!(result.metric("FP64").unwrap().values(), &[64.0]);
}

#[tokio::test]
async fn test_no_supported_precision() {
    let mut benchmark = echo_benchmark("--precision BF64");
    assert!(!benchmark.run().await.unwrap());
    assert_eq!(benchmark.state(), LifecycleState::Failed);
    assert_eq!(benchmark.return_code(), ReturnCode::NoSupportedPrecision);
    assert_eq!(benchmark.result().raw_capture_count(), 0);
}

#[tokio::test]
async fn test_repeated_runs_append_samples() {
    let mut benchmark = echo_benchmark("--precision fp32 fp16 --run_count 3 --m 2 --n 2 --k 2");
    assert!(benchmark.run().await.unwrap());

    let result = benchmark.result();
    assert_eq!(result.metric("FP32").unwrap().values(), &[8.0, 8.0, 8.0]);
    assert_eq!(result.raw_capture(1).unwrap().runs.len(), 3);
    assert_eq!(result.outcomes().len(), 6);
}

#[tokio::test]
async fn test_second_run_is_rejected() {
    let mut benchmark = echo_benchmark("--precision FP64 --m 1 --n 1 --k 1");
    assert!(benchmark.run().await.unwrap());
    assert!(matches!(benchmark.run().await, Err(BenchmarkError::AlreadyRun(_))));
    assert_eq!(benchmark.result().metric("FP64").unwrap().len(), 1);
}

#[test]
fn test_label_mismatch_is_a_parse_failure() {
    let mut benchmark = echo_benchmark("--precision FP64 FP32");
    assert!(benchmark.preprocess());
    assert!(!benchmark.process_raw_output(0, "--precision FP32 --m 1 --n 1 --k 1"));

    let outcome = &benchmark.result().outcomes()[0];
    assert!(matches!(outcome.status, InvocationStatus::ParseFailed { .. }));
    assert_eq!(benchmark.result().raw_capture(0).unwrap().runs.len(), 1);
}

#[tokio::test]
async fn test_custom_registration_overrides_defaults() {
    let registry = Registry::builder()
        .register(
            BenchmarkDescriptor::new("echo-gemm", Platform::Cpu),
            BenchmarkKind::Custom(echo_gemm),
            Parameters::new().set("bin_dir", "/bin").set("m", 3i64),
        )
        .unwrap()
        .build();

    let params = Parameters::parse("--precision INT8_TC --n 5 --k 7").unwrap();
    let mut benchmark = registry
        .create("echo-gemm", &params, RunContext::new(Platform::Cpu))
        .unwrap();
    assert!(benchmark.run().await.unwrap());
    assert_eq!(benchmark.result().metric("INT8_TC").unwrap().values(), &[105.0]);
}

#[tokio::test]
async fn test_tcp_connectivity_reachable_and_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let params = Parameters::parse(&format!(
        "--hosts 127.0.0.1 127.0.0.2 --port {} --count 10 --parallel 4",
        port
    ))
    .unwrap();
    let mut benchmark = Registry::builtin()
        .create("tcp-connectivity", &params, RunContext::new(Platform::Cpu))
        .unwrap();
    assert!(benchmark.run().await.unwrap());

    let result = benchmark.result();
    let value = |name: &str| result.metric(name).unwrap().values()[0];
    assert_eq!(value("successes_127.0.0.1"), 10.0);
    assert_eq!(value("failures_127.0.0.1"), 0.0);
    assert_eq!(value("success_rate_127.0.0.1"), 100.0);
    assert!(value("mean_latency_ms_127.0.0.1") >= 0.0);

    assert_eq!(value("successes_127.0.0.2"), 0.0);
    assert_eq!(value("failures_127.0.0.2"), 10.0);
    assert!(result.metric("mean_latency_ms_127.0.0.2").is_none());
    drop(listener);
}

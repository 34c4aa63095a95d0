// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark framework and built-in micro-benchmarks for hwbench.
//!
//! # Quick Start
//!
//! ```no_run
//! use hwbench_benchmarks::{run_benchmarks, Registry, RunContext};
//! use hwbench_core::{Parameters, Platform};
//!
//! # async fn demo() {
//! let context = RunContext::new(Platform::Cpu);
//! let parameters = Parameters::parse("--hosts localhost --port 22").unwrap();
//! let results = run_benchmarks(
//!     &Registry::builtin(),
//!     &["tcp-connectivity".to_string()],
//!     &parameters,
//!     &context,
//! )
//! .await;
//!
//! for result in &results {
//!     println!("{}: {}", result.name, result.return_code());
//! }
//! # }
//! ```
//!
//! # Modules
//!
//! - [`registry`] - selection of an implementation by name, platform and architecture
//! - [`lifecycle`] - the `Benchmark` state machine
//! - [`variant`] - precision and architecture fan-out tables
//! - [`parser`] - raw output parsing helpers
//! - [`probe`] - bounded-concurrency TCP probe engine
//! - [`micro`] - built-in micro-benchmarks
//! - [`io`] - reading and writing results
//! - [`markdown`] - Markdown report generation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod context;
pub mod error;
pub mod invocation;
pub mod io;
pub mod lifecycle;
pub mod markdown;
pub mod micro;
pub mod parser;
pub mod probe;
pub mod registry;
pub mod variant;
pub mod workload;

pub use context::RunContext;
pub use error::{BenchmarkError, ExecutionError};
pub use invocation::{Action, SubInvocation};
pub use lifecycle::{Benchmark, LifecycleState};
pub use parser::{Metrics, ParseError};
pub use probe::{Connector, ProbeEngine, ProbeSettings, ProbeStats, TcpConnector};
pub use registry::{BenchmarkDescriptor, BenchmarkKind, Registry, RegistryError};
pub use workload::Workload;

use hwbench_core::{BenchmarkResult, BenchmarkType, Parameters};
use tracing::{error, info};

/// Run the named benchmarks one after another and return their results.
///
/// A benchmark that cannot be created still yields a result carrying the
/// return code of the failure, so the output has one entry per name.
pub async fn run_benchmarks(
    registry: &Registry,
    names: &[String],
    parameters: &Parameters,
    context: &RunContext,
) -> Vec<BenchmarkResult> {
    let mut results = Vec::with_capacity(names.len());

    for name in names {
        let mut benchmark = match registry.create(name, parameters, context.clone()) {
            Ok(benchmark) => benchmark,
            Err(e) => {
                error!(benchmark = %name, error = %e, "Cannot create benchmark");
                let mut result = BenchmarkResult::new(name.clone(), BenchmarkType::Micro, 0);
                result.set_return_code(e.return_code());
                results.push(result);
                continue;
            }
        };

        if let Err(e) = benchmark.run().await {
            error!(benchmark = %name, error = %e, "Benchmark run rejected");
        }
        results.push(benchmark.into_result());
    }

    info!(
        total = results.len(),
        succeeded = results.iter().filter(|r| r.return_code().is_success()).count(),
        "Benchmarks complete"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwbench_core::{Platform, ReturnCode};

    #[tokio::test]
    async fn test_unknown_and_unsupported_benchmarks_still_report() {
        let context = RunContext::new(Platform::Cpu);
        let names = vec!["nope".to_string(), "gemm-flops".to_string()];
        let results = run_benchmarks(&Registry::builtin(), &names, &Parameters::new(), &context).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "nope");
        assert_eq!(
            results[0].return_code(),
            ReturnCode::MicrobenchmarkUnsupportedArchitecture
        );
        assert_eq!(
            results[1].return_code(),
            ReturnCode::MicrobenchmarkUnsupportedArchitecture
        );
    }

    #[tokio::test]
    async fn test_invalid_parameters_fail_without_running() {
        let context = RunContext::new(Platform::Cpu);
        let parameters = Parameters::parse("--hosts localhost --port 0").unwrap();
        let results = run_benchmarks(
            &Registry::builtin(),
            &["tcp-connectivity".to_string()],
            &parameters,
            &context,
        )
        .await;

        assert_eq!(results[0].return_code(), ReturnCode::InvalidArgument);
        assert_eq!(results[0].raw_capture_count(), 0);
    }
}

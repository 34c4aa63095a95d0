// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lookup from (name, platform, architecture) to a benchmark implementation.
//!
//! The registry is built once and never mutated afterwards. Selection
//! filters by name, then platform. Among the remaining descriptors, the
//! first registered specialization whose architecture tags intersect the
//! detected ones wins; otherwise the first generic descriptor (no tags) is
//! used. A platform with only non-matching specializations is unsupported.

use std::collections::BTreeSet;

use hwbench_core::{Parameters, Platform, ReturnCode};
use thiserror::Error;
use tracing::debug;

use crate::context::RunContext;
use crate::lifecycle::Benchmark;
use crate::micro::{CudaGemmFlops, RocmGemmFlops, TcpConnectivity, TensorRtInference};
use crate::workload::Workload;

/// Errors raised while registering or selecting benchmarks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No benchmark has this name on any platform.
    #[error("Unknown benchmark: {0}")]
    UnknownBenchmark(String),

    /// The benchmark exists but not for this platform or architecture.
    #[error("Benchmark {name} is not supported on {platform}")]
    Unsupported {
        /// Benchmark name.
        name: String,
        /// Requested platform.
        platform: Platform,
    },

    /// The same (name, platform, architectures) was registered twice.
    #[error("Benchmark {name} is already registered for {platform}")]
    Duplicate {
        /// Benchmark name.
        name: String,
        /// Platform.
        platform: Platform,
    },
}

impl RegistryError {
    /// Return code reported for a benchmark that could not be created.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            Self::Duplicate { .. } => ReturnCode::InvalidArgument,
            Self::UnknownBenchmark(_) | Self::Unsupported { .. } => {
                ReturnCode::MicrobenchmarkUnsupportedArchitecture
            }
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Identity of a registered implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkDescriptor {
    /// Logical benchmark name.
    pub name: String,
    /// Platform the implementation runs on.
    pub platform: Platform,
    /// Architectures the implementation is specialized for; empty when generic.
    pub architectures: BTreeSet<String>,
}

impl BenchmarkDescriptor {
    /// Generic descriptor.
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform,
            architectures: BTreeSet::new(),
        }
    }

    /// Specialize the descriptor for the given architectures.
    pub fn with_architectures<I, S>(mut self, architectures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.architectures = architectures.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the descriptor has no architecture tags.
    pub fn is_generic(&self) -> bool {
        self.architectures.is_empty()
    }

    fn matches(&self, detected: &BTreeSet<String>) -> bool {
        !self.architectures.is_disjoint(detected)
    }
}

/// Implementation tag returned by selection.
#[derive(Debug, Clone, Copy)]
pub enum BenchmarkKind {
    /// GEMM throughput through CUTLASS.
    CudaGemmFlops,
    /// GEMM throughput through rocBLAS.
    RocmGemmFlops,
    /// Inference latency through TensorRT.
    TensorRtInference,
    /// TCP reachability probing.
    TcpConnectivity,
    /// Implementation supplied by the embedding application.
    Custom(fn() -> Box<dyn Workload>),
}

impl BenchmarkKind {
    /// Build a fresh workload.
    pub fn instantiate(&self) -> Box<dyn Workload> {
        match self {
            Self::CudaGemmFlops => Box::new(CudaGemmFlops),
            Self::RocmGemmFlops => Box::new(RocmGemmFlops),
            Self::TensorRtInference => Box::new(TensorRtInference),
            Self::TcpConnectivity => Box::new(TcpConnectivity),
            Self::Custom(build) => build(),
        }
    }
}

/// A descriptor, its implementation and default parameters.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Identity.
    pub descriptor: BenchmarkDescriptor,
    /// Implementation.
    pub kind: BenchmarkKind,
    /// Parameters applied before the caller's.
    pub parameters: Parameters,
}

/// Collects registrations before freezing them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<Registration>,
}

impl RegistryBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration. Registration order is the selection tie-break.
    pub fn register(
        mut self,
        descriptor: BenchmarkDescriptor,
        kind: BenchmarkKind,
        parameters: Parameters,
    ) -> Result<Self> {
        if self.entries.iter().any(|entry| entry.descriptor == descriptor) {
            return Err(RegistryError::Duplicate {
                name: descriptor.name,
                platform: descriptor.platform,
            });
        }
        self.entries.push(Registration {
            descriptor,
            kind,
            parameters,
        });
        Ok(self)
    }

    /// Freeze the registrations.
    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

/// Immutable benchmark table.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<Registration>,
}

impl Registry {
    /// Start a new table.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Table of the built-in benchmarks.
    pub fn builtin() -> Self {
        let generic = |name: &str, platform, kind| Registration {
            descriptor: BenchmarkDescriptor::new(name, platform),
            kind,
            parameters: Parameters::new(),
        };

        let mut entries = vec![
            Registration {
                descriptor: BenchmarkDescriptor::new("gemm-flops", Platform::Cuda)
                    .with_architectures(crate::micro::cuda_gemm::SUPPORTED_ARCHITECTURES.iter().copied()),
                kind: BenchmarkKind::CudaGemmFlops,
                parameters: Parameters::new(),
            },
            generic("gemm-flops", Platform::Rocm, BenchmarkKind::RocmGemmFlops),
            generic("tensorrt-inference", Platform::Cuda, BenchmarkKind::TensorRtInference),
        ];
        entries.extend(
            Platform::ALL
                .iter()
                .map(|platform| generic("tcp-connectivity", *platform, BenchmarkKind::TcpConnectivity)),
        );
        Self { entries }
    }

    /// Every registration, in registration order.
    pub fn registrations(&self) -> &[Registration] {
        &self.entries
    }

    /// Select the registration for `name` on `platform` given the detected
    /// architecture tags.
    pub fn select(
        &self,
        name: &str,
        platform: Platform,
        architectures: &BTreeSet<String>,
    ) -> Result<&Registration> {
        let named: Vec<&Registration> = self
            .entries
            .iter()
            .filter(|entry| entry.descriptor.name == name)
            .collect();
        if named.is_empty() {
            return Err(RegistryError::UnknownBenchmark(name.to_string()));
        }

        let on_platform = || named.iter().copied().filter(move |entry| entry.descriptor.platform == platform);
        let selected = on_platform()
            .find(|entry| !entry.descriptor.is_generic() && entry.descriptor.matches(architectures))
            .or_else(|| on_platform().find(|entry| entry.descriptor.is_generic()))
            .ok_or_else(|| RegistryError::Unsupported {
                name: name.to_string(),
                platform,
            })?;

        debug!(
            benchmark = name,
            platform = %platform,
            architectures = ?selected.descriptor.architectures,
            "Selected benchmark implementation"
        );
        Ok(selected)
    }

    /// Select and construct a benchmark for the context's platform and
    /// architectures. `parameters` override the registration's defaults.
    pub fn create(&self, name: &str, parameters: &Parameters, context: RunContext) -> Result<Benchmark> {
        let registration = self.select(name, context.platform, &context.architectures)?;
        let parameters = registration.parameters.merged(parameters);
        Ok(Benchmark::new(
            name,
            registration.kind.instantiate(),
            &parameters,
            context,
        ))
    }
}

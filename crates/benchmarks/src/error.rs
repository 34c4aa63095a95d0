// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for benchmark construction and execution.

use std::path::PathBuf;

use hwbench_adapters::binary::LocateError;
use hwbench_adapters::model_hub::ModelHubError;
use hwbench_adapters::process::ProcessError;
use hwbench_core::{ConfigError, ReturnCode};
use thiserror::Error;

/// Conditions that stop a benchmark before any sub-invocation executes.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// Options failed validation.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// None of the requested variants can run here.
    #[error("No runnable variant among requested {requested:?}")]
    NoRunnableVariant {
        /// Labels the caller asked for; empty means all.
        requested: Vec<String>,
    },

    /// The benchmark binary is unavailable.
    #[error(transparent)]
    Binary(#[from] LocateError),

    /// A model artifact is unavailable.
    #[error(transparent)]
    Model(#[from] ModelHubError),

    /// An input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The detected accelerator architecture is not supported.
    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    /// `run` was called a second time on the same instance.
    #[error("Benchmark {0} has already been run")]
    AlreadyRun(String),
}

impl BenchmarkError {
    /// Return code recorded when this error terminates a run.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            Self::Config(_) | Self::AlreadyRun(_) => ReturnCode::InvalidArgument,
            Self::NoRunnableVariant { .. } => ReturnCode::NoSupportedPrecision,
            Self::Binary(_) | Self::Model(_) | Self::Io { .. } => ReturnCode::RuntimeError,
            Self::UnsupportedArchitecture(_) => ReturnCode::MicrobenchmarkUnsupportedArchitecture,
        }
    }
}

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchmarkError>;

/// Failure to obtain raw output for one sub-invocation.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The external process could not be run to completion.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The sub-invocation kind is not handled by this benchmark.
    #[error("Sub-invocation `{0}` cannot be executed by this benchmark")]
    Unsupported(String),

    /// The executor returned no output for this index.
    #[error("No output was produced")]
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_code_mapping() {
        let config = BenchmarkError::Config(ConfigError::UnknownOption("bogus".into()));
        assert_eq!(config.return_code(), ReturnCode::InvalidArgument);

        let empty = BenchmarkError::NoRunnableVariant {
            requested: vec!["BF64".into()],
        };
        assert_eq!(empty.return_code(), ReturnCode::NoSupportedPrecision);

        let binary = BenchmarkError::Binary(LocateError::NotFound(PathBuf::from("/opt/bin/trtexec")));
        assert_eq!(binary.return_code(), ReturnCode::RuntimeError);

        let arch = BenchmarkError::UnsupportedArchitecture("6.1".into());
        assert_eq!(arch.return_code().code(), 34);
    }
}

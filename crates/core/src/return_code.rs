// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal classification of a benchmark run.

use serde::{Deserialize, Serialize};

/// Return code of a whole benchmark run.
///
/// Numeric values are stable; they are reported next to the name in results
/// and used as process exit detail by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnCode {
    /// At least one metric was produced.
    Success,
    /// Configuration failed validation before execution began.
    InvalidArgument,
    /// A required external resource (binary, model artifact, host file) was unavailable.
    RuntimeError,
    /// None of the requested variants can run on this benchmark.
    NoSupportedPrecision,
    /// Every sub-invocation failed to execute.
    MicrobenchmarkExecutionFailure,
    /// Sub-invocations executed but no usable metric could be parsed.
    MicrobenchmarkResultParsingFailure,
    /// No implementation exists for this platform, or it rejects the detected architecture.
    MicrobenchmarkUnsupportedArchitecture,
}

impl ReturnCode {
    /// Stable numeric value.
    pub fn code(self) -> u32 {
        match self {
            Self::Success => 0,
            Self::InvalidArgument => 1,
            Self::RuntimeError => 4,
            Self::NoSupportedPrecision => 10,
            Self::MicrobenchmarkExecutionFailure => 32,
            Self::MicrobenchmarkResultParsingFailure => 33,
            Self::MicrobenchmarkUnsupportedArchitecture => 34,
        }
    }

    /// Whether this code reports a successful run.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Upper-case name, as serialized.
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::NoSupportedPrecision => "NO_SUPPORTED_PRECISION",
            Self::MicrobenchmarkExecutionFailure => "MICROBENCHMARK_EXECUTION_FAILURE",
            Self::MicrobenchmarkResultParsingFailure => "MICROBENCHMARK_RESULT_PARSING_FAILURE",
            Self::MicrobenchmarkUnsupportedArchitecture => "MICROBENCHMARK_UNSUPPORTED_ARCHITECTURE",
        }
    }
}

impl Default for ReturnCode {
    fn default() -> Self {
        Self::Success
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_name_matches_name() {
        let all = [
            ReturnCode::Success,
            ReturnCode::InvalidArgument,
            ReturnCode::RuntimeError,
            ReturnCode::NoSupportedPrecision,
            ReturnCode::MicrobenchmarkExecutionFailure,
            ReturnCode::MicrobenchmarkResultParsingFailure,
            ReturnCode::MicrobenchmarkUnsupportedArchitecture,
        ];
        for code in all {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.name()));
        }
    }

    #[test]
    fn test_display_includes_numeric_code() {
        assert_eq!(
            ReturnCode::NoSupportedPrecision.to_string(),
            "NO_SUPPORTED_PRECISION (10)"
        );
    }
}

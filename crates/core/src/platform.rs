// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Accelerator platforms a benchmark can be registered for.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platform a benchmark implementation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Host CPU only.
    Cpu,
    /// NVIDIA GPUs driven through CUDA.
    Cuda,
    /// AMD GPUs driven through ROCm.
    Rocm,
}

/// Error returned when a platform name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown platform `{0}`. Supported platforms: cpu, cuda, rocm")]
pub struct UnknownPlatform(pub String);

impl Platform {
    /// Every known platform, in declaration order.
    pub const ALL: [Platform; 3] = [Platform::Cpu, Platform::Cuda, Platform::Rocm];

    /// Lowercase platform name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Rocm => "rocm",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            "rocm" => Ok(Self::Rocm),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! External collaborators used by hwbench benchmarks.
//!
//! Each adapter is a thin layer over something outside the benchmark core:
//!
//! - **Process**: run an opaque command line with a wall-clock timeout
//! - **Binary**: resolve a binary directory plus file name into an executable path
//! - **Model hub**: get-or-fetch cache of exported model artifacts
//! - **Device**: detect the accelerator architecture tags of the host
//!
//! # Example
//!
//! ```ignore
//! use hwbench_adapters::prelude::*;
//!
//! let runner = TokioCommandRunner::new();
//! let output = runner
//!     .run(&CommandLine::new("rocblas-bench").arg("-f").arg("gemm"), Duration::from_secs(600))
//!     .await?;
//! println!("{}", output.stdout);
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod binary;
pub mod device;
pub mod model_hub;
pub mod process;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::binary::{locate_binary, LocateError};
    pub use super::device::{detect_architectures, ArchitectureTags};
    pub use super::model_hub::{ModelHub, ModelHubError, OnnxModelCache};
    pub use super::process::{CommandLine, CommandRunner, ProcessError, ProcessOutput, TokioCommandRunner};
}

pub use binary::locate_binary;
pub use device::detect_architectures;
pub use model_hub::{ModelHub, OnnxModelCache};
pub use process::{CommandLine, CommandRunner, TokioCommandRunner};

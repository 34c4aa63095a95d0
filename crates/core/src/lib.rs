// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types shared by every hwbench benchmark.
//!
//! This crate holds the pieces that have no knowledge of how a benchmark is
//! executed:
//!
//! - [`result`] - the per-run `BenchmarkResult` with metric series and raw captures
//! - [`return_code`] - the terminal `ReturnCode` taxonomy
//! - [`platform`] - the accelerator `Platform` enumeration
//! - [`config`] - declared benchmark options, caller parameters and validation

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod platform;
pub mod result;
pub mod return_code;

pub use config::{BenchmarkConfig, ConfigError, Domain, OptionKind, OptionSpec, OptionValue, Parameters};
pub use platform::{Platform, UnknownPlatform};
pub use result::{
    BenchmarkResult, BenchmarkType, InvocationOutcome, InvocationStatus, MetricSeries, RawCapture,
};
pub use return_code::ReturnCode;

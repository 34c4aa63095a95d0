// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Accelerator architecture detection.
//!
//! NVIDIA devices report a compute capability such as `8.0`; AMD devices
//! report a `gfx` target such as `gfx90a`. Detection never fails: when the
//! vendor tool is missing or prints something unexpected the tag set is
//! empty, and benchmarks fall back to their generic behavior.

use std::collections::BTreeSet;
use std::time::Duration;

use hwbench_core::Platform;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::process::{CommandLine, CommandRunner};

/// Set of architecture tags reported by the host.
pub type ArchitectureTags = BTreeSet<String>;

const DETECT_TIMEOUT: Duration = Duration::from_secs(30);

static COMPUTE_CAPABILITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+\.\d+)\b").expect("valid compute capability regex"));

static GFX_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(gfx[0-9a-f]{3,4})\b").expect("valid gfx target regex"));

/// Query the vendor tool for `platform` and return the detected tags.
pub async fn detect_architectures(platform: Platform, runner: &dyn CommandRunner) -> ArchitectureTags {
    let (command, parse): (CommandLine, fn(&str) -> Option<String>) = match platform {
        Platform::Cpu => return ArchitectureTags::new(),
        Platform::Cuda => (
            CommandLine::new("nvidia-smi")
                .arg("--query-gpu=compute_cap")
                .arg("--format=csv,noheader"),
            parse_compute_capability,
        ),
        Platform::Rocm => (CommandLine::new("rocminfo"), parse_gfx_target),
    };

    let output = match runner.run(&command, DETECT_TIMEOUT).await {
        Ok(output) if output.success() => output,
        Ok(output) => {
            warn!(
                platform = %platform,
                exit_code = ?output.exit_code,
                "Architecture query exited with failure"
            );
            return ArchitectureTags::new();
        }
        Err(e) => {
            warn!(platform = %platform, error = %e, "Architecture query failed");
            return ArchitectureTags::new();
        }
    };

    match parse(&output.stdout) {
        Some(tag) => {
            debug!(platform = %platform, tag = %tag, "Detected architecture");
            ArchitectureTags::from([tag])
        }
        None => {
            warn!(platform = %platform, "Could not parse architecture from query output");
            ArchitectureTags::new()
        }
    }
}

/// Compute capability from the first line of `nvidia-smi` CSV output.
pub fn parse_compute_capability(output: &str) -> Option<String> {
    let line = output.lines().find(|line| !line.trim().is_empty())?;
    COMPUTE_CAPABILITY
        .captures(line)
        .map(|caps| caps[1].to_string())
}

/// First `gfx` target mentioned in `rocminfo` output.
pub fn parse_gfx_target(output: &str) -> Option<String> {
    GFX_TARGET.captures(output).map(|caps| caps[1].to_string())
}

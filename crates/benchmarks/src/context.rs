// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Runtime environment handed to every benchmark.

use std::path::PathBuf;
use std::sync::Arc;

use hwbench_adapters::device::ArchitectureTags;
use hwbench_adapters::{CommandRunner, ModelHub, OnnxModelCache, TokioCommandRunner};
use hwbench_core::Platform;

/// Default root for vendor binaries (`<micro_path>/bin`) and models.
pub const DEFAULT_MICRO_PATH: &str = "/opt/hwbench";

/// Platform, detected architectures and external collaborators for a run.
#[derive(Clone)]
pub struct RunContext {
    /// Platform the benchmarks run on.
    pub platform: Platform,
    /// Architecture tags of the accelerators present.
    pub architectures: ArchitectureTags,
    /// Root directory of the micro-benchmark installation.
    pub micro_path: PathBuf,
    /// Executes sub-invocation command lines.
    pub runner: Arc<dyn CommandRunner>,
    /// Supplies model artifacts to inference benchmarks.
    pub model_hub: Arc<dyn ModelHub>,
}

impl RunContext {
    /// Context with no architecture tags, a tokio process runner and a model
    /// cache under `<micro_path>/models`.
    pub fn new(platform: Platform) -> Self {
        let micro_path = PathBuf::from(DEFAULT_MICRO_PATH);
        Self {
            platform,
            architectures: ArchitectureTags::new(),
            model_hub: Arc::new(OnnxModelCache::new(micro_path.join("models"))),
            micro_path,
            runner: Arc::new(TokioCommandRunner::new()),
        }
    }

    /// Replace the architecture tags.
    pub fn with_architectures<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.architectures = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the micro-benchmark root.
    pub fn with_micro_path(mut self, micro_path: impl Into<PathBuf>) -> Self {
        self.micro_path = micro_path.into();
        self
    }

    /// Replace the process runner.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replace the model hub.
    pub fn with_model_hub(mut self, model_hub: Arc<dyn ModelHub>) -> Self {
        self.model_hub = model_hub;
        self
    }

    /// Directory searched for binaries when a benchmark's `bin_dir` is empty.
    pub fn default_bin_dir(&self) -> PathBuf {
        self.micro_path.join("bin")
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("platform", &self.platform)
            .field("architectures", &self.architectures)
            .field("micro_path", &self.micro_path)
            .finish_non_exhaustive()
    }
}

// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Layered runtime settings.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `HWBENCH_*` environment variables (e.g. `HWBENCH_MICRO_PATH`)
//!
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use hwbench_benchmarks::context::DEFAULT_MICRO_PATH;
use hwbench_benchmarks::io::DEFAULT_OUTPUT_DIR;
use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "HWBENCH";

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Root of the installed benchmark binaries.
    pub micro_path: PathBuf,
    /// Directory results are written to.
    pub output_dir: PathBuf,
    /// Directory holding exported models; defaults to `<micro_path>/models`.
    #[serde(default)]
    pub model_cache_dir: Option<PathBuf>,
    /// Platform override; detected from the host when unset.
    #[serde(default)]
    pub platform: Option<String>,
    /// Comma-separated architecture tags that replace detection.
    #[serde(default)]
    pub architecture: Option<String>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Settings {
    /// Load settings from defaults, `file` and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("micro_path", DEFAULT_MICRO_PATH)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("log_level", "info")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    /// Model cache directory.
    pub fn model_cache(&self) -> PathBuf {
        self.model_cache_dir
            .clone()
            .unwrap_or_else(|| self.micro_path.join("models"))
    }

    /// Architecture override split into tags.
    pub fn architecture_tags(&self) -> Option<Vec<String>> {
        self.architecture.as_ref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.micro_path, PathBuf::from(DEFAULT_MICRO_PATH));
        assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(settings.model_cache(), PathBuf::from(DEFAULT_MICRO_PATH).join("models"));
        assert_eq!(settings.architecture_tags(), None);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "micro_path = \"/srv/bench\"\nplatform = \"rocm\"\narchitecture = \"gfx90a, gfx942\""
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.micro_path, PathBuf::from("/srv/bench"));
        assert_eq!(settings.platform.as_deref(), Some("rocm"));
        assert_eq!(settings.model_cache(), PathBuf::from("/srv/bench/models"));
        assert_eq!(
            settings.architecture_tags(),
            Some(vec!["gfx90a".to_string(), "gfx942".to_string()])
        );
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/hwbench.toml"))).is_err());
    }
}

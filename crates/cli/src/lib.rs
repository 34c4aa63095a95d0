// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for hwbench.
//!
//! This crate provides the command-line interface for hwbench, including
//! the `run` subcommand that executes benchmarks and writes results.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod logging;
pub mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hwbench_adapters::{detect_architectures, OnnxModelCache, TokioCommandRunner};
use hwbench_benchmarks::{io, markdown, run_benchmarks, Registry, RunContext};
use hwbench_core::{Parameters, Platform};
use tracing::info;

use crate::settings::Settings;

/// hwbench CLI.
#[derive(Parser, Debug)]
#[command(name = "hwbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (TOML).
    #[arg(short, long, global = true, env = "HWBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run benchmarks and write results to the output directory.
    ///
    /// Results are written to:
    /// - <output>/raw/ - Individual JSON files per benchmark
    /// - <output>/all_results.json - Combined JSON file
    /// - <output>/summary.md - Markdown summary
    Run {
        /// Benchmark names.
        #[arg(required = true)]
        names: Vec<String>,

        /// Platform to run on (cpu, cuda, rocm).
        #[arg(short, long)]
        platform: Option<Platform>,

        /// Benchmark parameters, e.g. "--precision fp32 fp16 --m 8192".
        #[arg(long, allow_hyphen_values = true)]
        parameters: Option<String>,

        /// Output directory override.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated architecture tags; skips detection.
        #[arg(short, long)]
        architecture: Option<String>,
    },

    /// List registered benchmarks.
    List {
        /// Only list benchmarks available on this platform.
        #[arg(short, long)]
        platform: Option<Platform>,
    },

    /// Show settings and output locations.
    Status {
        /// Also print a detailed report of the last stored results.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Run the CLI command.
///
/// # Returns
///
/// `Ok(true)` when every benchmark succeeded, `Ok(false)` when at least one
/// reported a failure return code.
pub async fn run(cli: Cli) -> anyhow::Result<bool> {
    let _ = dotenvy::dotenv();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    logging::init(&settings.log_level, cli.log_json);

    match cli.command {
        Commands::Run {
            names,
            platform,
            parameters,
            output,
            architecture,
        } => {
            let platform = match platform {
                Some(platform) => platform,
                None => settings
                    .platform
                    .as_deref()
                    .unwrap_or("cpu")
                    .parse()
                    .context("Invalid platform in settings")?,
            };
            let parameters = Parameters::parse(parameters.as_deref().unwrap_or(""))
                .context("Invalid benchmark parameters")?;

            let runner = Arc::new(TokioCommandRunner::new());
            let overridden = match architecture {
                Some(list) => Settings {
                    architecture: Some(list),
                    ..settings.clone()
                }
                .architecture_tags(),
                None => settings.architecture_tags(),
            };
            let architectures = match overridden {
                Some(tags) => tags.into_iter().collect(),
                None => detect_architectures(platform, runner.as_ref()).await,
            };
            info!(platform = %platform, architectures = ?architectures, "Using platform");

            let context = RunContext::new(platform)
                .with_micro_path(&settings.micro_path)
                .with_architectures(architectures)
                .with_runner(runner)
                .with_model_hub(Arc::new(OnnxModelCache::new(settings.model_cache())));

            let results = run_benchmarks(&Registry::builtin(), &names, &parameters, &context).await;

            let output_dir = output.unwrap_or_else(|| settings.output_dir.clone());
            io::write_all_outputs(&output_dir, &results)
                .with_context(|| format!("Failed to write results to {}", output_dir.display()))?;

            for result in &results {
                println!(
                    "  - {}: {} ({} metrics)",
                    result.name,
                    result.return_code(),
                    result.metrics().len()
                );
            }
            println!("Completed {} benchmarks", results.len());
            println!("Results written to {}", output_dir.display());

            Ok(results.iter().all(|r| r.return_code().is_success()))
        }
        Commands::List { platform } => {
            let registry = Registry::builtin();
            for entry in registry.registrations() {
                if platform.map_or(false, |p| entry.descriptor.platform != p) {
                    continue;
                }
                let architectures = if entry.descriptor.is_generic() {
                    "any".to_string()
                } else {
                    entry
                        .descriptor
                        .architectures
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(",")
                };
                println!(
                    "{:<20} {:<6} {}",
                    entry.descriptor.name, entry.descriptor.platform, architectures
                );
            }
            Ok(true)
        }
        Commands::Status { detailed } => {
            println!("hwbench");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Micro path: {}", settings.micro_path.display());
            println!("Output directory: {}", settings.output_dir.display());

            if detailed {
                println!("\nModel cache: {}", settings.model_cache().display());
                println!(
                    "Platform: {}",
                    settings.platform.as_deref().unwrap_or("cpu (default)")
                );
                println!("\nOutput files:");
                println!("  - {}", settings.output_dir.join(io::RAW_DIR).display());
                println!("  - {}", settings.output_dir.join(io::ALL_RESULTS_FILE).display());
                println!("  - {}", settings.output_dir.join(io::SUMMARY_FILE).display());

                match stored_report(&settings.output_dir)? {
                    Some(report) => println!("\n{}", report),
                    None => println!("\nNo stored results"),
                }
            }

            Ok(true)
        }
    }
}

/// Detailed report of the results stored under `output_dir`, or `None` when
/// no combined results file exists there.
pub fn stored_report(output_dir: &Path) -> anyhow::Result<Option<String>> {
    let path = output_dir.join(io::ALL_RESULTS_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let results =
        io::read_results_json(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Some(markdown::generate_detailed_report(&results)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "hwbench",
            "run",
            "gemm-flops",
            "tcp-connectivity",
            "--platform",
            "rocm",
            "--parameters",
            "--precision fp32 --m 8192",
            "--architecture",
            "gfx90a",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                names,
                platform,
                parameters,
                architecture,
                ..
            } => {
                assert_eq!(names, vec!["gemm-flops", "tcp-connectivity"]);
                assert_eq!(platform, Some(Platform::Rocm));
                assert_eq!(parameters.as_deref(), Some("--precision fp32 --m 8192"));
                assert_eq!(architecture.as_deref(), Some("gfx90a"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_a_name() {
        assert!(Cli::try_parse_from(["hwbench", "run"]).is_err());
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        assert!(Cli::try_parse_from(["hwbench", "list", "--platform", "tpu"]).is_err());
    }

    #[tokio::test]
    async fn test_run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "hwbench".to_string(),
            "run".to_string(),
            "no-such-benchmark".to_string(),
            "--platform".to_string(),
            "cpu".to_string(),
            "--output".to_string(),
            dir.path().display().to_string(),
        ])
        .unwrap();

        assert!(!run(cli).await.unwrap());
        assert!(dir.path().join(io::ALL_RESULTS_FILE).is_file());
        assert!(dir.path().join("raw/no-such-benchmark.json").is_file());
    }

    #[tokio::test]
    async fn test_stored_report_reads_back_run_results() {
        let dir = tempfile::tempdir().unwrap();
        assert!(stored_report(dir.path()).unwrap().is_none());

        let cli = Cli::try_parse_from([
            "hwbench".to_string(),
            "run".to_string(),
            "no-such-benchmark".to_string(),
            "--platform".to_string(),
            "cpu".to_string(),
            "--output".to_string(),
            dir.path().display().to_string(),
        ])
        .unwrap();
        run(cli).await.unwrap();

        let report = stored_report(dir.path()).unwrap().unwrap();
        assert!(report.contains("no-such-benchmark"));
    }

    #[test]
    fn test_stored_report_rejects_corrupt_results() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(io::ALL_RESULTS_FILE), "not json").unwrap();
        assert!(stored_report(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_detailed_status() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("hwbench.toml");
        std::fs::write(
            &settings,
            format!("output_dir = {:?}\n", dir.path().display().to_string()),
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "hwbench".to_string(),
            "status".to_string(),
            "--detailed".to_string(),
            "--config".to_string(),
            settings.display().to_string(),
        ])
        .unwrap();
        assert!(run(cli).await.unwrap());
    }
}

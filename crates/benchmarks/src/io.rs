// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! I/O operations for benchmark results.
//!
//! Results are written under an output directory as:
//! - `raw/<name>.json` - one file per benchmark
//! - `all_results.json` - every result in one array
//! - `summary.md` - markdown summary table

use hwbench_core::BenchmarkResult;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::markdown;

/// Default output directory path.
pub const DEFAULT_OUTPUT_DIR: &str = "benchmarks/output";

/// Name of the per-benchmark subdirectory.
pub const RAW_DIR: &str = "raw";

/// Name of the combined results file.
pub const ALL_RESULTS_FILE: &str = "all_results.json";

/// Name of the summary file.
pub const SUMMARY_FILE: &str = "summary.md";

/// Ensure the output and raw directories exist.
pub fn ensure_output_dirs(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir.join(RAW_DIR))
}

/// Write benchmark results to a JSON file.
pub fn write_results_json(results: &[BenchmarkResult], path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(results)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Path of the raw file for a result.
pub fn raw_result_path(dir: &Path, result: &BenchmarkResult) -> PathBuf {
    dir.join(RAW_DIR)
        .join(format!("{}.json", result.name.replace(['/', '\\'], "_")))
}

/// Write an individual result to the raw directory.
pub fn write_raw_result(dir: &Path, result: &BenchmarkResult) -> io::Result<()> {
    ensure_output_dirs(dir)?;
    let json = result
        .to_json()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(raw_result_path(dir, result), json)
}

/// Write the summary markdown file.
pub fn write_summary(dir: &Path, results: &[BenchmarkResult]) -> io::Result<()> {
    ensure_output_dirs(dir)?;
    fs::write(dir.join(SUMMARY_FILE), markdown::generate_summary(results))
}

/// Write all benchmark outputs (raw JSON, combined JSON and summary).
pub fn write_all_outputs(dir: &Path, results: &[BenchmarkResult]) -> io::Result<()> {
    ensure_output_dirs(dir)?;

    for result in results {
        write_raw_result(dir, result)?;
    }
    write_results_json(results, dir.join(ALL_RESULTS_FILE))?;
    write_summary(dir, results)?;

    Ok(())
}

/// Read results from a JSON file.
pub fn read_results_json(path: impl AsRef<Path>) -> io::Result<Vec<BenchmarkResult>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwbench_core::{BenchmarkType, ReturnCode};

    fn sample() -> Vec<BenchmarkResult> {
        let mut gemm = BenchmarkResult::new("gemm-flops", BenchmarkType::Micro, 1);
        gemm.add_raw_data(0, "rocblas-Gflops\n10037.5");
        gemm.add_metric("FP64", 10037.5);

        let mut probe = BenchmarkResult::new("tcp/connectivity", BenchmarkType::Micro, 1);
        probe.set_return_code(ReturnCode::MicrobenchmarkExecutionFailure);
        vec![gemm, probe]
    }

    #[test]
    fn test_write_all_outputs_layout() {
        let dir = tempfile::tempdir().unwrap();
        let results = sample();
        write_all_outputs(dir.path(), &results).unwrap();

        assert!(dir.path().join("raw/gemm-flops.json").is_file());
        assert!(dir.path().join("raw/tcp_connectivity.json").is_file());
        assert!(dir.path().join(SUMMARY_FILE).is_file());

        let read = read_results_json(dir.path().join(ALL_RESULTS_FILE)).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].metric("FP64").unwrap().values(), &[10037.5]);
        assert_eq!(read[0].raw_capture(0).unwrap().runs.len(), 1);
        assert_eq!(read[1].return_code(), ReturnCode::MicrobenchmarkExecutionFailure);
    }

    #[test]
    fn test_read_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();
        let err = read_results_json(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}

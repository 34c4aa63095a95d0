// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! hwbench CLI entry point.

use clap::Parser;
use hwbench_cli::Cli;

#[tokio::main]
async fn main() {
    match hwbench_cli::run(Cli::parse()).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

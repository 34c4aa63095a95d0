// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! External process execution.
//!
//! Benchmarks hand an opaque [`CommandLine`] to a [`CommandRunner`] and get
//! back the captured standard output. The exit status is reported but never
//! interpreted here; whether the output is usable is decided by the parser.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while running an external process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be started.
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process or reading its output failed.
    #[error("Failed to collect output of `{program}`: {source}")]
    Wait {
        /// Program being waited on.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish in time and was killed.
    #[error("Command `{command}` timed out after {timeout:?}")]
    Timeout {
        /// Rendered command line.
        command: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },
}

/// Result type for process operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Program plus argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLine {
    /// Command line with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.chars().any(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Wall-clock time until exit.
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion, killing it once `timeout` elapses.
    async fn run(&self, command: &CommandLine, timeout: Duration) -> Result<ProcessOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    /// Create a runner.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &CommandLine, timeout: Duration) -> Result<ProcessOutput> {
        let program = command.program().display().to_string();
        debug!(command = %command, ?timeout, "Spawning process");

        let started = Instant::now();
        let child = tokio::process::Command::new(command.program())
            .args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Dropping the pending future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ProcessError::Timeout {
                command: command.to_string(),
                timeout,
            })?
            .map_err(|source| ProcessError::Wait { program, source })?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: started.elapsed(),
        })
    }
}

// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Concrete units of work derived from a benchmark request.

use hwbench_adapters::CommandLine;

/// What a sub-invocation does when executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run an external process and capture its standard output.
    Process(CommandLine),
    /// Probe TCP reachability of a host.
    Probe {
        /// Target host name or address.
        host: String,
        /// Target port.
        port: u16,
    },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Process(command) => write!(f, "{}", command),
            Self::Probe { host, port } => write!(f, "tcp-probe {}:{}", host, port),
        }
    }
}

/// One entry of a benchmark's ordered sub-invocation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubInvocation {
    /// Position in the list; raw captures are keyed by it.
    pub index: usize,
    /// Requested label this entry was built for (precision, model, host).
    pub label: String,
    /// Metric name, or name stem, the parsed output is recorded under.
    pub metric: String,
    /// Work to perform.
    pub action: Action,
}

impl SubInvocation {
    /// Sub-invocation running `command`.
    pub fn process(
        index: usize,
        label: impl Into<String>,
        metric: impl Into<String>,
        command: CommandLine,
    ) -> Self {
        Self {
            index,
            label: label.into(),
            metric: metric.into(),
            action: Action::Process(command),
        }
    }

    /// Sub-invocation probing `host:port`. The host doubles as label and metric stem.
    pub fn probe(index: usize, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            index,
            label: host.clone(),
            metric: host.clone(),
            action: Action::Probe { host, port },
        }
    }

    /// Command line, if this sub-invocation runs a process.
    pub fn command(&self) -> Option<&CommandLine> {
        match &self.action {
            Action::Process(command) => Some(command),
            Action::Probe { .. } => None,
        }
    }
}

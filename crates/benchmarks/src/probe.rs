// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded-concurrency TCP reachability probing.
//!
//! Each host is owned by one task that performs its attempts in order and
//! builds that host's statistics alone. A shared semaphore caps how many
//! attempts are in flight across all hosts at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Probe parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Target TCP port.
    pub port: u16,
    /// Attempts per host.
    pub count: u32,
    /// Per-attempt connect timeout; an expired attempt is a failure.
    pub timeout: Duration,
    /// Maximum attempts in flight across all hosts.
    pub parallel: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            port: 22,
            count: 10,
            timeout: Duration::from_secs(1),
            parallel: 2,
        }
    }
}

/// Latency over successful attempts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    /// Fastest connect.
    pub min_ms: f64,
    /// Average connect.
    pub mean_ms: f64,
    /// Slowest connect.
    pub max_ms: f64,
}

/// Per-host probe statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeStats {
    /// Probed host.
    pub host: String,
    /// Probed port.
    pub port: u16,
    /// Attempts made.
    pub attempts: u32,
    /// Attempts that connected within the timeout.
    pub successes: u32,
    /// Attempts that were refused, errored or timed out.
    pub failures: u32,
    /// Absent when no attempt succeeded.
    pub latency: Option<LatencySummary>,
}

impl ProbeStats {
    /// Aggregate attempt samples; `Some(ms)` is a successful connect.
    pub fn from_samples(host: impl Into<String>, port: u16, samples: &[Option<f64>]) -> Self {
        let latencies: Vec<f64> = samples.iter().flatten().copied().collect();
        let latency = if latencies.is_empty() {
            None
        } else {
            let min_ms = latencies.iter().copied().fold(f64::INFINITY, f64::min);
            let max_ms = latencies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean_ms = latencies.iter().sum::<f64>() / latencies.len() as f64;
            Some(LatencySummary {
                min_ms,
                mean_ms,
                max_ms,
            })
        };

        let successes = latencies.len() as u32;
        let attempts = samples.len() as u32;
        Self {
            host: host.into(),
            port,
            attempts,
            successes,
            failures: attempts - successes,
            latency,
        }
    }

    /// Successes over attempts as a percentage; zero when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.successes) * 100.0 / f64::from(self.attempts)
        }
    }

    /// Single-line `key=value` rendering used as the raw capture.
    pub fn render(&self) -> String {
        let mut line = format!(
            "host={} port={} attempts={} successes={} failures={} success_rate={}",
            self.host,
            self.port,
            self.attempts,
            self.successes,
            self.failures,
            self.success_rate()
        );
        if let Some(latency) = &self.latency {
            line.push_str(&format!(
                " min_ms={} mean_ms={} max_ms={}",
                latency.min_ms, latency.mean_ms, latency.max_ms
            ));
        }
        line
    }
}

/// Opens one connection to a host.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `host:port` and drop the connection.
    async fn connect(&self, host: &str, port: u16) -> std::io::Result<()>;
}

/// Plain TCP connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, host: &str, port: u16) -> std::io::Result<()> {
        TcpStream::connect((host, port)).await.map(drop)
    }
}

/// Runs probe attempts against a set of hosts.
#[derive(Clone)]
pub struct ProbeEngine {
    settings: ProbeSettings,
    connector: Arc<dyn Connector>,
}

impl std::fmt::Debug for ProbeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ProbeEngine {
    /// Engine connecting over TCP.
    pub fn new(settings: ProbeSettings) -> Self {
        Self::with_connector(settings, Arc::new(TcpConnector))
    }

    /// Engine using the given connector.
    pub fn with_connector(settings: ProbeSettings, connector: Arc<dyn Connector>) -> Self {
        Self { settings, connector }
    }

    /// Probe every host and return statistics in input order.
    pub async fn run(&self, hosts: &[String]) -> Vec<ProbeStats> {
        let settings = self.settings;
        let semaphore = Arc::new(Semaphore::new(settings.parallel.max(1)));
        let mut tasks = JoinSet::new();

        for (position, host) in hosts.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let connector = Arc::clone(&self.connector);
            let host = host.clone();
            tasks.spawn(async move {
                let stats = probe_host(&host, settings, &semaphore, connector.as_ref()).await;
                (position, stats)
            });
        }

        let mut slots: Vec<Option<ProbeStats>> = vec![None; hosts.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, stats)) => slots[position] = Some(stats),
                Err(e) => error!(error = %e, "Probe task did not complete"),
            }
        }

        let failed = vec![None; settings.count as usize];
        slots
            .into_iter()
            .zip(hosts)
            .map(|(slot, host)| {
                slot.unwrap_or_else(|| ProbeStats::from_samples(host.as_str(), settings.port, &failed))
            })
            .collect()
    }
}

async fn probe_host(
    host: &str,
    settings: ProbeSettings,
    semaphore: &Semaphore,
    connector: &dyn Connector,
) -> ProbeStats {
    let mut samples = Vec::with_capacity(settings.count as usize);
    for attempt in 0..settings.count {
        let sample = match semaphore.acquire().await {
            Ok(_permit) => connect_once(connector, host, settings.port, settings.timeout).await,
            Err(_) => None,
        };
        debug!(host, attempt, latency_ms = ?sample, "Probe attempt finished");
        samples.push(sample);
    }
    ProbeStats::from_samples(host, settings.port, &samples)
}

async fn connect_once(connector: &dyn Connector, host: &str, port: u16, timeout: Duration) -> Option<f64> {
    let started = Instant::now();
    match tokio::time::timeout(timeout, connector.connect(host, port)).await {
        Ok(Ok(())) => Some(started.elapsed().as_secs_f64() * 1000.0),
        Ok(Err(e)) => {
            debug!(host, port, error = %e, "Connect failed");
            None
        }
        Err(_) => {
            debug!(host, port, ?timeout, "Connect timed out");
            None
        }
    }
}

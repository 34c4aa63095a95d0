// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! TCP reachability of a set of hosts.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use hwbench_core::{BenchmarkConfig, OptionSpec};
use tracing::warn;

use crate::context::RunContext;
use crate::error::{BenchmarkError, ExecutionError};
use crate::invocation::{Action, SubInvocation};
use crate::parser::{key_value_fields, parse_number, required_number, Metrics, ParseError};
use crate::probe::{ProbeEngine, ProbeSettings};
use crate::workload::Workload;

/// `tcp-connectivity` on any platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnectivity;

impl TcpConnectivity {
    fn settings(config: &BenchmarkConfig) -> Result<ProbeSettings, BenchmarkError> {
        let defaults = ProbeSettings::default();
        Ok(ProbeSettings {
            port: u16::try_from(config.integer("port")?).unwrap_or(defaults.port),
            count: u32::try_from(config.integer("count")?).unwrap_or(defaults.count),
            timeout: Duration::from_secs(u64::try_from(config.integer("timeout")?).unwrap_or(1)),
            parallel: usize::try_from(config.integer("parallel")?).unwrap_or(defaults.parallel),
        })
    }
}

/// Hosts from `listed` followed by those in `hostfile`, without duplicates.
pub fn collect_hosts(listed: &[String], hostfile: Option<&Path>) -> Result<Vec<String>, BenchmarkError> {
    let mut hosts: Vec<String> = Vec::new();
    let mut push = |host: &str| {
        let host = host.trim();
        if !host.is_empty() && !hosts.iter().any(|h| h == host) {
            hosts.push(host.to_string());
        }
    };

    listed.iter().for_each(|host| push(host));
    if let Some(path) = hostfile {
        let content = std::fs::read_to_string(path).map_err(|source| BenchmarkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.lines().for_each(|line| push(line));
    }
    Ok(hosts)
}

#[async_trait]
impl Workload for TcpConnectivity {
    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::list("hosts", &[], "Hosts to probe"),
            OptionSpec::text("hostfile", "", "File with one host per line"),
            OptionSpec::integer("port", 22, "TCP port to connect to").range(1, 65535),
            OptionSpec::integer("count", 10, "Connection attempts per host").at_least(1),
            OptionSpec::integer("timeout", 1, "Per-attempt timeout in seconds").at_least(1),
            OptionSpec::integer("parallel", 2, "Maximum attempts in flight").at_least(1),
        ]
    }

    fn resolve(
        &self,
        config: &BenchmarkConfig,
        _context: &RunContext,
    ) -> Result<Vec<SubInvocation>, BenchmarkError> {
        let settings = Self::settings(config)?;
        let hostfile = config.text("hostfile")?;
        let hostfile = (!hostfile.is_empty()).then(|| Path::new(hostfile));

        Ok(collect_hosts(config.list("hosts")?, hostfile)?
            .into_iter()
            .enumerate()
            .map(|(index, host)| SubInvocation::probe(index, host, settings.port))
            .collect())
    }

    fn parse(&self, invocation: &SubInvocation, raw: &str) -> Result<Metrics, ParseError> {
        let fields = key_value_fields(raw.trim());
        let host = fields
            .get("host")
            .ok_or_else(|| ParseError::MissingField("host".to_string()))?;
        if *host != invocation.label {
            return Err(ParseError::LabelMismatch {
                expected: invocation.label.clone(),
                found: host.to_string(),
            });
        }

        let stem = &invocation.metric;
        let successes = required_number(&fields, "successes")?;
        let mut metrics = vec![
            (format!("successes_{}", stem), successes),
            (format!("failures_{}", stem), required_number(&fields, "failures")?),
            (format!("success_rate_{}", stem), required_number(&fields, "success_rate")?),
        ];

        if successes > 0.0 {
            for (field, metric) in [
                ("min_ms", "min_latency_ms"),
                ("mean_ms", "mean_latency_ms"),
                ("max_ms", "max_latency_ms"),
            ] {
                let value = fields
                    .get(field)
                    .ok_or_else(|| ParseError::MissingField(field.to_string()))?;
                metrics.push((format!("{}_{}", metric, stem), parse_number(field, value)?));
            }
        }
        Ok(metrics)
    }

    async fn execute(
        &self,
        invocations: &[SubInvocation],
        config: &BenchmarkConfig,
        _context: &RunContext,
    ) -> Vec<Result<String, ExecutionError>> {
        let settings = match Self::settings(config) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Invalid probe settings");
                return invocations
                    .iter()
                    .map(|i| Err(ExecutionError::Unsupported(i.action.to_string())))
                    .collect();
            }
        };

        let hosts: Vec<String> = invocations
            .iter()
            .filter_map(|invocation| match &invocation.action {
                Action::Probe { host, .. } => Some(host.clone()),
                Action::Process(_) => None,
            })
            .collect();
        let mut stats = ProbeEngine::new(settings).run(&hosts).await.into_iter();

        invocations
            .iter()
            .map(|invocation| match &invocation.action {
                Action::Probe { .. } => stats.next().map(|s| s.render()).ok_or(ExecutionError::Missing),
                other => Err(ExecutionError::Unsupported(other.to_string())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwbench_core::{Parameters, Platform};
    use std::io::Write;

    fn config(params: Parameters) -> BenchmarkConfig {
        BenchmarkConfig::resolve(&TcpConnectivity.options(), &params).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = TcpConnectivity::settings(&config(Parameters::new())).unwrap();
        assert_eq!(settings, ProbeSettings::default());
    }

    #[test]
    fn test_hosts_from_list_and_hostfile() {
        let mut hostfile = tempfile::NamedTempFile::new().unwrap();
        writeln!(hostfile, "api.github.com\n\nlocalhost\n10.0.0.1").unwrap();

        let params = Parameters::parse(&format!(
            "--hosts 10.0.0.1 10.0.0.2 --hostfile {} --port 80",
            hostfile.path().display()
        ))
        .unwrap();
        let invocations = TcpConnectivity
            .resolve(&config(params), &RunContext::new(Platform::Cpu))
            .unwrap();

        let labels: Vec<_> = invocations.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["10.0.0.1", "10.0.0.2", "api.github.com", "localhost"]);
        assert_eq!(invocations[3].action.to_string(), "tcp-probe localhost:80");
    }

    #[test]
    fn test_missing_hostfile_is_runtime_error() {
        let params = Parameters::new().set("hostfile", "/nonexistent/hostfile");
        let err = TcpConnectivity
            .resolve(&config(params), &RunContext::new(Platform::Cpu))
            .unwrap_err();
        assert_eq!(err.return_code(), hwbench_core::ReturnCode::RuntimeError);
    }

    #[test]
    fn test_parse_checks_host_echo() {
        let invocation = SubInvocation::probe(0, "db01", 22);
        let raw = "host=db01 port=22 attempts=10 successes=10 failures=0 success_rate=100 min_ms=0.1 mean_ms=0.2 max_ms=0.4";
        let metrics = TcpConnectivity.parse(&invocation, raw).unwrap();
        assert_eq!(
            metrics,
            vec![
                ("successes_db01".to_string(), 10.0),
                ("failures_db01".to_string(), 0.0),
                ("success_rate_db01".to_string(), 100.0),
                ("min_latency_ms_db01".to_string(), 0.1),
                ("mean_latency_ms_db01".to_string(), 0.2),
                ("max_latency_ms_db01".to_string(), 0.4),
            ]
        );

        let other = SubInvocation::probe(1, "db02", 22);
        assert!(matches!(
            TcpConnectivity.parse(&other, raw),
            Err(ParseError::LabelMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_without_successes_omits_latency() {
        let invocation = SubInvocation::probe(0, "db02", 22);
        let raw = "host=db02 port=22 attempts=10 successes=0 failures=10 success_rate=0";
        let metrics = TcpConnectivity.parse(&invocation, raw).unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[1], ("failures_db02".to_string(), 10.0));
    }
}

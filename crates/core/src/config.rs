// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark options.
//!
//! Every benchmark declares its options as [`OptionSpec`]s with a kind, a
//! default and an optional domain. Callers supply [`Parameters`], either
//! typed or parsed from a `--name value [value...]` string with clap, and
//! [`BenchmarkConfig::resolve`] merges them over the defaults. The resulting
//! config is immutable.
//!
//! # Example
//!
//! ```
//! use hwbench_core::config::{BenchmarkConfig, OptionSpec, Parameters};
//!
//! let specs = vec![
//!     OptionSpec::integer("m", 16384, "Dimension m").at_least(1),
//!     OptionSpec::list("precision", &[], "Precisions to run"),
//! ];
//! let parameters = Parameters::parse("--m 7680 --precision FP64 FP32").unwrap();
//! let config = BenchmarkConfig::resolve(&specs, &parameters).unwrap();
//!
//! assert_eq!(config.integer("m").unwrap(), 7680);
//! assert_eq!(config.list("precision").unwrap(), &["FP64", "FP32"]);
//! ```

use std::collections::BTreeMap;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing or validating options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Option name is not declared by the benchmark.
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// Value cannot be interpreted as the option's kind.
    #[error("Invalid value for option {name}: expected {expected}, got {value}")]
    InvalidType {
        /// Option name.
        name: String,
        /// Expected kind.
        expected: OptionKind,
        /// Offending value.
        value: String,
    },

    /// Value is of the right kind but outside the declared domain.
    #[error("Value {value} for option {name} is outside its domain ({domain})")]
    OutOfDomain {
        /// Option name.
        name: String,
        /// Offending value.
        value: String,
        /// Domain description.
        domain: String,
    },

    /// Token found outside any `--name` option.
    #[error("Unexpected token in parameters: {0}")]
    UnexpectedToken(String),

    /// Parameter string does not fit the declared options.
    #[error("Invalid parameters: {0}")]
    Malformed(String),
}

/// Result type for option handling.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Kind of an option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Signed integer.
    Integer,
    /// Boolean flag.
    Bool,
    /// Free-form string.
    Text,
    /// List of strings.
    List,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Bool => "bool",
            Self::Text => "string",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Free-form string.
    Text(String),
    /// List of strings.
    List(Vec<String>),
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::List(v) => write!(f, "{}", v.join(" ")),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Allowed values for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Any value of the option's kind.
    Any,
    /// Integer not below the bound.
    AtLeast(i64),
    /// Integer within the inclusive range.
    Range(i64, i64),
    /// String among the listed choices (case-sensitive).
    OneOf(&'static [&'static str]),
}

impl Domain {
    fn admits(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::AtLeast(min), OptionValue::Integer(v)) => v >= min,
            (Self::Range(min, max), OptionValue::Integer(v)) => v >= min && v <= max,
            (Self::OneOf(choices), OptionValue::Text(v)) => choices.contains(&v.as_str()),
            _ => false,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::AtLeast(min) => write!(f, ">= {}", min),
            Self::Range(min, max) => write!(f, "{}..={}", min, max),
            Self::OneOf(choices) => write!(f, "one of {}", choices.join(", ")),
        }
    }
}

/// Declaration of one benchmark option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    /// Option name, without leading dashes.
    pub name: &'static str,
    /// Value kind.
    pub kind: OptionKind,
    /// Default value.
    pub default: OptionValue,
    /// Allowed values.
    pub domain: Domain,
    /// One-line description.
    pub help: &'static str,
}

impl OptionSpec {
    /// Integer option.
    pub fn integer(name: &'static str, default: i64, help: &'static str) -> Self {
        Self::new(name, OptionKind::Integer, OptionValue::Integer(default), help)
    }

    /// Boolean flag.
    pub fn flag(name: &'static str, default: bool, help: &'static str) -> Self {
        Self::new(name, OptionKind::Bool, OptionValue::Bool(default), help)
    }

    /// String option.
    pub fn text(name: &'static str, default: &str, help: &'static str) -> Self {
        Self::new(name, OptionKind::Text, OptionValue::Text(default.to_string()), help)
    }

    /// List-of-strings option.
    pub fn list(name: &'static str, default: &[&str], help: &'static str) -> Self {
        let default = default.iter().map(|s| s.to_string()).collect();
        Self::new(name, OptionKind::List, OptionValue::List(default), help)
    }

    fn new(name: &'static str, kind: OptionKind, default: OptionValue, help: &'static str) -> Self {
        Self {
            name,
            kind,
            default,
            domain: Domain::Any,
            help,
        }
    }

    /// Restrict an integer option to values `>= min`.
    pub fn at_least(mut self, min: i64) -> Self {
        self.domain = Domain::AtLeast(min);
        self
    }

    /// Restrict an integer option to an inclusive range.
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.domain = Domain::Range(min, max);
        self
    }

    /// Restrict a string option to a fixed set of choices.
    pub fn one_of(mut self, choices: &'static [&'static str]) -> Self {
        self.domain = Domain::OneOf(choices);
        self
    }

    /// Coerce a caller-supplied value into this option's kind and check the domain.
    pub fn coerce(&self, value: &OptionValue) -> Result<OptionValue> {
        let invalid = || ConfigError::InvalidType {
            name: self.name.to_string(),
            expected: self.kind,
            value: value.to_string(),
        };

        let coerced = match (self.kind, value) {
            (OptionKind::Integer, OptionValue::Integer(v)) => OptionValue::Integer(*v),
            (OptionKind::Integer, OptionValue::Text(s)) => {
                OptionValue::Integer(s.trim().parse().map_err(|_| invalid())?)
            }
            (OptionKind::Bool, OptionValue::Bool(v)) => OptionValue::Bool(*v),
            (OptionKind::Bool, OptionValue::Text(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => OptionValue::Bool(true),
                "false" | "no" | "0" => OptionValue::Bool(false),
                _ => return Err(invalid()),
            },
            (OptionKind::Text, OptionValue::Text(s)) => OptionValue::Text(s.clone()),
            (OptionKind::Text, OptionValue::Integer(v)) => OptionValue::Text(v.to_string()),
            (OptionKind::List, OptionValue::List(items)) => OptionValue::List(items.clone()),
            (OptionKind::List, OptionValue::Text(s)) => OptionValue::List(vec![s.clone()]),
            _ => return Err(invalid()),
        };

        if !self.domain.admits(&coerced) {
            return Err(ConfigError::OutOfDomain {
                name: self.name.to_string(),
                value: coerced.to_string(),
                domain: self.domain.to_string(),
            });
        }
        Ok(coerced)
    }
}

/// One layer of caller-supplied values.
#[derive(Debug, Clone, PartialEq)]
enum Layer {
    /// Value set through [`Parameters::set`].
    Typed(String, OptionValue),
    /// Tokens of a `--name value...` string.
    Args(Vec<String>),
}

/// Caller-supplied option overrides.
///
/// Layers apply in the order they were added, so a later value for the same
/// option replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    layers: Vec<Layer>,
}

impl Parameters {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `--name value [value...]` string.
    ///
    /// Both `--name value` and `--name=value` are accepted. Dashes inside
    /// names map to underscores. The tokens are matched against the
    /// benchmark's declared options when the config is resolved.
    pub fn parse(input: &str) -> Result<Self> {
        let args: Vec<String> = input.split_whitespace().map(normalize_token).collect();
        match args.first() {
            None => Ok(Self::new()),
            Some(first) if !first.starts_with("--") => Err(ConfigError::UnexpectedToken(first.clone())),
            Some(_) => Ok(Self {
                layers: vec![Layer::Args(args)],
            }),
        }
    }

    /// Set a typed value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.layers.push(Layer::Typed(name.into(), value.into()));
        self
    }

    /// Overlay `overrides` on top of these parameters.
    pub fn merged(&self, overrides: &Parameters) -> Parameters {
        let mut layers = self.layers.clone();
        layers.extend(overrides.layers.iter().cloned());
        Parameters { layers }
    }
}

fn normalize_token(token: &str) -> String {
    let Some(rest) = token.strip_prefix("--") else {
        return token.to_string();
    };
    match rest.split_once('=') {
        Some((name, value)) => format!("--{}={}", name.replace('-', "_"), value),
        None => format!("--{}", rest.replace('-', "_")),
    }
}

/// Parser for the string form of the given options.
fn command(specs: &[OptionSpec]) -> Command {
    Command::new("parameters")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args_override_self(true)
        .allow_negative_numbers(true)
        .args(specs.iter().map(|spec| {
            let arg = Arg::new(spec.name).long(spec.name).help(spec.help);
            match spec.kind {
                OptionKind::Bool => arg.action(ArgAction::SetTrue),
                OptionKind::List => arg.action(ArgAction::Set).num_args(1..),
                OptionKind::Integer | OptionKind::Text => arg.action(ArgAction::Set).num_args(1),
            }
        }))
}

/// Options given on the command line, as uncoerced values.
fn parse_args<'a>(specs: &'a [OptionSpec], args: &[String]) -> Result<Vec<(&'a OptionSpec, OptionValue)>> {
    let matches = command(specs).try_get_matches_from(args.iter()).map_err(from_clap)?;

    let mut given = Vec::new();
    for spec in specs {
        if matches.value_source(spec.name) != Some(ValueSource::CommandLine) {
            continue;
        }
        let value = match spec.kind {
            OptionKind::Bool => OptionValue::Bool(matches.get_flag(spec.name)),
            OptionKind::List => OptionValue::List(
                matches
                    .get_many::<String>(spec.name)
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default(),
            ),
            OptionKind::Integer | OptionKind::Text => {
                OptionValue::Text(matches.get_one::<String>(spec.name).cloned().unwrap_or_default())
            }
        };
        given.push((spec, value));
    }
    Ok(given)
}

fn from_clap(err: clap::Error) -> ConfigError {
    let offending = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => Some(arg.clone()),
        _ => None,
    };

    match (err.kind(), offending) {
        (ErrorKind::UnknownArgument, Some(arg)) => match arg.strip_prefix("--") {
            Some(name) => {
                let name = name.split_once('=').map_or(name, |(name, _)| name);
                ConfigError::UnknownOption(name.to_string())
            }
            None => ConfigError::UnexpectedToken(arg),
        },
        _ => {
            let message = err.to_string();
            let first = message.lines().next().unwrap_or_default();
            ConfigError::Malformed(first.trim_start_matches("error: ").to_string())
        }
    }
}

/// Validated, immutable benchmark configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BenchmarkConfig {
    values: BTreeMap<String, OptionValue>,
}

impl BenchmarkConfig {
    /// Merge caller parameters over the declared defaults.
    ///
    /// Unknown option names and values that do not fit an option's kind or
    /// domain are rejected.
    pub fn resolve(specs: &[OptionSpec], parameters: &Parameters) -> Result<Self> {
        let mut values: BTreeMap<String, OptionValue> = specs
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.clone()))
            .collect();

        for layer in &parameters.layers {
            match layer {
                Layer::Typed(name, value) => {
                    let spec = specs
                        .iter()
                        .find(|spec| spec.name == name)
                        .ok_or_else(|| ConfigError::UnknownOption(name.clone()))?;
                    values.insert(name.clone(), spec.coerce(value)?);
                }
                Layer::Args(args) => {
                    for (spec, value) in parse_args(specs, args)? {
                        values.insert(spec.name.to_string(), spec.coerce(&value)?);
                    }
                }
            }
        }

        Ok(Self { values })
    }

    /// Raw value by name.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Integer value by name.
    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.lookup(name)? {
            OptionValue::Integer(v) => Ok(*v),
            other => Err(self.mismatch(name, OptionKind::Integer, other)),
        }
    }

    /// Boolean value by name.
    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.lookup(name)? {
            OptionValue::Bool(v) => Ok(*v),
            other => Err(self.mismatch(name, OptionKind::Bool, other)),
        }
    }

    /// String value by name.
    pub fn text(&self, name: &str) -> Result<&str> {
        match self.lookup(name)? {
            OptionValue::Text(v) => Ok(v),
            other => Err(self.mismatch(name, OptionKind::Text, other)),
        }
    }

    /// List value by name.
    pub fn list(&self, name: &str) -> Result<&[String]> {
        match self.lookup(name)? {
            OptionValue::List(v) => Ok(v),
            other => Err(self.mismatch(name, OptionKind::List, other)),
        }
    }

    fn lookup(&self, name: &str) -> Result<&OptionValue> {
        self.values
            .get(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))
    }

    fn mismatch(&self, name: &str, expected: OptionKind, value: &OptionValue) -> ConfigError {
        ConfigError::InvalidType {
            name: name.to_string(),
            expected,
            value: value.to_string(),
        }
    }
}

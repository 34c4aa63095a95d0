// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Helpers for turning raw benchmark output into metric values.
//!
//! A parse failure is local to one sub-invocation. The lifecycle records it
//! and moves on to the next index.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Why a raw output could not be turned into metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No header row contains the wanted column.
    #[error("No header row with column `{0}`")]
    MissingHeader(String),

    /// A header row was found but no data row follows it.
    #[error("No data row follows the header")]
    MissingRow,

    /// A required field is absent.
    #[error("Missing field `{0}`")]
    MissingField(String),

    /// A field does not hold a number.
    #[error("Field `{field}` is not a number: `{value}`")]
    MalformedNumber {
        /// Field name.
        field: String,
        /// Offending text.
        value: String,
    },

    /// The output echoes a different label than the one requested.
    #[error("Output belongs to `{found}`, expected `{expected}`")]
    LabelMismatch {
        /// Label of the sub-invocation.
        expected: String,
        /// Label found in the output.
        found: String,
    },

    /// Nothing in the output is recognizable.
    #[error("Unrecognized output format")]
    Unrecognized,
}

/// Result type for parsers.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Metric name and value pairs produced by one parse.
pub type Metrics = Vec<(String, f64)>;

static MILLISECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s*ms\b").expect("valid milliseconds regex"));

/// Parse `value` as a number, naming `field` on failure.
pub fn parse_number(field: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::MalformedNumber {
            field: field.to_string(),
            value: trimmed.to_string(),
        })
}

/// Extract `column` from delimited tabular output.
///
/// The header is the first line whose cells contain `column`; the value is
/// taken from the next non-empty line.
pub fn csv_column(raw: &str, column: &str, delimiter: char) -> Result<f64> {
    let mut lines = raw.lines();

    let position = lines
        .by_ref()
        .find_map(|line| line.split(delimiter).position(|cell| cell.trim() == column))
        .ok_or_else(|| ParseError::MissingHeader(column.to_string()))?;

    let row = lines
        .find(|line| !line.trim().is_empty())
        .ok_or(ParseError::MissingRow)?;

    let cell = row
        .split(delimiter)
        .nth(position)
        .ok_or_else(|| ParseError::MissingField(column.to_string()))?;

    parse_number(column, cell)
}

/// Split whitespace-separated `key=value` tokens. Tokens without `=` are skipped.
pub fn key_value_fields(line: &str) -> BTreeMap<&str, &str> {
    line.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .collect()
}

/// Look up and parse a required numeric field.
pub fn required_number(fields: &BTreeMap<&str, &str>, name: &str) -> Result<f64> {
    let value = fields
        .get(name)
        .ok_or_else(|| ParseError::MissingField(name.to_string()))?;
    parse_number(name, value)
}

/// Every `<number> ms` value on `line`, in order.
pub fn millisecond_values(line: &str) -> Vec<f64> {
    MILLISECONDS
        .captures_iter(line)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

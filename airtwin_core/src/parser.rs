//! Semicolon-delimited dataset parser.
//!
//! Datasets look like this:
//!
//! ```text
//! sep=;
//! "Series";"Time";"Value"
//! living_room.co2;2024-01-01T00:00:00;650
//! ```
//!
//! The `sep=` line is optional. Columns are located by header name, so their
//! order and any extra columns do not matter. Rows that cannot produce a
//! finite value are filtered out, never reported.

use crate::reading::{Metric, Reading};
use thiserror::Error;

/// Literal prefix of the optional format-hint line.
pub const SEPARATOR_MARKER: &str = "sep=";

/// Field delimiter.
pub const DELIMITER: char = ';';

/// Leading marker some spreadsheet exports write; dropped before parsing.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Dataset-level parse failures.
///
/// Row-level problems never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("dataset has no header row")]
    MissingHeader,

    #[error("header is missing required column `{0}`")]
    MissingColumn(&'static str),
}

/// Positions of the required columns within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    series: usize,
    time: usize,
    value: usize,
}

impl ColumnIndex {
    fn locate(header: &str) -> Result<Self, ParseError> {
        let names = split_fields(header);
        let find = |column: &'static str| {
            names
                .iter()
                .position(|name| *name == column)
                .ok_or(ParseError::MissingColumn(column))
        };

        Ok(Self {
            series: find("Series")?,
            time: find("Time")?,
            value: find("Value")?,
        })
    }

    /// Minimum number of fields a row needs.
    fn width(&self) -> usize {
        self.series.max(self.time).max(self.value) + 1
    }

    fn extract(&self, line: &str) -> Option<Reading> {
        let fields = split_fields(line);
        if fields.len() < self.width() {
            return None;
        }

        let value = fields[self.value]
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())?;

        Some(Reading::new(fields[self.series], fields[self.time], value))
    }
}

/// Removes one layer of surrounding double quotes, if present.
fn unquote(field: &str) -> &str {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(DELIMITER).map(unquote).collect()
}

/// Parses a dataset into readings, preserving input order.
///
/// # Errors
/// * `ParseError::MissingHeader` - no non-blank line after the separator hint
/// * `ParseError::MissingColumn` - the header lacks `Series`, `Time` or `Value`
pub fn parse_readings(text: &str) -> Result<Vec<Reading>, ParseError> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut lines = text
        .split(|c: char| c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .peekable();

    if lines
        .peek()
        .is_some_and(|line| line.starts_with(SEPARATOR_MARKER))
    {
        lines.next();
    }

    let header = lines.next().ok_or(ParseError::MissingHeader)?;
    let columns = ColumnIndex::locate(header)?;

    Ok(lines.filter_map(|line| columns.extract(line)).collect())
}

/// The mixed environmental dataset, split per metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentalStreams {
    pub co2: Vec<Reading>,
    pub temperature: Vec<Reading>,
    pub humidity: Vec<Reading>,
}

impl EnvironmentalStreams {
    /// Returns the stream for `metric`, or `None` for PM2.5.
    pub fn stream(&self, metric: Metric) -> Option<&[Reading]> {
        match metric {
            Metric::Pm25 => None,
            Metric::Co2 => Some(&self.co2),
            Metric::Temperature => Some(&self.temperature),
            Metric::Humidity => Some(&self.humidity),
        }
    }

    /// Total rows across all three streams.
    pub fn total(&self) -> usize {
        self.co2.len() + self.temperature.len() + self.humidity.len()
    }
}

/// Splits environmental rows by case-sensitive substring match on `series`.
///
/// A row whose series matches several keys lands in each matching stream;
/// rows matching none are dropped.
pub fn split_environmental(rows: &[Reading]) -> EnvironmentalStreams {
    let select = |metric: Metric| -> Vec<Reading> {
        let Some(key) = metric.series_key() else {
            return Vec::new();
        };
        rows.iter()
            .filter(|row| row.series.contains(key))
            .cloned()
            .collect()
    };

    EnvironmentalStreams {
        co2: select(Metric::Co2),
        temperature: select(Metric::Temperature),
        humidity: select(Metric::Humidity),
    }
}

//! Interval meter CSV import.
//!
//! Expected columns: `timestamp,kwh,kw,granularity`. Timestamps use
//! `%Y-%m-%d %H:%M` or `%Y-%m-%d %H:%M:%S`; empty `kwh`/`kw` cells are
//! treated as missing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::EconError;
use crate::peak::{Granularity, MeterReading};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Reads meter readings from a CSV file.
///
/// # Errors
///
/// Returns [`EconError::Io`] if the file cannot be opened, otherwise see
/// [`read_meter_csv`].
pub fn read_meter_csv_file(path: &Path) -> Result<Vec<MeterReading>, EconError> {
    read_meter_csv(File::open(path)?)
}

/// Parses meter readings from any CSV source with a header row.
///
/// # Errors
///
/// Returns [`EconError::MeterData`] naming the offending line when a row
/// has a bad timestamp or number, and [`EconError::Csv`] for malformed CSV.
pub fn read_meter_csv(reader: impl Read) -> Result<Vec<MeterReading>, EconError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut readings = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let field = |i: usize| record.get(i).unwrap_or("");

        let timestamp = parse_timestamp(field(0)).ok_or_else(|| EconError::MeterData {
            line,
            message: format!("invalid timestamp \"{}\"", field(0)),
        })?;
        let kwh = parse_optional(field(1), "kwh", line)?;
        let kw = parse_optional(field(2), "kw", line)?;
        let granularity = Granularity::from_tag(field(3));

        readings.push(MeterReading::new(timestamp, kwh, kw, granularity));
    }
    Ok(readings)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_optional(s: &str, column: &str, line: usize) -> Result<Option<f64>, EconError> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<f64>().map(Some).map_err(|_| EconError::MeterData {
        line,
        message: format!("invalid {column} value \"{s}\""),
    })
}

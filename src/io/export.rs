//! CSV and JSON export of analysis results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::finance::CashflowEntry;
use crate::montecarlo::MonteCarloResult;

const CASHFLOW_HEADER: [&str; 3] = ["year", "net_cashflow", "cumulative"];
const DISTRIBUTION_HEADER: [&str; 4] = ["rank", "npv25", "irr25", "payback_years"];

/// Writes the yearly cashflow series to a CSV file at `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_cashflow_csv(cashflows: &[CashflowEntry], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_cashflow_csv(cashflows, io::BufWriter::new(file))
}

/// Writes the yearly cashflow series as CSV to any writer.
///
/// # Arguments
///
/// * `cashflows` - Series from year 0 (investment) to the last projected year
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_cashflow_csv(cashflows: &[CashflowEntry], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(CASHFLOW_HEADER)?;
    for entry in cashflows {
        wtr.write_record(&[
            entry.year.to_string(),
            format!("{:.2}", entry.net_cashflow),
            format!("{:.2}", entry.cumulative),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the sorted Monte Carlo distributions to a CSV file at `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_distribution_csv(result: &MonteCarloResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_distribution_csv(result, io::BufWriter::new(file))
}

/// Writes one row per rank; each column is independently sorted ascending.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_distribution_csv(result: &MonteCarloResult, writer: impl Write) -> io::Result<()> {
    let d = &result.distributions;
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DISTRIBUTION_HEADER)?;
    for (rank, ((npv, irr), payback)) in d
        .npv25
        .iter()
        .zip(&d.irr25)
        .zip(&d.payback_years)
        .enumerate()
    {
        wtr.write_record(&[
            rank.to_string(),
            format!("{npv:.2}"),
            format!("{irr:.6}"),
            format!("{payback:.3}"),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes any result value as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json<T: Serialize + ?Sized>(value: &T, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{EconomicAssumptions, SiteScenarioParams, run_scenario};

    fn cashflows() -> Vec<CashflowEntry> {
        run_scenario(&SiteScenarioParams::default(), &EconomicAssumptions::default()).cashflows
    }

    #[test]
    fn cashflow_header_and_rows() {
        let mut buf = Vec::new();
        write_cashflow_csv(&cashflows(), &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.first().copied(), Some("year,net_cashflow,cumulative"));
        // header + years 0..=25
        assert_eq!(lines.len(), 27);
        assert!(lines[1].starts_with("0,-"));
    }

    #[test]
    fn cashflow_rows_parse() {
        let mut buf = Vec::new();
        write_cashflow_csv(&cashflows(), &mut buf).ok();
        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let mut rows = 0;
        for record in rdr.records() {
            let rec = record.ok();
            assert!(rec.is_some(), "every row should parse");
            let rec = rec.unwrap_or_default();
            assert!(rec[1].parse::<f64>().is_ok());
            assert!(rec[2].parse::<f64>().is_ok());
            rows += 1;
        }
        assert_eq!(rows, 26);
    }

    #[test]
    fn json_output_is_valid() {
        let mut buf = Vec::new();
        write_json(&cashflows(), &mut buf).ok();
        let parsed: Result<serde_json::Value, _> = serde_json::from_slice(&buf);
        let len = parsed.ok().and_then(|v| v.as_array().map(Vec::len));
        assert_eq!(len, Some(26));
    }
}

//! Crate-wide error type.

use thiserror::Error;

/// Errors raised by the analysis core and its I/O helpers.
///
/// The numeric engines favour clamping over failing, so most variants
/// describe malformed configuration or unusable input data.
#[derive(Debug, Error)]
pub enum EconError {
    #[error("monte carlo run produced no successful iterations ({attempted} attempted, {failed} failed)")]
    NoSuccessfulIterations { attempted: usize, failed: usize },

    #[error("monte carlo iteration count must be > 0")]
    InvalidIterations,

    #[error("invalid range for {variable}: min {min} > max {max}")]
    InvalidRange {
        variable: &'static str,
        min: f64,
        max: f64,
    },

    #[error("scenario evaluation failed: {0}")]
    ScenarioEvaluation(String),

    #[error("no catalog kit matches the requested configuration (storage: {with_storage})")]
    NoMatchingKit { with_storage: bool },

    #[error("kit catalog is empty")]
    EmptyCatalog,

    #[error("meter data line {line}: {message}")]
    MeterData { line: usize, message: String },

    #[error("invalid kit catalog: {0}")]
    Catalog(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

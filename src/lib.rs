//! Financial analysis core for commercial solar and storage projects.
//!
//! Four engines share the value types in [`finance`]: the scenario cashflow
//! model, the Monte Carlo risk simulator, the peak-shaving analyzer and the
//! standard kit recommender.

pub mod cli;
pub mod config;
pub mod error;
/// Scenario engine: production, incentives, cashflows, NPV/IRR/payback.
pub mod finance;
pub mod io;
/// Standard kit catalog and selection.
pub mod kits;
pub mod logging;
/// Monte Carlo risk analysis over the scenario engine.
pub mod montecarlo;
/// Demand-charge analysis from interval meter data.
pub mod peak;

pub use error::EconError;

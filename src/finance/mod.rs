//! Scenario engine: cashflow projection and discounted-cashflow metrics.

/// NPV, IRR, payback and LCOE helpers.
pub mod metrics;
pub mod scenario;
pub mod types;

pub use scenario::{CashflowModel, ScenarioModel, run_scenario};
pub use types::{
    CashflowEntry, EconomicAssumptions, OmCost, ScenarioResult, SiteScenarioParams,
    StorageParams,
};

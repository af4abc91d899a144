//! Value types exchanged with the scenario engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::peak::PeakShavingResult;

/// Number of operating years projected after the investment year.
pub const PROJECTION_YEARS: usize = 25;

/// Horizons (in years) at which NPV and IRR are reported.
pub const HORIZONS: [usize; 3] = [10, 20, 25];

/// Operation and maintenance cost basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmCost {
    /// Absolute yearly cost per installed kWc.
    PerKwc(f64),
    /// Yearly cost as a fraction of gross PV CAPEX.
    PercentOfCapex(f64),
}

impl OmCost {
    /// Year-1 O&M cost for a PV array of `pv_kw` with the given gross PV CAPEX.
    pub fn annual_cost(&self, pv_kw: f64, pv_capex: f64) -> f64 {
        match *self {
            OmCost::PerKwc(rate) => pv_kw * rate,
            OmCost::PercentOfCapex(fraction) => pv_capex * fraction,
        }
    }
}

/// Economic assumptions for one analysis.
///
/// This is a plain `Copy` value: every variant (for example a Monte Carlo
/// sample) is produced with the `with_*` methods, which return a new value
/// and leave the original untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicAssumptions {
    /// Nominal specific yield (kWh per kWp per year).
    pub solar_yield_kwh_per_kwp: f64,
    /// Yearly production degradation (fraction).
    pub degradation_rate: f64,
    /// Yearly escalation of the energy tariff (fraction).
    pub tariff_escalation_rate: f64,
    /// Yearly escalation of the demand tariff (fraction).
    pub demand_escalation_rate: f64,
    /// Discount rate / WACC (fraction).
    pub discount_rate: f64,
    /// O&M cost basis.
    pub om_cost: OmCost,
    /// Yearly escalation of O&M costs (fraction).
    pub om_escalation_rate: f64,
    /// Installed PV cost ($/W).
    pub solar_cost_per_watt: f64,
    /// Battery energy cost ($/kWh).
    pub battery_cost_per_kwh: f64,
    /// Battery power cost ($/kW).
    pub battery_cost_per_kw: f64,
    /// Corporate tax rate (fraction).
    pub tax_rate: f64,
    /// Module power temperature coefficient (per °C, usually negative).
    pub temperature_coefficient: f64,
    /// DC/AC wiring loss (fraction).
    pub wire_loss: f64,
    /// Compensation paid for exported surplus ($/kWh).
    pub surplus_compensation_rate: f64,
    /// Whether bifacial modules add their rear-side boost to the yield.
    pub bifacial_enabled: bool,
    /// Bifacial yield boost (fraction).
    pub bifacial_boost: f64,
}

impl Default for EconomicAssumptions {
    fn default() -> Self {
        Self {
            solar_yield_kwh_per_kwp: 1150.0,
            degradation_rate: 0.004,
            tariff_escalation_rate: 0.03,
            demand_escalation_rate: 0.03,
            discount_rate: 0.07,
            om_cost: OmCost::PerKwc(15.0),
            om_escalation_rate: 0.025,
            solar_cost_per_watt: 2.00,
            battery_cost_per_kwh: 550.0,
            battery_cost_per_kw: 300.0,
            tax_rate: 0.265,
            temperature_coefficient: -0.0035,
            wire_loss: 0.02,
            surplus_compensation_rate: 0.046,
            bifacial_enabled: false,
            bifacial_boost: 0.10,
        }
    }
}

impl EconomicAssumptions {
    #[must_use]
    pub fn with_solar_yield(self, solar_yield_kwh_per_kwp: f64) -> Self {
        Self {
            solar_yield_kwh_per_kwp,
            ..self
        }
    }

    #[must_use]
    pub fn with_degradation_rate(self, degradation_rate: f64) -> Self {
        Self {
            degradation_rate,
            ..self
        }
    }

    #[must_use]
    pub fn with_tariff_escalation_rate(self, tariff_escalation_rate: f64) -> Self {
        Self {
            tariff_escalation_rate,
            ..self
        }
    }

    #[must_use]
    pub fn with_discount_rate(self, discount_rate: f64) -> Self {
        Self {
            discount_rate,
            ..self
        }
    }

    #[must_use]
    pub fn with_om_cost(self, om_cost: OmCost) -> Self {
        Self { om_cost, ..self }
    }

    #[must_use]
    pub fn with_solar_cost_per_watt(self, solar_cost_per_watt: f64) -> Self {
        Self {
            solar_cost_per_watt,
            ..self
        }
    }

    /// Returns a copy with the bifacial flag and boost replaced.
    #[must_use]
    pub fn with_bifacial(self, bifacial_enabled: bool, bifacial_boost: f64) -> Self {
        Self {
            bifacial_enabled,
            bifacial_boost,
            ..self
        }
    }
}

/// Battery added to a site scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageParams {
    /// Inverter power (kW).
    pub power_kw: f64,
    /// Usable energy (kWh).
    pub energy_kwh: f64,
    /// Year-1 demand charge avoided by the battery over all billing
    /// months ($/year).
    pub annual_demand_savings: f64,
}

impl StorageParams {
    /// Sizes a battery from a peak-shaving analysis.
    pub fn from_peak_shaving(result: &PeakShavingResult) -> Self {
        Self {
            power_kw: result.recommended_battery_kw,
            energy_kwh: result.recommended_battery_kwh,
            annual_demand_savings: result.demand_charge_savings,
        }
    }
}

/// Site description fed to the scenario engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteScenarioParams {
    /// PV array size (kW DC).
    pub pv_kw: f64,
    /// Annual site consumption (kWh).
    pub annual_consumption_kwh: f64,
    /// Energy tariff ($/kWh).
    pub tariff_energy_rate: f64,
    /// Demand tariff ($/kW per month).
    pub tariff_demand_rate: f64,
    /// Contracted or observed peak demand (kW).
    pub peak_demand_kw: f64,
    /// Optional battery.
    pub storage: Option<StorageParams>,
}

impl Default for SiteScenarioParams {
    fn default() -> Self {
        Self {
            pv_kw: 100.0,
            annual_consumption_kwh: 480_000.0,
            tariff_energy_rate: 0.06061,
            tariff_demand_rate: 17.573,
            peak_demand_kw: 220.0,
            storage: None,
        }
    }
}

impl SiteScenarioParams {
    /// Returns a copy with a different PV size.
    #[must_use]
    pub fn with_pv_kw(self, pv_kw: f64) -> Self {
        Self { pv_kw, ..self }
    }

    /// Returns a copy with the given battery attached.
    #[must_use]
    pub fn with_storage(self, storage: StorageParams) -> Self {
        Self {
            storage: Some(storage),
            ..self
        }
    }
}

/// One year of the projected cashflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CashflowEntry {
    /// Year index, 0 is the investment year.
    pub year: usize,
    /// Net cashflow of the year ($).
    pub net_cashflow: f64,
    /// Running sum of net cashflows up to and including this year ($).
    pub cumulative: f64,
}

/// Year-1 cash components before escalation and degradation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct YearOneSavings {
    pub energy_savings: f64,
    /// Surplus revenue, only recognised from year 3 onwards.
    pub surplus_revenue: f64,
    pub demand_savings: f64,
    pub om_cost: f64,
}

/// Energy balance of the first operating year.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProductionSummary {
    /// Derated specific yield (kWh/kWp).
    pub effective_yield_kwh_per_kwp: f64,
    pub annual_production_kwh: f64,
    pub self_consumed_kwh: f64,
    pub exported_kwh: f64,
    /// Share of production used on site.
    pub self_consumption_ratio: f64,
    /// Share of site consumption met by production.
    pub self_sufficiency_ratio: f64,
}

/// Metric reported at each of the [`HORIZONS`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HorizonMetrics {
    pub year10: f64,
    pub year20: f64,
    pub year25: f64,
}

impl HorizonMetrics {
    /// Builds the metric by evaluating `f` at every horizon.
    pub fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        Self {
            year10: f(HORIZONS[0]),
            year20: f(HORIZONS[1]),
            year25: f(HORIZONS[2]),
        }
    }
}

/// Result of one scenario engine evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub production: ProductionSummary,
    pub gross_capex: f64,
    pub utility_incentive: f64,
    pub federal_credit: f64,
    pub net_capex: f64,
    pub tax_shield: f64,
    pub year_one: YearOneSavings,
    pub npv: HorizonMetrics,
    /// IRR, clamped to `[0, 1]`.
    pub irr: HorizonMetrics,
    /// Fractional payback year; exactly 25 when never recovered.
    pub payback_years: f64,
    /// Undiscounted sum of all 26 cashflows.
    pub total_cashflow: f64,
    /// Levelized cost of energy ($/kWh).
    pub lcoe: f64,
    pub cashflows: Vec<CashflowEntry>,
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Scenario Report ---")?;
        writeln!(
            f,
            "Annual production:     {:.0} kWh ({:.1}% self-consumed)",
            self.production.annual_production_kwh,
            self.production.self_consumption_ratio * 100.0
        )?;
        writeln!(f, "Gross CAPEX:           ${:.2}", self.gross_capex)?;
        writeln!(f, "Net CAPEX:             ${:.2}", self.net_capex)?;
        writeln!(f, "Tax shield:            ${:.2}", self.tax_shield)?;
        writeln!(
            f,
            "NPV 10/20/25:          ${:.2} / ${:.2} / ${:.2}",
            self.npv.year10, self.npv.year20, self.npv.year25
        )?;
        writeln!(
            f,
            "IRR 10/20/25:          {:.2}% / {:.2}% / {:.2}%",
            self.irr.year10 * 100.0,
            self.irr.year20 * 100.0,
            self.irr.year25 * 100.0
        )?;
        writeln!(f, "Payback:               {:.2} years", self.payback_years)?;
        writeln!(f, "LCOE:                  ${:.4}/kWh", self.lcoe)?;
        write!(f, "25-year cashflow:      ${:.2}", self.total_cashflow)
    }
}

//! Deterministic 26-year cashflow model for a PV (+ optional storage) project.

use tracing::debug;

use crate::error::EconError;

use super::metrics::{accumulate, irr, lcoe, npv, payback_years};
use super::types::{
    EconomicAssumptions, HorizonMetrics, PROJECTION_YEARS, ProductionSummary, ScenarioResult,
    SiteScenarioParams, YearOneSavings,
};

/// Module temperature above STC assumed for the temperature derate (°C).
pub const ASSUMED_TEMP_DELTA_C: f64 = 15.0;
/// Inverter conversion efficiency.
pub const INVERTER_EFFICIENCY: f64 = 0.96;
/// Upper bound on the share of production a site can absorb.
pub const MAX_SELF_CONSUMPTION: f64 = 0.95;
/// Production headroom over consumption before self-consumption is scaled down.
pub const SELF_CONSUMPTION_HEADROOM: f64 = 1.1;
/// Utility incentive per installed watt ($/W).
pub const UTILITY_INCENTIVE_PER_WATT: f64 = 1.0;
/// Utility incentive cap as a fraction of gross PV CAPEX.
pub const UTILITY_INCENTIVE_CAPEX_SHARE: f64 = 0.40;
/// Absolute utility incentive cap ($), 1 MW at $1/W.
pub const UTILITY_INCENTIVE_CAP: f64 = 1_000_000.0;
/// Federal investment credit on CAPEX remaining after the utility incentive.
pub const FEDERAL_CREDIT_RATE: f64 = 0.30;
/// Share of the accelerated depreciation benefit assumed to be realised.
pub const DEPRECIATION_RECOVERY: f64 = 0.90;
/// First operating year in which surplus compensation is paid out.
pub const SURPLUS_FIRST_YEAR: usize = 3;
/// Solar contribution to the billed peak, as a share of PV size.
pub const SOLAR_PEAK_SHARE_OF_PV: f64 = 0.15;
/// Solar contribution to the billed peak, as a share of the site peak.
pub const SOLAR_PEAK_SHARE_OF_PEAK: f64 = 0.10;

/// Anything able to turn a site and a set of assumptions into a scenario result.
///
/// [`CashflowModel`] is the production implementation and never fails; the
/// `Result` lets batch drivers such as the Monte Carlo simulator account for
/// models that can.
pub trait ScenarioModel {
    /// Evaluates one scenario.
    fn evaluate(
        &self,
        site: &SiteScenarioParams,
        assumptions: &EconomicAssumptions,
    ) -> Result<ScenarioResult, EconError>;
}

/// Closed-form yearly cashflow model.
#[derive(Debug, Default, Clone, Copy)]
pub struct CashflowModel;

impl ScenarioModel for CashflowModel {
    fn evaluate(
        &self,
        site: &SiteScenarioParams,
        assumptions: &EconomicAssumptions,
    ) -> Result<ScenarioResult, EconError> {
        Ok(run_scenario(site, assumptions))
    }
}

impl<F> ScenarioModel for F
where
    F: Fn(&SiteScenarioParams, &EconomicAssumptions) -> Result<ScenarioResult, EconError>,
{
    fn evaluate(
        &self,
        site: &SiteScenarioParams,
        assumptions: &EconomicAssumptions,
    ) -> Result<ScenarioResult, EconError> {
        self(site, assumptions)
    }
}

/// Specific yield after bifacial gain, temperature, wiring and inverter losses.
pub fn effective_yield(assumptions: &EconomicAssumptions) -> f64 {
    let bifacial = if assumptions.bifacial_enabled {
        1.0 + assumptions.bifacial_boost
    } else {
        1.0
    };
    let temperature_loss = assumptions.temperature_coefficient.abs() * ASSUMED_TEMP_DELTA_C;
    assumptions.solar_yield_kwh_per_kwp
        * bifacial
        * (1.0 - temperature_loss)
        * (1.0 - assumptions.wire_loss)
        * INVERTER_EFFICIENCY
}

/// Splits first-year production into self-consumed and exported energy.
pub fn production_summary(
    site: &SiteScenarioParams,
    assumptions: &EconomicAssumptions,
) -> ProductionSummary {
    let effective_yield_kwh_per_kwp = effective_yield(assumptions);
    let annual_production_kwh = site.pv_kw * effective_yield_kwh_per_kwp;

    let self_consumption_ratio = if annual_production_kwh > 0.0 {
        (site.annual_consumption_kwh / (annual_production_kwh * SELF_CONSUMPTION_HEADROOM))
            .min(MAX_SELF_CONSUMPTION)
    } else {
        0.0
    };
    let self_consumed_kwh = annual_production_kwh * self_consumption_ratio;
    let exported_kwh = annual_production_kwh - self_consumed_kwh;
    let self_sufficiency_ratio = if site.annual_consumption_kwh > 0.0 {
        (self_consumed_kwh / site.annual_consumption_kwh).min(1.0)
    } else {
        0.0
    };

    ProductionSummary {
        effective_yield_kwh_per_kwp,
        annual_production_kwh,
        self_consumed_kwh,
        exported_kwh,
        self_consumption_ratio,
        self_sufficiency_ratio,
    }
}

/// Runs the scenario model.
///
/// Pure and deterministic; degenerate inputs (zero PV, zero consumption)
/// produce zero production and an unrecovered CAPEX rather than an error.
pub fn run_scenario(
    site: &SiteScenarioParams,
    assumptions: &EconomicAssumptions,
) -> ScenarioResult {
    let production = production_summary(site, assumptions);

    // CAPEX and incentives
    let pv_capex = site.pv_kw * 1000.0 * assumptions.solar_cost_per_watt;
    let storage_capex = site.storage.map_or(0.0, |s| {
        s.energy_kwh * assumptions.battery_cost_per_kwh
            + s.power_kw * assumptions.battery_cost_per_kw
    });
    let gross_capex = pv_capex + storage_capex;
    let utility_incentive = (site.pv_kw * 1000.0 * UTILITY_INCENTIVE_PER_WATT)
        .min(pv_capex * UTILITY_INCENTIVE_CAPEX_SHARE)
        .min(UTILITY_INCENTIVE_CAP);
    let federal_credit = FEDERAL_CREDIT_RATE * (gross_capex - utility_incentive);
    let net_capex = gross_capex - utility_incentive - federal_credit;
    let tax_shield = net_capex * assumptions.tax_rate * DEPRECIATION_RECOVERY;

    // Year-1 components
    let solar_peak_kw =
        (site.pv_kw * SOLAR_PEAK_SHARE_OF_PV).min(site.peak_demand_kw * SOLAR_PEAK_SHARE_OF_PEAK);
    let year_one = YearOneSavings {
        energy_savings: production.self_consumed_kwh * site.tariff_energy_rate,
        surplus_revenue: production.exported_kwh * assumptions.surplus_compensation_rate,
        demand_savings: solar_peak_kw * site.tariff_demand_rate * 12.0
            + site.storage.map_or(0.0, |s| s.annual_demand_savings),
        om_cost: assumptions.om_cost.annual_cost(site.pv_kw, pv_capex),
    };

    // Projection
    let mut net = Vec::with_capacity(PROJECTION_YEARS + 1);
    let mut om_by_year = Vec::with_capacity(PROJECTION_YEARS);
    let mut production_by_year = Vec::with_capacity(PROJECTION_YEARS);
    net.push(-net_capex + tax_shield);
    for year in 1..=PROJECTION_YEARS {
        let y = year as i32;
        let degradation = (1.0 - assumptions.degradation_rate).powi(y);
        let escalation = (1.0 + assumptions.tariff_escalation_rate).powi(y);
        let demand_escalation = (1.0 + assumptions.demand_escalation_rate).powi(y);
        let om_escalation = (1.0 + assumptions.om_escalation_rate).powi(y);

        let energy = year_one.energy_savings * degradation * escalation;
        let surplus = if year >= SURPLUS_FIRST_YEAR {
            year_one.surplus_revenue * degradation * escalation
        } else {
            0.0
        };
        let demand = year_one.demand_savings * demand_escalation;
        let om = year_one.om_cost * om_escalation;

        net.push(energy + surplus + demand - om);
        om_by_year.push(om);
        production_by_year.push(production.annual_production_kwh * degradation);
    }

    let cashflows = accumulate(&net);
    let npv = HorizonMetrics::from_fn(|h| npv(&net, assumptions.discount_rate, h));
    let irr = HorizonMetrics::from_fn(|h| irr(&net, h, net_capex));
    let payback_years = payback_years(&cashflows);
    let total_cashflow = cashflows.last().map_or(0.0, |c| c.cumulative);
    let lcoe = lcoe(
        net_capex,
        &om_by_year,
        &production_by_year,
        assumptions.discount_rate,
    );

    debug!(
        pv_kw = site.pv_kw,
        net_capex,
        irr25 = irr.year25,
        payback_years,
        "scenario evaluated"
    );

    ScenarioResult {
        production,
        gross_capex,
        utility_incentive,
        federal_credit,
        net_capex,
        tax_shield,
        year_one,
        npv,
        irr,
        payback_years,
        total_cashflow,
        lcoe,
        cashflows,
    }
}

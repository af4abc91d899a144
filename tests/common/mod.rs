//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use solar_econ::finance::{EconomicAssumptions, SiteScenarioParams};
use solar_econ::montecarlo::MonteCarloConfig;
use solar_econ::peak::{Granularity, MeterReading};

/// The 100 kW medium-power commercial example site.
pub fn example_site() -> SiteScenarioParams {
    SiteScenarioParams {
        pv_kw: 100.0,
        annual_consumption_kwh: 480_000.0,
        tariff_energy_rate: 0.06061,
        tariff_demand_rate: 17.573,
        peak_demand_kw: 220.0,
        storage: None,
    }
}

/// A spread of sites from empty to oversized arrays.
pub fn site_grid() -> Vec<SiteScenarioParams> {
    [0.0, 5.0, 25.0, 100.0, 400.0, 1500.0]
        .into_iter()
        .map(|pv_kw| example_site().with_pv_kw(pv_kw))
        .collect()
}

/// Default assumptions (yield 1150 kWh/kWp, $2.00/W, 26.5% tax).
pub fn default_assumptions() -> EconomicAssumptions {
    EconomicAssumptions::default()
}

/// Seeded Monte Carlo config with `iterations` runs.
pub fn seeded_config(iterations: usize, seed: u64) -> MonteCarloConfig {
    MonteCarloConfig {
        iterations,
        seed: Some(seed),
        ..MonteCarloConfig::default()
    }
}

/// Timestamp in 2024.
pub fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

/// A 15-minute reading with reported demand.
pub fn fifteen_min(ts: NaiveDateTime, kw: f64) -> MeterReading {
    MeterReading::new(ts, Some(kw / 4.0), Some(kw), Granularity::FifteenMin)
}

/// One business day of 15-minute readings per month with a single
/// afternoon spike of `spike_kw` on top of a 100 kW base.
pub fn yearly_readings(spike_kw: impl Fn(u32) -> f64) -> Vec<MeterReading> {
    let mut readings = Vec::new();
    for month in 1..=12 {
        for quarter in 0..(24 * 4) {
            let hour = quarter / 4;
            let minute = (quarter % 4) * 15;
            let kw = if hour == 14 && minute == 0 {
                100.0 + spike_kw(month)
            } else {
                100.0
            };
            readings.push(fifteen_min(at(month, 10, hour, minute), kw));
        }
    }
    readings
}

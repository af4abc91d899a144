mod common;

use common::{default_assumptions, example_site, site_grid};
use solar_econ::finance::{
    CashflowModel, EconomicAssumptions, ScenarioModel, SiteScenarioParams, StorageParams,
    run_scenario,
};
use solar_econ::peak::{PeakShavingConfig, analyze_peak_shaving};

#[test]
fn example_site_recovers_incentives_and_positive_irr() {
    let r = run_scenario(&example_site(), &default_assumptions());
    assert!((r.gross_capex - 200_000.0).abs() < 1e-6);
    assert!(r.net_capex < 200_000.0);
    assert!(r.irr.year25 > 0.0, "irr25 = {}", r.irr.year25);
    assert!(r.npv.year25 > r.npv.year10);
}

#[test]
fn cumulative_cashflow_is_running_sum() {
    for site in site_grid() {
        let r = run_scenario(&site, &default_assumptions());
        assert_eq!(r.cashflows.len(), 26);
        assert_eq!(r.cashflows[0].cumulative, r.cashflows[0].net_cashflow);
        for y in 1..r.cashflows.len() {
            let expected = r.cashflows[y - 1].cumulative + r.cashflows[y].net_cashflow;
            assert!(
                (r.cashflows[y].cumulative - expected).abs() <= 1e-9 * expected.abs().max(1.0),
                "pv {} year {y}",
                site.pv_kw
            );
        }
        assert_eq!(r.total_cashflow, r.cashflows[25].cumulative);
    }
}

#[test]
fn irr_ignores_discount_rate() {
    let site = example_site();
    let low = run_scenario(&site, &default_assumptions().with_discount_rate(0.03));
    let high = run_scenario(&site, &default_assumptions().with_discount_rate(0.12));
    assert_eq!(low.irr, high.irr);
    assert_eq!(low.cashflows, high.cashflows);
}

#[test]
fn npv_non_increasing_in_discount_rate() {
    let site = example_site();
    let mut previous = f64::INFINITY;
    for step in 0..=20 {
        let rate = f64::from(step) * 0.01;
        let r = run_scenario(&site, &default_assumptions().with_discount_rate(rate));
        assert!(r.npv.year25 <= previous + 1e-6, "rate {rate}");
        previous = r.npv.year25;
    }
}

#[test]
fn payback_within_horizon() {
    for site in site_grid() {
        for cost in [0.5, 2.0, 8.0] {
            let r = run_scenario(&site, &default_assumptions().with_solar_cost_per_watt(cost));
            assert!(
                (0.0..=25.0).contains(&r.payback_years),
                "pv {} cost {cost}: {}",
                site.pv_kw,
                r.payback_years
            );
        }
    }
}

#[test]
fn unrecovered_investment_pays_back_at_horizon() {
    let r = run_scenario(
        &example_site(),
        &default_assumptions().with_solar_cost_per_watt(50.0),
    );
    assert!(r.cashflows[25].cumulative < 0.0);
    assert_eq!(r.payback_years, 25.0);
}

#[test]
fn zero_pv_produces_nothing() {
    let r = run_scenario(&example_site().with_pv_kw(0.0), &default_assumptions());
    assert_eq!(r.production.annual_production_kwh, 0.0);
    assert_eq!(r.gross_capex, 0.0);
    assert!(r.cashflows[1..].iter().all(|c| c.net_cashflow <= 0.0));
    assert_eq!(r.payback_years, 25.0);
    assert_eq!(r.lcoe, 0.0);
}

#[test]
fn zero_consumption_exports_everything() {
    let site = SiteScenarioParams {
        annual_consumption_kwh: 0.0,
        ..example_site()
    };
    let r = run_scenario(&site, &default_assumptions());
    assert_eq!(r.production.self_consumed_kwh, 0.0);
    assert_eq!(r.production.self_sufficiency_ratio, 0.0);
    assert!((r.production.exported_kwh - r.production.annual_production_kwh).abs() < 1e-9);
}

#[test]
fn storage_sized_from_peak_shaving_adds_capex_and_demand_savings() {
    let readings = common::yearly_readings(|m| if m == 7 { 80.0 } else { 40.0 });
    let peak = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
    let storage = StorageParams::from_peak_shaving(&peak);
    assert!(storage.power_kw > 0.0);

    let assumptions = default_assumptions();
    let bare = run_scenario(&example_site(), &assumptions);
    let with_battery = run_scenario(&example_site().with_storage(storage), &assumptions);
    assert!(with_battery.gross_capex > bare.gross_capex);
    assert_eq!(with_battery.utility_incentive, bare.utility_incentive);
    assert!(with_battery.year_one.demand_savings > bare.year_one.demand_savings);
}

#[test]
fn storage_demand_credit_matches_analyzer_savings() {
    let readings = common::yearly_readings(|m| if m == 7 { 80.0 } else { 40.0 });
    let peak = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
    assert!(peak.demand_charge_savings > 0.0);

    let assumptions = default_assumptions();
    let bare = run_scenario(&example_site(), &assumptions);
    let with_battery = run_scenario(
        &example_site().with_storage(StorageParams::from_peak_shaving(&peak)),
        &assumptions,
    );
    let credit = with_battery.year_one.demand_savings - bare.year_one.demand_savings;
    assert!(
        (credit - peak.demand_charge_savings).abs() < 1e-6,
        "credit {credit} vs analyzer {}",
        peak.demand_charge_savings
    );
}

#[test]
fn model_trait_matches_free_function() {
    let site = example_site();
    let assumptions = EconomicAssumptions::default().with_bifacial(true, 0.08);
    let via_trait = CashflowModel.evaluate(&site, &assumptions).ok();
    assert_eq!(via_trait, Some(run_scenario(&site, &assumptions)));
}

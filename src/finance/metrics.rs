//! Discounted-cashflow metrics over a yearly cashflow series.
//!
//! All functions take the series indexed by year (index 0 = investment year).

use super::types::CashflowEntry;

/// Lower bound of the IRR bisection bracket.
const IRR_LOWER: f64 = -0.5;
/// Upper bound of the IRR bisection bracket.
const IRR_UPPER: f64 = 1.0;
const IRR_MAX_ITERATIONS: usize = 200;
/// NPV tolerance per dollar of net CAPEX.
const IRR_RELATIVE_TOLERANCE: f64 = 1e-7;
/// Floor for the NPV tolerance when net CAPEX is tiny or zero.
const IRR_MIN_TOLERANCE: f64 = 1e-6;

/// Net present value of `cashflows[0..=horizon]` at `rate`.
///
/// A horizon past the end of the series is truncated to the series length.
pub fn npv(cashflows: &[f64], rate: f64, horizon: usize) -> f64 {
    let end = horizon.min(cashflows.len().saturating_sub(1));
    let base = 1.0 + rate;
    cashflows
        .iter()
        .take(end + 1)
        .enumerate()
        .map(|(t, cf)| cf / base.powi(t as i32))
        .sum()
}

/// Internal rate of return of `cashflows[0..=horizon]` by bisection.
///
/// The search runs over `[-0.5, 1.0]` and stops once `|NPV|` falls under a
/// tolerance proportional to `net_capex`. The result is clamped to `[0, 1]`:
/// series whose IRR lies outside that band report the nearest bound.
pub fn irr(cashflows: &[f64], horizon: usize, net_capex: f64) -> f64 {
    let tolerance = (net_capex.abs() * IRR_RELATIVE_TOLERANCE).max(IRR_MIN_TOLERANCE);

    if cashflows.iter().take(horizon + 1).all(|cf| *cf == 0.0) {
        return 0.0;
    }

    let npv_upper = npv(cashflows, IRR_UPPER, horizon);
    if npv_upper > 0.0 {
        return IRR_UPPER;
    }
    let npv_lower = npv(cashflows, IRR_LOWER, horizon);
    if npv_lower < 0.0 {
        return 0.0;
    }

    let mut lo = IRR_LOWER;
    let mut hi = IRR_UPPER;
    let mut mid = 0.5 * (lo + hi);
    for _ in 0..IRR_MAX_ITERATIONS {
        mid = 0.5 * (lo + hi);
        let value = npv(cashflows, mid, horizon);
        if value.abs() < tolerance {
            break;
        }
        if value > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    mid.clamp(0.0, 1.0)
}

/// Fractional payback year from a cumulative cashflow series.
///
/// Returns the first year at which the cumulative sum crosses from negative
/// to non-negative, linearly interpolated inside that year. A series that is
/// never negative but has positive operating cashflow pays back at year 0.
/// A series that never recovers reports the last year of the series.
pub fn payback_years(cashflows: &[CashflowEntry]) -> f64 {
    let Some(last) = cashflows.last() else {
        return 0.0;
    };
    let horizon = last.year as f64;

    let never_negative = cashflows.iter().all(|c| c.cumulative >= 0.0);
    if never_negative {
        let operating: f64 = cashflows.iter().skip(1).map(|c| c.net_cashflow).sum();
        return if operating > 0.0 { 0.0 } else { horizon };
    }

    for pair in cashflows.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if prev.cumulative < 0.0 && cur.cumulative >= 0.0 {
            let span = cur.cumulative - prev.cumulative;
            let fraction = if span > 0.0 {
                -prev.cumulative / span
            } else {
                1.0
            };
            return (prev.year as f64 + fraction).clamp(0.0, horizon);
        }
    }
    horizon
}

/// Builds cumulative entries from yearly net cashflows.
pub fn accumulate(net: &[f64]) -> Vec<CashflowEntry> {
    let mut cumulative = 0.0;
    net.iter()
        .enumerate()
        .map(|(year, &net_cashflow)| {
            cumulative += net_cashflow;
            CashflowEntry {
                year,
                net_cashflow,
                cumulative,
            }
        })
        .collect()
}

/// Levelized cost of energy over operating years.
///
/// `costs` and `production` are indexed by operating year starting at 1
/// (element 0 is year 1). Returns 0 when there is no production.
pub fn lcoe(net_capex: f64, costs: &[f64], production: &[f64], rate: f64) -> f64 {
    let base = 1.0 + rate;
    let mut discounted_cost = net_capex;
    let mut discounted_energy = 0.0;
    for (i, (cost, energy)) in costs.iter().zip(production).enumerate() {
        let factor = base.powi(i as i32 + 1);
        discounted_cost += cost / factor;
        discounted_energy += energy / factor;
    }
    if discounted_energy > 0.0 {
        discounted_cost / discounted_energy
    } else {
        0.0
    }
}

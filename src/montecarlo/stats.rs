//! Percentile summaries over simulated outcomes.

use serde::Serialize;

/// P10/P50/P90 and mean of one output metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FinancialSummary {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub mean: f64,
}

impl FinancialSummary {
    /// Summarises `values` (any order). An empty slice yields all zeros.
    pub fn from_values(values: &[f64]) -> Self {
        let sorted = sorted(values);
        Self::from_sorted(&sorted)
    }

    /// Summarises an ascending-sorted slice.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        if sorted.is_empty() {
            return Self::default();
        }
        Self {
            p10: nearest_rank(sorted, 0.10),
            p50: nearest_rank(sorted, 0.50),
            p90: nearest_rank(sorted, 0.90),
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        }
    }
}

/// Returns a sorted ascending copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Nearest-rank percentile: `sorted[floor(n * p)]`, clamped to the last element.
///
/// `sorted` must be ascending and non-empty.
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let index = ((n as f64 * p).floor() as usize).min(n - 1);
    sorted[index]
}

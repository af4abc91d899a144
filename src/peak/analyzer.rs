//! Demand-charge analysis and battery sizing from interval meter data.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::meter::MeterReading;
use super::profile::SolarProfile;
use super::tariff::{TariffCode, TariffRates};

/// Number of highest net-demand points reported.
pub const TOP_PEAK_COUNT: usize = 10;
/// Safety margin applied to the recommended battery power.
pub const BATTERY_POWER_MARGIN: f64 = 1.1;
/// A point is "elevated" above this multiple of its month's average.
pub const ELEVATED_FACTOR: f64 = 1.2;

/// Analyzer inputs besides the readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeakShavingConfig {
    pub tariff: TariffCode,
    /// Fraction shaved off the annual maximum peak.
    pub target_reduction: f64,
    /// Hours the battery must sustain the shaving power.
    pub min_coverage_hours: f64,
    /// Optional typical-day solar production per month.
    pub solar_profile: Option<SolarProfile>,
}

impl Default for PeakShavingConfig {
    fn default() -> Self {
        Self {
            tariff: TariffCode::M,
            target_reduction: 0.15,
            min_coverage_hours: 0.5,
            solar_profile: None,
        }
    }
}

/// One net-demand point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub timestamp: NaiveDateTime,
    pub gross_kw: f64,
    pub solar_kw: f64,
    /// `max(0, gross - solar)`.
    pub net_kw: f64,
    pub month: u32,
    /// Whether this point sets its month's billed demand.
    pub is_monthly_peak: bool,
}

/// Net-demand statistics for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyPeakStats {
    pub month: u32,
    pub max_kw: f64,
    pub average_kw: f64,
    /// Points above 120% of the month's average.
    pub elevated_count: usize,
    pub reading_count: usize,
}

/// Demand-charge exposure and the battery needed to shave it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakShavingResult {
    /// Highest net-demand points of the whole period, descending.
    pub top_peaks: Vec<Peak>,
    /// Billed peak of each calendar month, January first. Readings from
    /// the same month of different years share one billing month.
    pub monthly_peaks: Vec<Peak>,
    pub current_annual_demand_charge: f64,
    pub max_peak_kw: f64,
    pub target_peak_kw: f64,
    /// `max_peak_kw - target_peak_kw`.
    pub demand_reduction_kw: f64,
    pub demand_charge_savings: f64,
    pub recommended_battery_kw: f64,
    pub recommended_battery_kwh: f64,
    pub monthly_stats: Vec<MonthlyPeakStats>,
    pub tariff: TariffRates,
}

impl PeakShavingResult {
    fn empty(tariff: TariffRates) -> Self {
        Self {
            top_peaks: Vec::new(),
            monthly_peaks: Vec::new(),
            current_annual_demand_charge: 0.0,
            max_peak_kw: 0.0,
            target_peak_kw: 0.0,
            demand_reduction_kw: 0.0,
            demand_charge_savings: 0.0,
            recommended_battery_kw: 0.0,
            recommended_battery_kwh: 0.0,
            monthly_stats: Vec::new(),
            tariff,
        }
    }
}

/// Analyzes demand charges and sizes a peak-shaving battery.
///
/// Prefers 15-minute readings with positive demand and falls back to any
/// positive-demand reading. Empty or all-zero input returns a zeroed result.
pub fn analyze_peak_shaving(
    readings: &[MeterReading],
    config: &PeakShavingConfig,
) -> PeakShavingResult {
    let tariff = config.tariff.rates();

    let positive = |r: &&MeterReading| r.demand_kw().is_some_and(|kw| kw > 0.0);
    let mut selected: Vec<&MeterReading> = readings
        .iter()
        .filter(|r| r.is_fifteen_min())
        .filter(positive)
        .collect();
    if selected.is_empty() {
        debug!("no 15-minute demand readings, falling back to all positive readings");
        selected = readings.iter().filter(positive).collect();
    }
    if selected.is_empty() {
        return PeakShavingResult::empty(tariff);
    }

    let mut by_month: BTreeMap<u32, Vec<Peak>> = BTreeMap::new();
    for reading in selected {
        let gross_kw = reading.demand_kw().unwrap_or(0.0);
        let solar_kw = config
            .solar_profile
            .as_ref()
            .map_or(0.0, |p| p.expected_kw(&reading.timestamp));
        let peak = Peak {
            timestamp: reading.timestamp,
            gross_kw,
            solar_kw,
            net_kw: (gross_kw - solar_kw).max(0.0),
            month: reading.timestamp.month(),
            is_monthly_peak: false,
        };
        by_month.entry(peak.month).or_default().push(peak);
    }

    let mut monthly_peaks = Vec::with_capacity(by_month.len());
    let mut monthly_stats = Vec::with_capacity(by_month.len());
    let mut all_points = Vec::new();
    for (month, points) in &mut by_month {
        let mut best = 0;
        for (i, p) in points.iter().enumerate() {
            if p.net_kw > points[best].net_kw {
                best = i;
            }
        }
        points[best].is_monthly_peak = true;
        monthly_peaks.push(points[best]);

        let count = points.len();
        let average_kw = points.iter().map(|p| p.net_kw).sum::<f64>() / count as f64;
        let elevated_count = points
            .iter()
            .filter(|p| p.net_kw > average_kw * ELEVATED_FACTOR)
            .count();
        monthly_stats.push(MonthlyPeakStats {
            month: *month,
            max_kw: points[best].net_kw,
            average_kw,
            elevated_count,
            reading_count: count,
        });
        all_points.extend(points.iter().copied());
    }

    let max_peak_kw = monthly_peaks.iter().map(|p| p.net_kw).fold(0.0, f64::max);
    let target_peak_kw = max_peak_kw * (1.0 - config.target_reduction);
    let current_annual_demand_charge: f64 = monthly_peaks
        .iter()
        .map(|p| p.net_kw * tariff.demand_rate)
        .sum();
    let demand_charge_savings: f64 = monthly_peaks
        .iter()
        .map(|p| (p.net_kw - target_peak_kw).max(0.0) * tariff.demand_rate)
        .sum();
    let demand_reduction_kw = max_peak_kw - target_peak_kw;
    let recommended_battery_kw = (BATTERY_POWER_MARGIN * demand_reduction_kw).ceil();
    let recommended_battery_kwh = recommended_battery_kw * config.min_coverage_hours;

    all_points.sort_by(|a, b| {
        b.net_kw
            .total_cmp(&a.net_kw)
            .then(a.timestamp.cmp(&b.timestamp))
    });
    all_points.truncate(TOP_PEAK_COUNT);

    debug!(
        months = monthly_peaks.len(),
        max_peak_kw, target_peak_kw, recommended_battery_kw, "peak shaving analysed"
    );

    PeakShavingResult {
        top_peaks: all_points,
        monthly_peaks,
        current_annual_demand_charge,
        max_peak_kw,
        target_peak_kw,
        demand_reduction_kw,
        demand_charge_savings,
        recommended_battery_kw,
        recommended_battery_kwh,
        monthly_stats,
        tariff,
    }
}

impl fmt::Display for PeakShavingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Peak Shaving Report ---")?;
        writeln!(
            f,
            "Tariff:                {} (${:.3}/kW, ${:.5}/kWh)",
            self.tariff.code, self.tariff.demand_rate, self.tariff.energy_rate
        )?;
        writeln!(f, "Months analysed:       {}", self.monthly_peaks.len())?;
        writeln!(f, "Max net peak:          {:.2} kW", self.max_peak_kw)?;
        writeln!(f, "Target peak:           {:.2} kW", self.target_peak_kw)?;
        writeln!(
            f,
            "Annual demand charge:  ${:.2}",
            self.current_annual_demand_charge
        )?;
        writeln!(f, "Demand savings:        ${:.2}", self.demand_charge_savings)?;
        write!(
            f,
            "Battery:               {:.0} kW / {:.1} kWh",
            self.recommended_battery_kw, self.recommended_battery_kwh
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peak::meter::Granularity;
    use crate::peak::profile::ProfilePoint;
    use chrono::NaiveDate;

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    fn reading(ts: NaiveDateTime, kw: f64, granularity: Granularity) -> MeterReading {
        MeterReading::new(ts, None, Some(kw), granularity)
    }

    #[test]
    fn empty_input_is_zeroed() {
        let r = analyze_peak_shaving(&[], &PeakShavingConfig::default());
        assert!(r.top_peaks.is_empty());
        assert_eq!(r.current_annual_demand_charge, 0.0);
        assert_eq!(r.recommended_battery_kw, 0.0);
    }

    #[test]
    fn all_zero_demand_is_zeroed() {
        let readings: Vec<_> = (0..8)
            .map(|i| reading(at(3, 1, i, 0), 0.0, Granularity::FifteenMin))
            .collect();
        let r = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
        assert!(r.top_peaks.is_empty());
        assert_eq!(r.current_annual_demand_charge, 0.0);
    }

    #[test]
    fn fifteen_minute_readings_preferred() {
        let readings = vec![
            reading(at(1, 5, 10, 0), 500.0, Granularity::Hourly),
            reading(at(1, 5, 11, 0), 100.0, Granularity::FifteenMin),
        ];
        let r = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
        assert_eq!(r.max_peak_kw, 100.0);
    }

    #[test]
    fn falls_back_to_other_granularity() {
        let readings = vec![reading(at(1, 5, 10, 0), 80.0, Granularity::Hourly)];
        let r = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
        assert_eq!(r.max_peak_kw, 80.0);
        assert_eq!(r.monthly_peaks.len(), 1);
    }

    #[test]
    fn monthly_peaks_drive_charge_and_savings() {
        let readings = vec![
            reading(at(1, 5, 10, 0), 200.0, Granularity::FifteenMin),
            reading(at(1, 6, 10, 0), 150.0, Granularity::FifteenMin),
            reading(at(2, 5, 10, 0), 160.0, Granularity::FifteenMin),
        ];
        let config = PeakShavingConfig::default();
        let r = analyze_peak_shaving(&readings, &config);
        let rate = TariffCode::M.rates().demand_rate;

        assert_eq!(r.monthly_peaks.len(), 2);
        assert!((r.current_annual_demand_charge - (200.0 + 160.0) * rate).abs() < 1e-9);
        assert!((r.target_peak_kw - 170.0).abs() < 1e-9);
        // Only January (200 kW) exceeds the 170 kW target.
        assert!((r.demand_charge_savings - 30.0 * rate).abs() < 1e-9);
        assert_eq!(
            r.recommended_battery_kw,
            (BATTERY_POWER_MARGIN * r.demand_reduction_kw).ceil()
        );
        assert!(r.recommended_battery_kw >= 33.0);
        assert_eq!(r.recommended_battery_kwh, r.recommended_battery_kw * 0.5);
        assert!(r.demand_charge_savings <= r.current_annual_demand_charge);
    }

    #[test]
    fn solar_profile_nets_demand() {
        let readings = vec![reading(at(6, 3, 12, 0), 100.0, Granularity::FifteenMin)];
        let config = PeakShavingConfig {
            solar_profile: Some(SolarProfile::new(vec![ProfilePoint {
                month: 6,
                hour: 12,
                kw: 30.0,
            }])),
            ..PeakShavingConfig::default()
        };
        let r = analyze_peak_shaving(&readings, &config);
        assert_eq!(r.top_peaks[0].solar_kw, 30.0);
        assert_eq!(r.top_peaks[0].net_kw, 70.0);
    }

    #[test]
    fn net_demand_never_negative() {
        let readings = vec![reading(at(6, 3, 12, 0), 10.0, Granularity::FifteenMin)];
        let config = PeakShavingConfig {
            solar_profile: Some(SolarProfile::new(vec![ProfilePoint {
                month: 6,
                hour: 12,
                kw: 50.0,
            }])),
            ..PeakShavingConfig::default()
        };
        let r = analyze_peak_shaving(&readings, &config);
        assert_eq!(r.top_peaks[0].net_kw, 0.0);
    }

    #[test]
    fn top_peaks_limited_and_sorted() {
        let readings: Vec<_> = (0..30)
            .map(|i| {
                let ts = at(4, 1 + i / 4, (i % 4) * 3, 0);
                reading(ts, 50.0 + f64::from(i), Granularity::FifteenMin)
            })
            .collect();
        let r = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
        assert_eq!(r.top_peaks.len(), TOP_PEAK_COUNT);
        assert_eq!(r.top_peaks[0].net_kw, 79.0);
        assert!(r.top_peaks.windows(2).all(|w| w[0].net_kw >= w[1].net_kw));
        assert!(r.top_peaks[0].is_monthly_peak);
        assert!(!r.top_peaks[1].is_monthly_peak);
    }

    #[test]
    fn monthly_stats_count_elevated_points() {
        let readings = vec![
            reading(at(5, 1, 0, 0), 10.0, Granularity::FifteenMin),
            reading(at(5, 1, 0, 15), 10.0, Granularity::FifteenMin),
            reading(at(5, 1, 0, 30), 10.0, Granularity::FifteenMin),
            reading(at(5, 1, 0, 45), 50.0, Granularity::FifteenMin),
        ];
        let r = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
        let stats = r.monthly_stats[0];
        assert_eq!(stats.reading_count, 4);
        assert_eq!(stats.average_kw, 20.0);
        assert_eq!(stats.elevated_count, 1);
        assert_eq!(stats.max_kw, 50.0);
    }

    #[test]
    fn two_years_bill_twelve_months() {
        let mut readings = Vec::new();
        for year in [2023, 2024] {
            for month in 1..=12 {
                let ts = NaiveDate::from_ymd_opt(year, month, 15)
                    .and_then(|d| d.and_hms_opt(12, 0, 0))
                    .expect("valid timestamp");
                let kw = if year == 2024 && month == 3 { 130.0 } else { 100.0 };
                readings.push(reading(ts, kw, Granularity::FifteenMin));
            }
        }
        let r = analyze_peak_shaving(&readings, &PeakShavingConfig::default());
        let rate = TariffCode::M.rates().demand_rate;

        assert_eq!(r.monthly_peaks.len(), 12);
        assert_eq!(r.monthly_stats.len(), 12);
        assert!((r.current_annual_demand_charge - (11.0 * 100.0 + 130.0) * rate).abs() < 1e-6);
        let march = r.monthly_stats[2];
        assert_eq!(march.month, 3);
        assert_eq!(march.reading_count, 2);
        assert_eq!(march.max_kw, 130.0);
        assert_eq!(r.monthly_peaks[2].timestamp.year(), 2024);
    }

    #[test]
    fn g_tariff_has_no_charge() {
        let readings = vec![reading(at(1, 5, 10, 0), 90.0, Granularity::FifteenMin)];
        let config = PeakShavingConfig {
            tariff: TariffCode::G,
            ..PeakShavingConfig::default()
        };
        let r = analyze_peak_shaving(&readings, &config);
        assert_eq!(r.current_annual_demand_charge, 0.0);
        assert_eq!(r.demand_charge_savings, 0.0);
    }
}

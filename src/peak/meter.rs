//! Interval meter readings.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Interval length of a meter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    FifteenMin,
    Hourly,
    Daily,
    Other,
}

impl Granularity {
    /// Interval length in hours, when fixed.
    pub fn hours(self) -> Option<f64> {
        match self {
            Granularity::FifteenMin => Some(0.25),
            Granularity::Hourly => Some(1.0),
            Granularity::Daily | Granularity::Other => None,
        }
    }

    /// Parses the tags used by meter exports (`FIFTEEN_MIN`, `15MIN`, `HOURLY`...).
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "FIFTEEN_MIN" | "15MIN" | "15_MIN" | "PT15M" => Granularity::FifteenMin,
            "HOURLY" | "HOUR" | "PT1H" => Granularity::Hourly,
            "DAILY" | "DAY" | "P1D" => Granularity::Daily,
            _ => Granularity::Other,
        }
    }
}

/// One raw reading from a utility interval meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    /// Interval start (site local time).
    pub timestamp: NaiveDateTime,
    /// Energy over the interval (kWh).
    pub kwh: Option<f64>,
    /// Average demand over the interval (kW).
    pub kw: Option<f64>,
    pub granularity: Granularity,
}

impl MeterReading {
    pub fn new(
        timestamp: NaiveDateTime,
        kwh: Option<f64>,
        kw: Option<f64>,
        granularity: Granularity,
    ) -> Self {
        Self {
            timestamp,
            kwh,
            kw,
            granularity,
        }
    }

    /// Demand in kW: the reported value, else energy over a fixed interval.
    pub fn demand_kw(&self) -> Option<f64> {
        self.kw.or_else(|| {
            let hours = self.granularity.hours()?;
            self.kwh.map(|kwh| kwh / hours)
        })
    }

    /// Returns `true` for 15-minute readings.
    pub fn is_fifteen_min(&self) -> bool {
        self.granularity == Granularity::FifteenMin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(14, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn reported_kw_wins() {
        let r = MeterReading::new(ts(), Some(10.0), Some(30.0), Granularity::FifteenMin);
        assert_eq!(r.demand_kw(), Some(30.0));
    }

    #[test]
    fn kw_derived_from_fifteen_minute_energy() {
        let r = MeterReading::new(ts(), Some(10.0), None, Granularity::FifteenMin);
        assert_eq!(r.demand_kw(), Some(40.0));
    }

    #[test]
    fn daily_energy_has_no_demand() {
        let r = MeterReading::new(ts(), Some(240.0), None, Granularity::Daily);
        assert_eq!(r.demand_kw(), None);
    }

    #[test]
    fn tags_parse() {
        assert_eq!(Granularity::from_tag("FIFTEEN_MIN"), Granularity::FifteenMin);
        assert_eq!(Granularity::from_tag("15min"), Granularity::FifteenMin);
        assert_eq!(Granularity::from_tag("hourly"), Granularity::Hourly);
        assert_eq!(Granularity::from_tag("weird"), Granularity::Other);
    }
}

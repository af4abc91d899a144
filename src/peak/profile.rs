//! Hourly solar production profile used to net solar out of metered demand.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Expected PV output for one hour of one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    /// Calendar month, 1-12.
    pub month: u32,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Expected output (kW).
    pub kw: f64,
}

/// Typical-day production profile, one curve per month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarProfile {
    points: Vec<ProfilePoint>,
}

impl SolarProfile {
    pub fn new(points: Vec<ProfilePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    /// Expected solar output at `timestamp`.
    ///
    /// Uses the exact month/hour point when present, otherwise the nearest
    /// hour within the same month, otherwise 0.
    pub fn expected_kw(&self, timestamp: &NaiveDateTime) -> f64 {
        let month = timestamp.month();
        let hour = timestamp.hour();
        self.points
            .iter()
            .filter(|p| p.month == month)
            .min_by_key(|p| p.hour.abs_diff(hour))
            .map_or(0.0, |p| p.kw)
    }
}

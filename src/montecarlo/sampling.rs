//! Uncertain input ranges and the per-iteration assumption variants drawn from them.

use serde::{Deserialize, Serialize};

use crate::error::EconError;
use crate::finance::types::{EconomicAssumptions, OmCost};

use super::random::RandomSource;

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableRange {
    pub min: f64,
    pub max: f64,
}

impl VariableRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draws a uniform value inside the range.
    pub fn sample(&self, source: &mut dyn RandomSource) -> f64 {
        source.uniform(self.min, self.max)
    }

    fn check(&self, variable: &'static str) -> Result<(), EconError> {
        if self.min > self.max || !self.min.is_finite() || !self.max.is_finite() {
            return Err(EconError::InvalidRange {
                variable,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Ranges of the six uncertain inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariableRanges {
    /// Base specific yield (kWh/kWp).
    pub solar_yield: VariableRange,
    /// Installed PV cost ($/W).
    pub cost_per_watt: VariableRange,
    /// Energy tariff escalation (fraction).
    pub tariff_escalation: VariableRange,
    /// Yearly degradation (fraction).
    pub degradation: VariableRange,
    /// O&M cost ($/kWc/yr).
    pub om_per_kwc: VariableRange,
    /// Bifacial boost (fraction).
    pub bifacial_boost: VariableRange,
}

impl Default for VariableRanges {
    fn default() -> Self {
        Self {
            solar_yield: VariableRange::new(1050.0, 1250.0),
            cost_per_watt: VariableRange::new(1.80, 2.30),
            tariff_escalation: VariableRange::new(0.02, 0.04),
            degradation: VariableRange::new(0.003, 0.007),
            om_per_kwc: VariableRange::new(10.0, 25.0),
            bifacial_boost: VariableRange::new(0.0, 0.10),
        }
    }
}

impl VariableRanges {
    /// Checks `min <= max` for every range.
    pub fn validate(&self) -> Result<(), EconError> {
        self.named().into_iter().try_for_each(|(name, r)| r.check(name))
    }

    /// Ranges paired with their dotted names, in sampling order.
    pub fn named(&self) -> [(&'static str, VariableRange); 6] {
        [
            ("solar_yield", self.solar_yield),
            ("cost_per_watt", self.cost_per_watt),
            ("tariff_escalation", self.tariff_escalation),
            ("degradation", self.degradation),
            ("om_per_kwc", self.om_per_kwc),
            ("bifacial_boost", self.bifacial_boost),
        ]
    }

    /// Draws one sample, each variable independently, in a fixed order.
    pub fn sample(&self, source: &mut dyn RandomSource) -> SampledVariables {
        SampledVariables {
            solar_yield: self.solar_yield.sample(source),
            cost_per_watt: self.cost_per_watt.sample(source),
            tariff_escalation: self.tariff_escalation.sample(source),
            degradation: self.degradation.sample(source),
            om_per_kwc: self.om_per_kwc.sample(source),
            bifacial_boost: self.bifacial_boost.sample(source),
        }
    }
}

/// One draw of the six uncertain inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampledVariables {
    pub solar_yield: f64,
    pub cost_per_watt: f64,
    pub tariff_escalation: f64,
    pub degradation: f64,
    pub om_per_kwc: f64,
    pub bifacial_boost: f64,
}

impl SampledVariables {
    /// Builds a fresh assumption set from `base` with this sample applied.
    ///
    /// The bifacial boost is folded into the yield and the bifacial flag is
    /// cleared so the scenario model does not apply it twice. O&M is
    /// expressed as a share of CAPEX priced with the sampled $/W, which keeps
    /// the absolute O&M equal to `om_per_kwc` per kWc.
    pub fn apply_to(&self, base: &EconomicAssumptions) -> EconomicAssumptions {
        let om_share = if self.cost_per_watt > 0.0 {
            self.om_per_kwc / (self.cost_per_watt * 1000.0)
        } else {
            0.0
        };
        base.with_solar_yield(self.solar_yield * (1.0 + self.bifacial_boost))
            .with_bifacial(false, self.bifacial_boost)
            .with_solar_cost_per_watt(self.cost_per_watt)
            .with_tariff_escalation_rate(self.tariff_escalation)
            .with_degradation_rate(self.degradation)
            .with_om_cost(OmCost::PercentOfCapex(om_share))
    }
}

//! TOML-based analysis configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::finance::scenario::ASSUMED_TEMP_DELTA_C;
use crate::finance::{EconomicAssumptions, OmCost, SiteScenarioParams};
use crate::kits::{OptimalSizing, SelectionPolicy};
use crate::montecarlo::MonteCarloConfig;
use crate::peak::{PeakShavingConfig, TariffCode};

/// Top-level analysis configuration parsed from TOML.
///
/// All sections have defaults matching the baseline site. Load from
/// TOML with [`AnalysisConfig::from_toml_file`] or use
/// [`AnalysisConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Site and tariff description.
    #[serde(default)]
    pub site: SiteScenarioParams,
    /// Economic assumptions.
    #[serde(default)]
    pub assumptions: EconomicAssumptions,
    /// Monte Carlo run parameters.
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
    /// Peak-shaving analysis parameters.
    #[serde(default)]
    pub peak_shaving: PeakShavingConfig,
    /// Kit selection policy.
    #[serde(default)]
    pub kit_policy: SelectionPolicy,
    /// Optimal sizing to match against the catalog; derived from the site
    /// when absent.
    #[serde(default)]
    pub sizing: Option<OptimalSizing>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"site.pv_kw"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl AnalysisConfig {
    /// Returns the baseline preset: the 100 kW medium-power commercial site.
    pub fn baseline() -> Self {
        Self {
            site: SiteScenarioParams::default(),
            assumptions: EconomicAssumptions::default(),
            monte_carlo: MonteCarloConfig::default(),
            peak_shaving: PeakShavingConfig::default(),
            kit_policy: SelectionPolicy::default(),
            sizing: None,
        }
    }

    /// Returns the residential preset: small array on the G tariff.
    pub fn residential() -> Self {
        let rates = TariffCode::G.rates();
        Self {
            site: SiteScenarioParams {
                pv_kw: 8.0,
                annual_consumption_kwh: 14_000.0,
                tariff_energy_rate: rates.energy_rate,
                tariff_demand_rate: rates.demand_rate,
                peak_demand_kw: 7.0,
                storage: None,
            },
            assumptions: EconomicAssumptions {
                solar_cost_per_watt: 2.60,
                om_cost: OmCost::PerKwc(20.0),
                tax_rate: 0.0,
                ..EconomicAssumptions::default()
            },
            peak_shaving: PeakShavingConfig {
                tariff: TariffCode::G,
                ..PeakShavingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the large-commercial preset: 500 kW array on the L tariff.
    pub fn large_commercial() -> Self {
        let rates = TariffCode::L.rates();
        Self {
            site: SiteScenarioParams {
                pv_kw: 500.0,
                annual_consumption_kwh: 2_400_000.0,
                tariff_energy_rate: rates.energy_rate,
                tariff_demand_rate: rates.demand_rate,
                peak_demand_kw: 900.0,
                storage: None,
            },
            assumptions: EconomicAssumptions {
                solar_cost_per_watt: 1.70,
                om_cost: OmCost::PerKwc(12.0),
                ..EconomicAssumptions::default()
            },
            peak_shaving: PeakShavingConfig {
                tariff: TariffCode::L,
                target_reduction: 0.10,
                min_coverage_hours: 1.0,
                ..PeakShavingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "residential", "large_commercial"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "residential" => Ok(Self::residential()),
            "large_commercial" => Ok(Self::large_commercial()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Sizing handed to the kit recommender.
    pub fn optimal_sizing(&self) -> OptimalSizing {
        self.sizing.unwrap_or_else(|| {
            let (kwh, kw) = self
                .site
                .storage
                .map_or((0.0, 0.0), |s| (s.energy_kwh, s.power_kw));
            OptimalSizing::new(self.site.pv_kw, kwh, kw)
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError {
                    field: field.to_string(),
                    message: message.to_string(),
                });
            }
        };
        let fraction = |v: f64| (0.0..=1.0).contains(&v);

        let s = &self.site;
        check(s.pv_kw >= 0.0, "site.pv_kw", "must be >= 0");
        check(
            s.annual_consumption_kwh >= 0.0,
            "site.annual_consumption_kwh",
            "must be >= 0",
        );
        check(s.tariff_energy_rate >= 0.0, "site.tariff_energy_rate", "must be >= 0");
        check(s.tariff_demand_rate >= 0.0, "site.tariff_demand_rate", "must be >= 0");
        check(s.peak_demand_kw >= 0.0, "site.peak_demand_kw", "must be >= 0");
        if let Some(st) = &s.storage {
            check(st.power_kw >= 0.0, "site.storage.power_kw", "must be >= 0");
            check(st.energy_kwh >= 0.0, "site.storage.energy_kwh", "must be >= 0");
            check(
                st.annual_demand_savings >= 0.0,
                "site.storage.annual_demand_savings",
                "must be >= 0",
            );
        }

        let a = &self.assumptions;
        check(
            a.solar_yield_kwh_per_kwp >= 0.0,
            "assumptions.solar_yield_kwh_per_kwp",
            "must be >= 0",
        );
        for (field, value) in [
            ("assumptions.degradation_rate", a.degradation_rate),
            ("assumptions.tariff_escalation_rate", a.tariff_escalation_rate),
            ("assumptions.demand_escalation_rate", a.demand_escalation_rate),
            ("assumptions.discount_rate", a.discount_rate),
            ("assumptions.om_escalation_rate", a.om_escalation_rate),
            ("assumptions.tax_rate", a.tax_rate),
            ("assumptions.wire_loss", a.wire_loss),
            ("assumptions.bifacial_boost", a.bifacial_boost),
        ] {
            check(fraction(value), field, "must be in [0.0, 1.0]");
        }
        check(
            a.temperature_coefficient.abs() * ASSUMED_TEMP_DELTA_C < 1.0,
            "assumptions.temperature_coefficient",
            "temperature loss must stay below 100% (|coefficient| < 1/15)",
        );
        check(
            a.solar_cost_per_watt > 0.0,
            "assumptions.solar_cost_per_watt",
            "must be > 0",
        );
        match a.om_cost {
            OmCost::PerKwc(rate) => check(rate > 0.0, "assumptions.om_cost.per_kwc", "must be > 0"),
            OmCost::PercentOfCapex(f) => check(
                fraction(f),
                "assumptions.om_cost.percent_of_capex",
                "must be in [0.0, 1.0]",
            ),
        }
        check(
            a.battery_cost_per_kwh >= 0.0,
            "assumptions.battery_cost_per_kwh",
            "must be >= 0",
        );
        check(
            a.battery_cost_per_kw >= 0.0,
            "assumptions.battery_cost_per_kw",
            "must be >= 0",
        );
        check(
            a.surplus_compensation_rate >= 0.0,
            "assumptions.surplus_compensation_rate",
            "must be >= 0",
        );

        let mc = &self.monte_carlo;
        check(mc.iterations > 0, "monte_carlo.iterations", "must be > 0");
        check(mc.workers > 0, "monte_carlo.workers", "must be > 0");
        for (name, range) in mc.ranges.named() {
            check(
                range.min <= range.max,
                &format!("monte_carlo.ranges.{name}"),
                "min must be <= max",
            );
        }

        let ps = &self.peak_shaving;
        check(
            ps.target_reduction > 0.0 && ps.target_reduction <= 1.0,
            "peak_shaving.target_reduction",
            "must be in (0.0, 1.0]",
        );
        check(
            ps.min_coverage_hours > 0.0,
            "peak_shaving.min_coverage_hours",
            "must be > 0",
        );

        let kp = &self.kit_policy;
        check(
            kp.max_oversize_pct >= 0.0,
            "kit_policy.max_oversize_pct",
            "must be >= 0",
        );
        for (field, value) in [
            ("kit_policy.custom_pv_cost_per_watt", kp.custom_pv_cost_per_watt),
            ("kit_policy.custom_battery_cost_per_kwh", kp.custom_battery_cost_per_kwh),
            ("kit_policy.custom_battery_cost_per_kw", kp.custom_battery_cost_per_kw),
        ] {
            check(value > 0.0, field, "must be > 0");
        }

        if let Some(sz) = &self.sizing {
            check(
                sz.pv_kw >= 0.0 && sz.battery_kwh >= 0.0 && sz.battery_kw >= 0.0,
                "sizing",
                "sizes must be >= 0",
            );
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = AnalysisConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = AnalysisConfig::from_preset("nonexistent");
        assert!(err.is_err());
        assert!(err.err().is_some_and(|e| e.message.contains("unknown preset")));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in AnalysisConfig::PRESETS {
            let cfg = AnalysisConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn presets_differ_in_scale() {
        let res = AnalysisConfig::residential();
        let big = AnalysisConfig::large_commercial();
        assert!(res.site.pv_kw < AnalysisConfig::baseline().site.pv_kw);
        assert!(big.site.pv_kw > AnalysisConfig::baseline().site.pv_kw);
        assert_eq!(res.peak_shaving.tariff, TariffCode::G);
        assert_eq!(big.peak_shaving.tariff, TariffCode::L);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[site]
pv_kw = 250.0
annual_consumption_kwh = 900000.0
tariff_energy_rate = 0.0359
tariff_demand_rate = 14.025
peak_demand_kw = 400.0

[site.storage]
power_kw = 60.0
energy_kwh = 30.0
annual_demand_savings = 8000.0

[assumptions]
solar_yield_kwh_per_kwp = 1100.0
om_cost = { percent_of_capex = 0.01 }
bifacial_enabled = true

[monte_carlo]
iterations = 200
seed = 7
workers = 4

[monte_carlo.ranges.solar_yield]
min = 1000.0
max = 1200.0

[peak_shaving]
tariff = "L"
target_reduction = 0.2

[kit_policy]
strategy = "nearest"
max_oversize_pct = 20.0
"#;
        let cfg = AnalysisConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.site.pv_kw), Some(250.0));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.site.storage).map(|s| s.power_kw),
            Some(60.0)
        );
        assert_eq!(
            cfg.as_ref().map(|c| c.assumptions.om_cost),
            Some(OmCost::PercentOfCapex(0.01))
        );
        assert_eq!(cfg.as_ref().and_then(|c| c.monte_carlo.seed), Some(7));
        assert_eq!(
            cfg.as_ref().map(|c| c.monte_carlo.ranges.solar_yield.max),
            Some(1200.0)
        );
        assert_eq!(
            cfg.as_ref().map(|c| c.peak_shaving.tariff),
            Some(TariffCode::L)
        );
        assert!(cfg.is_some_and(|c| c.validate().is_empty()));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[site]
pv_kw = 10.0
bogus_field = true
"#;
        assert!(AnalysisConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = AnalysisConfig::from_toml_str("[site]\npv_kw = 42.0\n");
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        // overridden
        assert_eq!(cfg.as_ref().map(|c| c.site.pv_kw), Some(42.0));
        // defaults kept
        assert_eq!(cfg.as_ref().map(|c| c.site.peak_demand_kw), Some(220.0));
        assert_eq!(cfg.as_ref().map(|c| c.monte_carlo.iterations), Some(500));
    }

    #[test]
    fn validation_collects_every_error() {
        let mut cfg = AnalysisConfig::baseline();
        cfg.site.pv_kw = -1.0;
        cfg.assumptions.discount_rate = 1.5;
        cfg.assumptions.solar_cost_per_watt = 0.0;
        cfg.monte_carlo.iterations = 0;
        cfg.monte_carlo.ranges.degradation.min = 0.01;
        cfg.peak_shaving.target_reduction = 0.0;
        let errors = cfg.validate();
        for field in [
            "site.pv_kw",
            "assumptions.discount_rate",
            "assumptions.solar_cost_per_watt",
            "monte_carlo.iterations",
            "monte_carlo.ranges.degradation",
            "peak_shaving.target_reduction",
        ] {
            assert!(errors.iter().any(|e| e.field == field), "missing {field}");
        }
    }

    #[test]
    fn temperature_coefficient_keeps_yield_positive() {
        let mut cfg = AnalysisConfig::baseline();
        cfg.assumptions.temperature_coefficient = -0.0035;
        assert!(cfg.validate().is_empty());

        cfg.assumptions.temperature_coefficient = -0.07;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "assumptions.temperature_coefficient")
        );
    }

    #[test]
    fn sizing_derived_from_site() {
        let sizing = AnalysisConfig::baseline().optimal_sizing();
        assert_eq!(sizing.pv_kw, 100.0);
        assert!(!sizing.wants_storage());
    }
}

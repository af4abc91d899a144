//! Maps a continuous optimal sizing onto the standard kit catalog.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{Bilingual, KitCatalog, StandardKit};
use crate::error::EconError;

/// Oversize (in percent) still considered an excellent match.
pub const EXCELLENT_MATCH_PCT: f64 = 5.0;

/// Continuous sizing produced by an optimiser.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimalSizing {
    pub pv_kw: f64,
    pub battery_kwh: f64,
    pub battery_kw: f64,
}

impl OptimalSizing {
    pub fn new(pv_kw: f64, battery_kwh: f64, battery_kw: f64) -> Self {
        Self {
            pv_kw,
            battery_kwh,
            battery_kw,
        }
    }

    /// Returns `true` if any battery capacity or power is requested.
    pub fn wants_storage(&self) -> bool {
        self.battery_kwh > 0.0 || self.battery_kw > 0.0
    }
}

/// How a kit is chosen among the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Smallest kit at least as large as the optimal PV size.
    #[default]
    PreferOversize,
    /// Kit with the smallest absolute PV size difference.
    Nearest,
}

/// Knobs of the kit selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionPolicy {
    pub strategy: SelectionStrategy,
    /// Also report the next-smaller kit.
    pub include_alternative: bool,
    /// Oversize (percent) above which a custom build is recommended.
    pub max_oversize_pct: f64,
    pub custom_pv_cost_per_watt: f64,
    pub custom_battery_cost_per_kwh: f64,
    pub custom_battery_cost_per_kw: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::PreferOversize,
            include_alternative: true,
            max_oversize_pct: 30.0,
            custom_pv_cost_per_watt: 2.0,
            custom_battery_cost_per_kwh: 550.0,
            custom_battery_cost_per_kw: 300.0,
        }
    }
}

impl SelectionPolicy {
    /// Linear price of a fully custom build of `sizing`.
    pub fn custom_price(&self, sizing: &OptimalSizing) -> f64 {
        sizing.pv_kw * 1000.0 * self.custom_pv_cost_per_watt
            + sizing.battery_kwh * self.custom_battery_cost_per_kwh
            + sizing.battery_kw * self.custom_battery_cost_per_kw
    }
}

/// Quality of the chosen kit against the optimal sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitFit {
    Excellent,
    Acceptable,
    CustomRecommended,
    /// The optimal PV size is larger than every candidate kit.
    ExceedsCatalog,
}

/// Outcome of a kit selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitRecommendation {
    pub kit: StandardKit,
    /// Next-smaller kit, for trade-off comparison.
    pub alternative: Option<StandardKit>,
    pub optimal: OptimalSizing,
    /// Signed PV size difference of `kit` relative to optimal (percent).
    /// Negative when the optimal sizing exceeds the catalog.
    pub oversize_pct: f64,
    pub alternative_undersize_pct: Option<f64>,
    pub custom_price: f64,
    /// `kit.base_price - custom_price`.
    pub price_delta: f64,
    pub fit: KitFit,
    pub rationale: Bilingual,
}

impl fmt::Display for KitRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Kit Recommendation ---")?;
        writeln!(f, "Kit:                   {} ({})", self.kit.name.en, self.kit.id)?;
        writeln!(
            f,
            "Optimal sizing:        {:.1} kW PV, {:.1} kWh / {:.1} kW storage",
            self.optimal.pv_kw, self.optimal.battery_kwh, self.optimal.battery_kw
        )?;
        writeln!(f, "Oversize:              {:.1}%", self.oversize_pct)?;
        if let (Some(alt), Some(pct)) = (&self.alternative, self.alternative_undersize_pct) {
            writeln!(f, "Alternative:           {} ({:.1}% under)", alt.id, pct)?;
        }
        writeln!(
            f,
            "Kit price:             ${:.2} (custom ${:.2}, delta ${:.2})",
            self.kit.base_price, self.custom_price, self.price_delta
        )?;
        writeln!(f, "Fit:                   {:?}", self.fit)?;
        writeln!(f, "EN: {}", self.rationale.en)?;
        write!(f, "FR: {}", self.rationale.fr)
    }
}

fn pct_of(delta_kw: f64, optimal_kw: f64) -> f64 {
    if optimal_kw > 0.0 {
        delta_kw / optimal_kw * 100.0
    } else {
        0.0
    }
}

/// Picks a standard kit for `optimal` under `policy`.
///
/// # Errors
///
/// Returns [`EconError::EmptyCatalog`] for an empty catalog and
/// [`EconError::NoMatchingKit`] when no kit matches the storage requirement.
pub fn recommend_kit(
    catalog: &KitCatalog,
    optimal: &OptimalSizing,
    policy: &SelectionPolicy,
) -> Result<KitRecommendation, EconError> {
    if catalog.is_empty() {
        return Err(EconError::EmptyCatalog);
    }
    let with_storage = optimal.wants_storage();
    let mut candidates: Vec<&StandardKit> = catalog
        .iter()
        .filter(|k| k.has_storage() == with_storage)
        .collect();
    if candidates.is_empty() {
        return Err(EconError::NoMatchingKit { with_storage });
    }
    candidates.sort_by(|a, b| a.pv_kw.total_cmp(&b.pv_kw));

    let largest = candidates.len() - 1;
    let exceeds_catalog = optimal.pv_kw > candidates[largest].pv_kw;
    let chosen = match policy.strategy {
        SelectionStrategy::PreferOversize => candidates
            .iter()
            .position(|k| k.pv_kw >= optimal.pv_kw)
            .unwrap_or(largest),
        SelectionStrategy::Nearest => {
            let mut best = 0;
            for (i, k) in candidates.iter().enumerate() {
                let distance = (k.pv_kw - optimal.pv_kw).abs();
                if distance < (candidates[best].pv_kw - optimal.pv_kw).abs() {
                    best = i;
                }
            }
            best
        }
    };
    let kit = candidates[chosen];
    let alternative = (policy.include_alternative && chosen > 0).then(|| candidates[chosen - 1]);

    let oversize_pct = pct_of(kit.pv_kw - optimal.pv_kw, optimal.pv_kw);
    let alternative_undersize_pct =
        alternative.map(|alt| pct_of(optimal.pv_kw - alt.pv_kw, optimal.pv_kw));
    let custom_price = policy.custom_price(optimal);

    let fit = if exceeds_catalog {
        KitFit::ExceedsCatalog
    } else if oversize_pct.abs() <= EXCELLENT_MATCH_PCT {
        KitFit::Excellent
    } else if oversize_pct.abs() <= policy.max_oversize_pct {
        KitFit::Acceptable
    } else {
        KitFit::CustomRecommended
    };

    debug!(kit = %kit.id, oversize_pct, ?fit, "kit selected");

    Ok(KitRecommendation {
        rationale: rationale(fit, kit, optimal, oversize_pct),
        kit: kit.clone(),
        alternative: alternative.cloned(),
        optimal: *optimal,
        oversize_pct,
        alternative_undersize_pct,
        custom_price,
        price_delta: kit.base_price - custom_price,
        fit,
    })
}

fn rationale(
    fit: KitFit,
    kit: &StandardKit,
    optimal: &OptimalSizing,
    oversize_pct: f64,
) -> Bilingual {
    let pct = oversize_pct.abs();
    let opt = optimal.pv_kw;
    match fit {
        KitFit::Excellent => Bilingual::new(
            format!(
                "Excellent choix : {} est à {pct:.1} % du dimensionnement optimal de {opt:.1} kW.",
                kit.name.fr
            ),
            format!(
                "Excellent match: {} is within {pct:.1}% of the optimal {opt:.1} kW sizing.",
                kit.name.en
            ),
        ),
        KitFit::Acceptable => Bilingual::new(
            format!(
                "{} s'écarte de {pct:.1} % du dimensionnement optimal de {opt:.1} kW, une marge de croissance acceptable.",
                kit.name.fr
            ),
            format!(
                "{} differs from the optimal {opt:.1} kW sizing by {pct:.1}%, acceptable headroom for growth.",
                kit.name.en
            ),
        ),
        KitFit::CustomRecommended => Bilingual::new(
            format!(
                "{} s'écarte de {pct:.1} % du dimensionnement optimal de {opt:.1} kW ; une solution sur mesure est recommandée.",
                kit.name.fr
            ),
            format!(
                "{} differs from the optimal {opt:.1} kW sizing by {pct:.1}%; we recommend a custom solution instead.",
                kit.name.en
            ),
        ),
        KitFit::ExceedsCatalog => Bilingual::new(
            format!(
                "Le dimensionnement optimal de {opt:.1} kW dépasse le plus grand ensemble standard ({}) ; une solution sur mesure est recommandée.",
                kit.name.fr
            ),
            format!(
                "The optimal {opt:.1} kW sizing exceeds the largest standard kit ({}); we recommend a custom solution instead.",
                kit.name.en
            ),
        ),
    }
}

//! Fixed utility tariff rates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Commercial rate codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TariffCode {
    /// Small power: no demand charge.
    G,
    /// Medium power.
    M,
    /// Large power.
    L,
}

/// Rate snapshot applied to an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TariffRates {
    pub code: TariffCode,
    /// Monthly demand charge ($/kW).
    pub demand_rate: f64,
    /// Energy charge ($/kWh).
    pub energy_rate: f64,
}

impl TariffCode {
    /// Looks up the fixed rates for this code.
    pub fn rates(self) -> TariffRates {
        let (demand_rate, energy_rate) = match self {
            TariffCode::G => (0.0, 0.11933),
            TariffCode::M => (17.573, 0.06061),
            TariffCode::L => (14.025, 0.03590),
        };
        TariffRates {
            code: self,
            demand_rate,
            energy_rate,
        }
    }
}

impl fmt::Display for TariffCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TariffCode::G => "G",
            TariffCode::M => "M",
            TariffCode::L => "L",
        };
        f.write_str(s)
    }
}

impl FromStr for TariffCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "G" => Ok(TariffCode::G),
            "M" => Ok(TariffCode::M),
            "L" => Ok(TariffCode::L),
            other => Err(format!("unknown tariff code \"{other}\", expected G, M or L")),
        }
    }
}

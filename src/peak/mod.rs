pub mod analyzer;
pub mod meter;
pub mod profile;
pub mod tariff;

pub use analyzer::{
    MonthlyPeakStats, Peak, PeakShavingConfig, PeakShavingResult, analyze_peak_shaving,
};
pub use meter::{Granularity, MeterReading};
pub use profile::{ProfilePoint, SolarProfile};
pub use tariff::{TariffCode, TariffRates};

//! Monte Carlo wrapper turning point assumptions into outcome distributions.

/// Seeded and OS-seeded random sources.
pub mod random;
pub mod sampling;
pub mod simulator;
/// Nearest-rank percentile summaries.
pub mod stats;

pub use random::{EntropySource, Lcg, RandomSource};
pub use sampling::{SampledVariables, VariableRange, VariableRanges};
pub use simulator::{
    IterationOutcome, MonteCarloConfig, MonteCarloResult, MonteCarloSimulator, evaluate_sample,
};
pub use stats::FinancialSummary;

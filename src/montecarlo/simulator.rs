//! Monte Carlo driver around a [`ScenarioModel`].

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EconError;
use crate::finance::scenario::ScenarioModel;
use crate::finance::types::{EconomicAssumptions, ScenarioResult, SiteScenarioParams};

use super::random::{RandomSource, source_for_seed};
use super::sampling::{SampledVariables, VariableRanges};
use super::stats::{FinancialSummary, sorted};

/// Monte Carlo run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonteCarloConfig {
    /// Number of iterations (must be > 0).
    pub iterations: usize,
    /// Ranges of the sampled variables.
    pub ranges: VariableRanges,
    /// Seed for a reproducible run; unseeded runs draw from the OS.
    pub seed: Option<u64>,
    /// Worker threads used to evaluate samples (1 = inline).
    pub workers: usize,
    /// Wall-clock budget; iterations not started in time are skipped.
    pub time_budget_ms: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 500,
            ranges: VariableRanges::default(),
            seed: None,
            workers: 1,
            time_budget_ms: None,
        }
    }
}

impl MonteCarloConfig {
    /// Checks the iteration count and every range.
    pub fn validate(&self) -> Result<(), EconError> {
        if self.iterations == 0 {
            return Err(EconError::InvalidIterations);
        }
        self.ranges.validate()
    }
}

/// Successful evaluation of one sample.
#[derive(Debug, Clone, Serialize)]
pub struct IterationOutcome {
    pub index: usize,
    pub sample: SampledVariables,
    pub payback_years: f64,
    pub total_cashflow: f64,
    pub result: ScenarioResult,
}

/// Evaluates one sample: a stateless unit of work.
///
/// Builds an independent assumption set from `base` and `sample`, then runs
/// the model. Safe to call concurrently from any number of threads.
pub fn evaluate_sample<M: ScenarioModel + ?Sized>(
    model: &M,
    site: &SiteScenarioParams,
    base: &EconomicAssumptions,
    index: usize,
    sample: &SampledVariables,
) -> Result<IterationOutcome, EconError> {
    let assumptions = sample.apply_to(base);
    let result = model.evaluate(site, &assumptions)?;
    Ok(IterationOutcome {
        index,
        sample: *sample,
        payback_years: result.payback_years,
        total_cashflow: result.total_cashflow,
        result,
    })
}

/// Per-iteration status before aggregation.
#[derive(Debug)]
enum Evaluation {
    Done(Result<IterationOutcome, EconError>),
    Skipped,
}

/// P10/P50/P90/mean for every aggregated metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricSummaries {
    pub npv10: FinancialSummary,
    pub npv20: FinancialSummary,
    pub npv25: FinancialSummary,
    pub irr10: FinancialSummary,
    pub irr20: FinancialSummary,
    pub irr25: FinancialSummary,
    pub payback_years: FinancialSummary,
    pub net_capex: FinancialSummary,
    pub total_cashflow: FinancialSummary,
}

/// Sorted outcome distributions for charting.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Distributions {
    pub npv25: Vec<f64>,
    pub irr25: Vec<f64>,
    pub payback_years: Vec<f64>,
}

/// Aggregated Monte Carlo outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloResult {
    pub summaries: MetricSummaries,
    pub iterations_requested: usize,
    pub successful_iterations: usize,
    pub failed_iterations: usize,
    /// Iterations never started because the time budget ran out.
    pub skipped_iterations: usize,
    pub distributions: Distributions,
    /// Ranges the run sampled from.
    pub ranges: VariableRanges,
    pub seed: Option<u64>,
}

impl MonteCarloResult {
    fn aggregate(outcomes: &[IterationOutcome], config: &MonteCarloConfig) -> Self {
        let collect = |f: &dyn Fn(&IterationOutcome) -> f64| -> Vec<f64> {
            sorted(&outcomes.iter().map(f).collect::<Vec<_>>())
        };
        let npv25 = collect(&|o| o.result.npv.year25);
        let irr25 = collect(&|o| o.result.irr.year25);
        let payback_years = collect(&|o| o.payback_years);

        let summaries = MetricSummaries {
            npv10: FinancialSummary::from_sorted(&collect(&|o| o.result.npv.year10)),
            npv20: FinancialSummary::from_sorted(&collect(&|o| o.result.npv.year20)),
            npv25: FinancialSummary::from_sorted(&npv25),
            irr10: FinancialSummary::from_sorted(&collect(&|o| o.result.irr.year10)),
            irr20: FinancialSummary::from_sorted(&collect(&|o| o.result.irr.year20)),
            irr25: FinancialSummary::from_sorted(&irr25),
            payback_years: FinancialSummary::from_sorted(&payback_years),
            net_capex: FinancialSummary::from_sorted(&collect(&|o| o.result.net_capex)),
            total_cashflow: FinancialSummary::from_sorted(&collect(&|o| o.total_cashflow)),
        };

        Self {
            summaries,
            iterations_requested: config.iterations,
            successful_iterations: outcomes.len(),
            failed_iterations: 0,
            skipped_iterations: 0,
            distributions: Distributions {
                npv25,
                irr25,
                payback_years,
            },
            ranges: config.ranges,
            seed: config.seed,
        }
    }
}

impl fmt::Display for MonteCarloResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summaries;
        writeln!(f, "--- Monte Carlo Report ---")?;
        writeln!(
            f,
            "Iterations:            {} ok / {} requested ({} failed, {} skipped)",
            self.successful_iterations,
            self.iterations_requested,
            self.failed_iterations,
            self.skipped_iterations
        )?;
        writeln!(
            f,
            "NPV25 P10/P50/P90:     ${:.2} / ${:.2} / ${:.2}",
            s.npv25.p10, s.npv25.p50, s.npv25.p90
        )?;
        writeln!(
            f,
            "IRR25 P10/P50/P90:     {:.2}% / {:.2}% / {:.2}%",
            s.irr25.p10 * 100.0,
            s.irr25.p50 * 100.0,
            s.irr25.p90 * 100.0
        )?;
        writeln!(
            f,
            "Payback P10/P50/P90:   {:.2} / {:.2} / {:.2} years",
            s.payback_years.p10, s.payback_years.p50, s.payback_years.p90
        )?;
        write!(f, "Net CAPEX mean:        ${:.2}", s.net_capex.mean)
    }
}

/// Repeatedly drives a scenario model under sampled assumptions.
#[derive(Debug, Clone)]
pub struct MonteCarloSimulator<M> {
    model: M,
}

impl<M: ScenarioModel + Sync> MonteCarloSimulator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Runs the simulation with the random source implied by `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid config, or when no iteration succeeds.
    pub fn run(
        &self,
        site: &SiteScenarioParams,
        base: &EconomicAssumptions,
        config: &MonteCarloConfig,
    ) -> Result<MonteCarloResult, EconError> {
        let mut source = source_for_seed(config.seed);
        self.run_with_source(site, base, config, source.as_mut())
    }

    /// Runs the simulation drawing every sample from `source`.
    ///
    /// All samples are drawn up front, in iteration order, so a seeded run
    /// produces the same result whatever the worker count.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid config, or when no iteration succeeds.
    pub fn run_with_source(
        &self,
        site: &SiteScenarioParams,
        base: &EconomicAssumptions,
        config: &MonteCarloConfig,
        source: &mut dyn RandomSource,
    ) -> Result<MonteCarloResult, EconError> {
        config.validate()?;
        let started = Instant::now();
        let deadline = config
            .time_budget_ms
            .map(|ms| started + Duration::from_millis(ms));

        let samples: Vec<SampledVariables> = (0..config.iterations)
            .map(|_| config.ranges.sample(source))
            .collect();
        let evaluations = self.evaluate_all(site, base, &samples, config.workers, deadline);

        let mut outcomes = Vec::with_capacity(evaluations.len());
        let mut failed = 0;
        let mut skipped = 0;
        for (index, evaluation) in evaluations.into_iter().enumerate() {
            match evaluation {
                Evaluation::Done(Ok(outcome)) => outcomes.push(outcome),
                Evaluation::Done(Err(err)) => {
                    warn!(
                        iteration = index,
                        error = %err,
                        "monte carlo iteration failed, skipping"
                    );
                    failed += 1;
                }
                Evaluation::Skipped => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "monte carlo time budget exhausted");
        }

        if outcomes.is_empty() {
            return Err(EconError::NoSuccessfulIterations {
                attempted: config.iterations,
                failed,
            });
        }

        let mut result = MonteCarloResult::aggregate(&outcomes, config);
        result.failed_iterations = failed;
        result.skipped_iterations = skipped;

        info!(
            requested = config.iterations,
            succeeded = result.successful_iterations,
            failed,
            skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "monte carlo run complete"
        );
        Ok(result)
    }

    fn evaluate_one(
        &self,
        site: &SiteScenarioParams,
        base: &EconomicAssumptions,
        index: usize,
        sample: &SampledVariables,
        deadline: Option<Instant>,
    ) -> Evaluation {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Evaluation::Skipped;
        }
        Evaluation::Done(evaluate_sample(&self.model, site, base, index, sample))
    }

    fn evaluate_all(
        &self,
        site: &SiteScenarioParams,
        base: &EconomicAssumptions,
        samples: &[SampledVariables],
        workers: usize,
        deadline: Option<Instant>,
    ) -> Vec<Evaluation> {
        if workers <= 1 || samples.len() < 2 {
            return samples
                .iter()
                .enumerate()
                .map(|(i, s)| self.evaluate_one(site, base, i, s, deadline))
                .collect();
        }

        let chunk_len = samples.len().div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = samples
                .chunks(chunk_len)
                .enumerate()
                .map(|(chunk, part)| {
                    scope.spawn(move || {
                        part.iter()
                            .enumerate()
                            .map(|(j, s)| {
                                self.evaluate_one(site, base, chunk * chunk_len + j, s, deadline)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }
}

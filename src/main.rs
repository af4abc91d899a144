//! solar-econ entry point: CLI wiring and config-driven analysis runs.

use std::path::Path;
use std::process;

use serde::Serialize;
use tracing::info;

use solar_econ::cli::{self, CliOptions, Mode};
use solar_econ::config::AnalysisConfig;
use solar_econ::finance::{CashflowModel, ScenarioResult, StorageParams, run_scenario};
use solar_econ::io::export::{export_cashflow_csv, export_distribution_csv, write_json};
use solar_econ::io::meter_csv::read_meter_csv_file;
use solar_econ::kits::{KitCatalog, KitRecommendation, recommend_kit};
use solar_econ::logging::init_tracing;
use solar_econ::montecarlo::{MonteCarloResult, MonteCarloSimulator};
use solar_econ::peak::{PeakShavingResult, analyze_peak_shaving};

/// Everything produced by one invocation, printed as a single JSON object.
#[derive(Default, Serialize)]
struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    peak_shaving: Option<PeakShavingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<ScenarioResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monte_carlo: Option<MonteCarloResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<KitRecommendation>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn load_config(opts: &CliOptions) -> AnalysisConfig {
    let loaded = match (&opts.scenario, &opts.preset) {
        (Some(path), _) => AnalysisConfig::from_toml_file(path),
        (None, Some(name)) => AnalysisConfig::from_preset(name),
        (None, None) => Ok(AnalysisConfig::baseline()),
    };
    let mut cfg = loaded.unwrap_or_else(|e| fail(e));

    if let Some(seed) = opts.seed {
        cfg.monte_carlo.seed = Some(seed);
    }
    if let Some(iterations) = opts.iterations {
        cfg.monte_carlo.iterations = iterations;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

fn load_catalog(path: Option<&Path>) -> KitCatalog {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read \"{}\": {e}", path.display()))
            .and_then(|s| KitCatalog::from_toml_str(&s).map_err(|e| e.to_string()))
            .unwrap_or_else(|e| fail(e)),
        None => KitCatalog::standard(),
    }
}

fn main() {
    let opts = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(2);
    });
    init_tracing(opts.verbosity);

    let cfg = load_config(&opts);
    let mode = opts.mode;
    let mut report = Report::default();
    let mut site = cfg.site;

    let wants_peak =
        matches!(mode, Mode::PeakShaving) || (mode == Mode::All && opts.meter.is_some());
    if wants_peak {
        let Some(meter) = opts.meter.as_deref() else {
            fail("peak shaving requires --meter <csv>");
        };
        let readings = read_meter_csv_file(meter).unwrap_or_else(|e| fail(e));
        info!(readings = readings.len(), path = %meter.display(), "meter data loaded");
        let result = analyze_peak_shaving(&readings, &cfg.peak_shaving);
        if mode == Mode::All && result.recommended_battery_kw > 0.0 && site.storage.is_none() {
            site.storage = Some(StorageParams::from_peak_shaving(&result));
        }
        report.peak_shaving = Some(result);
    }

    if matches!(mode, Mode::Scenario | Mode::All) {
        let result = run_scenario(&site, &cfg.assumptions);
        if let Some(path) = opts.cashflow_out.as_deref() {
            export_cashflow_csv(&result.cashflows, path).unwrap_or_else(|e| fail(e));
            info!(path = %path.display(), "cashflow exported");
        }
        report.scenario = Some(result);
    }

    if matches!(mode, Mode::MonteCarlo | Mode::All) {
        let simulator = MonteCarloSimulator::new(CashflowModel);
        let result = simulator
            .run(&site, &cfg.assumptions, &cfg.monte_carlo)
            .unwrap_or_else(|e| fail(e));
        if let Some(path) = opts.distribution_out.as_deref() {
            export_distribution_csv(&result, path).unwrap_or_else(|e| fail(e));
            info!(path = %path.display(), "distributions exported");
        }
        report.monte_carlo = Some(result);
    }

    if matches!(mode, Mode::Recommend | Mode::All) {
        let catalog = load_catalog(opts.catalog.as_deref());
        let result = recommend_kit(&catalog, &cfg.optimal_sizing(), &cfg.kit_policy)
            .unwrap_or_else(|e| fail(e));
        report.recommendation = Some(result);
    }

    if opts.json {
        write_json(&report, std::io::stdout().lock()).unwrap_or_else(|e| fail(e));
        return;
    }

    let sections: [Option<&dyn std::fmt::Display>; 4] = [
        report.peak_shaving.as_ref().map(|r| r as &dyn std::fmt::Display),
        report.scenario.as_ref().map(|r| r as &dyn std::fmt::Display),
        report.monte_carlo.as_ref().map(|r| r as &dyn std::fmt::Display),
        report.recommendation.as_ref().map(|r| r as &dyn std::fmt::Display),
    ];
    for section in sections.into_iter().flatten() {
        println!("{section}");
        println!();
    }
}

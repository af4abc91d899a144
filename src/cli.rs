use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which analyses the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Scenario,
    MonteCarlo,
    PeakShaving,
    Recommend,
    All,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scenario" => Ok(Mode::Scenario),
            "monte-carlo" => Ok(Mode::MonteCarlo),
            "peak-shaving" => Ok(Mode::PeakShaving),
            "recommend" => Ok(Mode::Recommend),
            "all" => Ok(Mode::All),
            other => Err(format!(
                "unknown mode \"{other}\", expected scenario, monte-carlo, peak-shaving, recommend or all"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Scenario => "scenario",
            Mode::MonteCarlo => "monte-carlo",
            Mode::PeakShaving => "peak-shaving",
            Mode::Recommend => "recommend",
            Mode::All => "all",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub mode: Mode,
    pub meter: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub seed: Option<u64>,
    pub iterations: Option<usize>,
    pub cashflow_out: Option<PathBuf>,
    pub distribution_out: Option<PathBuf>,
    pub json: bool,
    pub verbosity: u8,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --scenario (expected a TOML file path)",
                )?;
                if opts.scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(
                    i,
                    "missing value for --preset (expected a preset name)",
                )?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--mode" => {
                i += 1;
                opts.mode = args.next_or_err(i, "missing value for --mode")?.parse()?;
            }
            "--meter" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --meter (expected a CSV file path)",
                )?;
                opts.meter = Some(PathBuf::from(path));
            }
            "--catalog" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --catalog (expected a TOML file path)",
                )?;
                opts.catalog = Some(PathBuf::from(path));
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                opts.seed = Some(seed);
            }
            "--iterations" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --iterations (expected a count)")?;
                let n = raw
                    .parse::<usize>()
                    .map_err(|_| format!("--iterations value \"{raw}\" is not a valid count"))?;
                opts.iterations = Some(n);
            }
            "--cashflow-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --cashflow-out (expected a file path)",
                )?;
                opts.cashflow_out = Some(PathBuf::from(path));
            }
            "--distribution-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --distribution-out (expected a file path)",
                )?;
                opts.distribution_out = Some(PathBuf::from(path));
            }
            "--json" => opts.json = true,
            "-v" | "--verbose" => opts.verbosity = opts.verbosity.saturating_add(1),
            "-vv" => opts.verbosity = opts.verbosity.saturating_add(2),
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if opts.mode == Mode::PeakShaving && opts.meter.is_none() {
        return Err("--mode peak-shaving requires --meter <csv>".to_string());
    }

    if opts.scenario.is_none() && opts.preset.is_none() {
        opts.preset = Some("baseline".to_string());
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("solar-econ: solar and storage financial analysis");
    eprintln!();
    eprintln!("Usage: solar-econ [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>          Load analysis config from a TOML file");
    eprintln!("  --preset <name>            Use a built-in preset");
    eprintln!("                             (baseline, residential, large_commercial)");
    eprintln!(
        "  --mode <mode>              scenario | monte-carlo | peak-shaving | recommend | all"
    );
    eprintln!("  --meter <path>             Interval meter CSV for peak shaving");
    eprintln!("  --catalog <path>           Replace the built-in kit catalog (TOML)");
    eprintln!("  --seed <u64>               Seed the Monte Carlo run");
    eprintln!("  --iterations <n>           Override the Monte Carlo iteration count");
    eprintln!("  --cashflow-out <path>      Export the scenario cashflow series to CSV");
    eprintln!("  --distribution-out <path>  Export Monte Carlo distributions to CSV");
    eprintln!("  --json                     Print results as JSON instead of text");
    eprintln!("  -v                         Increase log verbosity (repeatable)");
    eprintln!("  --help                     Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

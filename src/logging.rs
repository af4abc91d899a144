//! Tracing subscriber setup for the command-line binary.

use tracing_subscriber::fmt;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "solar_econ=info";

/// Maps the `-v` count to a filter directive.
pub fn filter_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_FILTER,
        1 => "solar_econ=debug",
        _ => "solar_econ=trace",
    }
}

/// Installs a stderr subscriber; stdout is reserved for reports.
///
/// `RUST_LOG` takes precedence over `verbosity`. Calling this twice is a
/// no-op.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

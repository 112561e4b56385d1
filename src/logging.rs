//! `tracing` subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for `--format json|csv` output.
//! `RUST_LOG` takes precedence over the configured `logging.level`.

use tracing_subscriber::EnvFilter;

use crate::config::schema::LoggingConfig;

/// Build the filter: `RUST_LOG` if set and valid, else the configured level,
/// else `warn`.
pub fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(config))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Logging utilities
//!
//! Initialises the global `tracing` subscriber for the binary.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. `verbose` forces
/// `debug` when no `RUST_LOG` is set.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    // try_init: a second initialisation (tests, embedded use) is not an error
    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

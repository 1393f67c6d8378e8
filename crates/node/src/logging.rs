//! Logging setup for the node.

use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Build the log filter.
///
/// Starts from `RUST_LOG` if set, otherwise the configured level, then adds
/// each directive from the configured filter. Unparseable directives are
/// skipped.
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if let Some(custom) = &config.filter {
        for directive in custom.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .without_time()
        .try_init()
        .map_err(|err| eyre::eyre!("failed to install tracing subscriber: {err}"))
}

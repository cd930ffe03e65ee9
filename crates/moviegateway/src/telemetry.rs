//! Process-wide logging setup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

const DEFAULT_FILTER: &str = "info";

/// Build the filter: `RUST_LOG` wins, then the configured directives, then `info`.
pub fn filter(config: &LoggingConfig) -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		config
			.filter
			.as_deref()
			.and_then(|directives| EnvFilter::try_new(directives).ok())
			.unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
	})
}

/// Install the global subscriber. Returns false if one was already installed.
pub fn init(config: &LoggingConfig) -> bool {
	let builder = tracing_subscriber::fmt().with_env_filter(filter(config));
	let installed = match config.format {
		LogFormat::Text => builder.with_target(false).compact().try_init(),
		LogFormat::Json => builder.json().flatten_event(true).try_init(),
	};
	installed.is_ok()
}

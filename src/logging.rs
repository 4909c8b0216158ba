//! Logging System
//!
//! Opt-in `tracing` subscriber initialization for binaries and test
//! harnesses that drive the orchestrator. The library itself never installs
//! a subscriber; it only emits through the sink capability.

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::ConfigError;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
        }
    }
}

/// Initialize the logging system.
///
/// The `SAGA_LOG` environment variable takes priority over the config; it
/// accepts any `tracing_subscriber` filter directive.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ConfigError> {
    let filter = build_env_filter(config)?;
    let format = config.map(|c| c.format.as_str()).unwrap_or("text");

    let base = Registry::default().with(filter);

    match format {
        "json" => {
            base.with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339()),
            )
            .init();
        }
        "text" => {
            base.with(fmt::layer().with_target(true).with_timer(ChronoUtc::rfc_3339()))
                .init();
        }
        other => return Err(ConfigError::InvalidFormat(other.to_string())),
    }

    Ok(())
}

fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env("SAGA_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    level
        .parse::<crate::sink::Level>()
        .map_err(|_| ConfigError::InvalidDirective(level.to_string()))?;

    // `tracing` has no fatal level; the sink maps it onto error.
    let directive = if level == "fatal" { "error" } else { level };
    Ok(EnvFilter::new(directive))
}

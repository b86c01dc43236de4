//! Logging setup for applications embedding the authentication engine
//!
//! The engine itself only emits `tracing` events under the `rvoip_sip_auth`
//! target. Applications that do not already install a subscriber can use
//! [`setup_logging`], which scopes the default filter to that target so a
//! host's own crates stay quiet unless `RUST_LOG` says otherwise.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{AuthError, Result};

/// Target prefix of every event this crate emits
pub const LOG_TARGET: &str = "rvoip_sip_auth";

/// Subscriber options, loadable from a `[logging]` TOML table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the engine's events (`trace` .. `error`)
    pub level: String,
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
    /// Include file and line of the emitting call site
    pub file_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingConfig {
    pub fn new(level: Level) -> Self {
        LoggingConfig {
            level: level.to_string(),
            json: false,
            file_info: false,
        }
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Filter used when `RUST_LOG` is unset
    fn default_filter(&self) -> Result<EnvFilter> {
        let level: Level = self
            .level
            .parse()
            .map_err(|_| AuthError::config(format!("Invalid log level: {}", self.level)))?;
        Ok(EnvFilter::new(format!("{}={}", LOG_TARGET, level)))
    }
}

/// Install a global subscriber for the provided configuration
///
/// `RUST_LOG` overrides the configured level. Fails with
/// [`AuthError::Config`] for an unknown level or when a global subscriber is
/// already set.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let default_filter = config.default_filter()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or(default_filter);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| AuthError::config(format!("Failed to install subscriber: {}", e)))
}

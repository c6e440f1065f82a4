//! Tracing subscriber bootstrap
//!
//! Libraries only emit events; binaries call [`init_tracing`] once at
//! startup to decide where those events go.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "autoscope_engine=info,warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TelemetryConfig {
    /// Environment variables:
    /// - `AUTOSCOPE_LOG`: fallback filter directive (default: `autoscope_engine=info,warn`)
    /// - `AUTOSCOPE_LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            filter: std::env::var("AUTOSCOPE_LOG").unwrap_or(defaults.filter),
            format: match std::env::var("AUTOSCOPE_LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => defaults.format,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to init subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Fails if a global subscriber
/// is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: config.filter.clone(),
            reason: e.to_string(),
        })?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }

    tracing::debug!(filter = %config.filter, format = ?config.format, "Telemetry initialized");
    Ok(())
}

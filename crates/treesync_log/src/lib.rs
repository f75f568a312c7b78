//! `treesync_log`:
//! Process-wide `tracing` subscriber setup for hosts of the copy engine.
//!
//! Events go to stderr. `RUST_LOG`, when set and valid, overrides the
//! configured level.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output encoding of log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLogFormat {
    /// Human-readable single-line events.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl EnumLogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for EnumLogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumLogFormat {
    type Err = LogInitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(LogInitError::InvalidFormat(value.to_string())),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct SpecLogOptions {
    /// Default filter directive, e.g. `info` or `treesync_fs=debug`.
    pub level: String,
    pub format: EnumLogFormat,
}

impl Default for SpecLogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: EnumLogFormat::Text,
        }
    }
}

#[derive(Debug, Error)]
pub enum LogInitError {
    /// Unknown output format name.
    #[error("Invalid `format`: {0}. Expected one of: text, json.")]
    InvalidFormat(String),
    /// Level is not a valid filter directive.
    #[error("Invalid `level` directive `{directive}`: {reason}")]
    InvalidLevel { directive: String, reason: String },
    /// A global subscriber is already installed.
    #[error("Logging is already initialized")]
    AlreadyInitialized,
}

/// Build the filter: `RUST_LOG` when usable, otherwise `level`.
pub fn build_env_filter(level: &str) -> Result<EnvFilter, LogInitError> {
    if let Ok(filter_env) = EnvFilter::try_from_default_env() {
        return Ok(filter_env);
    }
    EnvFilter::try_new(level).map_err(|e| LogInitError::InvalidLevel {
        directive: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(spec_log_options: &SpecLogOptions) -> Result<(), LogInitError> {
    let filter = build_env_filter(&spec_log_options.level)?;

    let layer_text = (spec_log_options.format == EnumLogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
    });
    let layer_json = (spec_log_options.format == EnumLogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(layer_text)
        .with(layer_json)
        .try_init()
        .map_err(|_| LogInitError::AlreadyInitialized)?;

    tracing::debug!(
        level = %spec_log_options.level,
        format = %spec_log_options.format,
        "Logging initialized"
    );
    Ok(())
}

//! Error types for configuration loading and report export.
//!
//! Everything past configuration reports status values instead of errors:
//! scene setup yields a [`SetupStatus`](crate::main_loop::SetupStatus),
//! validation yields a [`ValidationResult`](crate::scene::ValidationResult),
//! and telemetry reads degrade to stale values.

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
}

/// Errors that can occur while writing a run report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

//! Telemetry error types.

use thiserror::Error;

/// Errors raised while configuring logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The logging configuration is invalid.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A global subscriber could not be installed.
    #[error("initialization error: {0}")]
    InitError(String),

    /// The log file or its directory could not be prepared.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

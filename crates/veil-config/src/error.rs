use std::io;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A config file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file at {path}: {source}")]
    ParseError {
        /// Path to the file, or `<embedded defaults>` / `<merged config>`.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range.
    #[error("invalid value for '{field}': {message}")]
    ValidationError {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A `VEIL_*` variable could not be applied.
    #[error("environment variable '{var_name}': {message}")]
    EnvError {
        /// Variable name.
        var_name: String,
        /// What is wrong with it.
        message: String,
    },

    /// The user's home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

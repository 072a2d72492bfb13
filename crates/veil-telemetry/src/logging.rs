//! Logging configuration and setup.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-readable output.
    Pretty,
    /// Single-line output (default).
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
    /// Default `tracing-subscriber` output with every field.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log format '{other}' (expected pretty, compact, json or full)"
            ))),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error (default). Keeps command output on stdout clean.
    #[default]
    Stderr,
    /// Append to a single file. Parent directories are created.
    File(PathBuf),
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Base level or filter expression, e.g. `"warn"` or `"veil_crypto=debug"`.
    pub level: String,
    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
    /// Destination.
    #[serde(default)]
    pub target: LogTarget,
    /// Extra per-target directives layered on top of `level`.
    #[serde(default)]
    pub directives: Vec<String>,
    /// Colored output. Ignored for file targets.
    #[serde(default = "default_true")]
    pub ansi: bool,
    /// Prefix lines with a timestamp.
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
            ansi: true,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Create a configuration at the given level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Set the line format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the destination.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Add a filter directive such as `"veil_crypto::cipher=trace"`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Drop timestamps from each line.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Disable colors.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    /// Build the event filter from `level` and `directives`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::ConfigError`] if any part fails to parse.
    pub fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(e.to_string())
                },
            )?);
        }

        Ok(filter)
    }

    fn layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let base = fmt::layer().with_writer(writer).with_ansi(ansi);
        match (self.format, self.timestamps) {
            (LogFormat::Pretty, true) => base.pretty().boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
            (LogFormat::Json, true) => base.json().boxed(),
            (LogFormat::Json, false) => base.json().without_time().boxed(),
            (LogFormat::Full, true) => base.boxed(),
            (LogFormat::Full, false) => base.without_time().boxed(),
        }
    }
}

/// Install a global subscriber for `config`.
///
/// # Errors
///
/// Fails if the filter does not parse, the log file cannot be prepared, or a
/// global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;

    let layer = match &config.target {
        LogTarget::Stdout => config.layer(std::io::stdout, config.ansi),
        LogTarget::Stderr => config.layer(std::io::stderr, config.ansi),
        LogTarget::File(path) => {
            let file_name = path.file_name().ok_or_else(|| {
                TelemetryError::ConfigError(format!(
                    "log path has no file name: {}",
                    path.display()
                ))
            })?;
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&directory)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name.to_string_lossy())
                .build(&directory)
                .map_err(|e| TelemetryError::InitError(e.to_string()))?;
            config.layer(appender, false)
        },
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.timestamps);
        assert!(config.ansi);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new("debug")
            .with_format(LogFormat::Json)
            .with_target(LogTarget::Stdout)
            .without_timestamps()
            .without_ansi()
            .with_directive("veil_crypto=trace");

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.target, LogTarget::Stdout);
        assert!(!config.timestamps);
        assert!(!config.ansi);
        assert_eq!(config.directives, vec!["veil_crypto=trace"]);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("Full".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert!(matches!(
            "fancy".parse::<LogFormat>(),
            Err(TelemetryError::ConfigError(_))
        ));
    }

    #[test]
    fn test_log_config_serialization() {
        let config = LogConfig::new("info").with_format(LogFormat::Pretty);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"level\":\"info\""));
        assert!(json.contains("\"format\":\"pretty\""));

        let parsed: LogConfig = serde_json::from_str(r#"{"level":"error"}"#).unwrap();
        assert_eq!(parsed.level, "error");
        assert_eq!(parsed.format, LogFormat::Compact);
        assert!(parsed.ansi);
    }

    #[test]
    fn test_build_filter() {
        let config = LogConfig::new("debug").with_directive("veil=trace");
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn test_build_filter_invalid() {
        let config = LogConfig::new("debug").with_directive("[invalid=syntax");
        assert!(matches!(
            config.build_filter(),
            Err(TelemetryError::ConfigError(_))
        ));
    }

    #[test]
    fn test_file_target_without_name_rejected() {
        let config = LogConfig::new("info").with_target(LogTarget::File(PathBuf::from("/")));
        assert!(matches!(
            setup_logging(&config),
            Err(TelemetryError::ConfigError(_))
        ));
    }

    #[test]
    fn test_file_target_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("veil.log");
        let config = LogConfig::new("info").with_target(LogTarget::File(path.clone()));

        setup_logging(&config).unwrap();
        tracing::info!("written");

        assert!(path.parent().unwrap().is_dir());
    }
}

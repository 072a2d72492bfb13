//! Veil Telemetry - logging setup shared by Veil frontends.
//!
//! Wraps `tracing-subscriber` behind a small [`LogConfig`] so a frontend can
//! pick a level, an output format and a destination without touching layers.
//!
//! # Example
//!
//! ```rust,no_run
//! use veil_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! let config = LogConfig::new("info").with_format(LogFormat::Json);
//! setup_logging(&config).unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_logging};

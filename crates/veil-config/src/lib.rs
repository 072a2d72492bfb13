//! Layered configuration for Veil.
//!
//! # Usage
//!
//! ```rust,no_run
//! use veil_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("PBKDF2 iterations: {}", resolved.config.kdf.pbkdf2_iterations);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. A file passed explicitly (`veil --config <FILE>`)
//! 2. `~/.veil/config.toml`
//! 3. `VEIL_*` environment variables, for fields neither file set
//! 4. Embedded `defaults.toml`

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered merging with provenance.
pub mod merge;
pub mod prelude;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use types::*;

impl Config {
    /// Load defaults, the user file, `explicit` and environment fallbacks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer is malformed or the result
    /// fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, None)
    }

    /// [`Config::load`] with `home_dir` standing in for `~/.veil`.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_home(
        explicit: Option<&std::path::Path>,
        home_dir: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, Some(home_dir))
    }
}

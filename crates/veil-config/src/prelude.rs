//! Prelude module - commonly used types for convenient import.
//!
//! Use `use veil_config::prelude::*;` to import all essential types.

// Errors
pub use crate::{ConfigError, ConfigResult};

// Configuration
pub use crate::{
    Config, Encoding, KdfSection, KeygenSection, LoggingSection, OutputSection, ResolvedConfig,
};

// Provenance
pub use crate::merge::ConfigLayer;

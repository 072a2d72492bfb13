//! Configuration types for Veil.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header still produces a working
//! configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level and format.
    pub logging: LoggingSection,
    /// How binary output is printed.
    pub output: OutputSection,
    /// Default KDF cost parameters.
    pub kdf: KdfSection,
    /// Key generation defaults.
    pub keygen: KeygenSection,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputSection
// ---------------------------------------------------------------------------

/// Text encoding for digests, signatures and other binary output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Lowercase hexadecimal.
    #[default]
    Hex,
    /// Standard base64 with padding.
    Base64,
}

impl Encoding {
    /// Parse `"hex"` or `"base64"`, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Some(Self::Hex),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Encoding for binary output.
    pub encoding: Encoding,
}

// ---------------------------------------------------------------------------
// KdfSection
// ---------------------------------------------------------------------------

/// Cost parameters used when a command does not give its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfSection {
    /// PBKDF2 iteration count.
    pub pbkdf2_iterations: u32,
    /// scrypt CPU/memory cost (power of two).
    pub scrypt_n: u64,
    /// scrypt block size.
    pub scrypt_r: u32,
    /// scrypt parallelism.
    pub scrypt_p: u32,
    /// Derived key length in bytes.
    pub output_len: usize,
}

impl Default for KdfSection {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: 100_000,
            scrypt_n: 16_384,
            scrypt_r: 8,
            scrypt_p: 1,
            output_len: 32,
        }
    }
}

impl KdfSection {
    /// Working memory scrypt needs for these parameters, `128 * r * n`.
    ///
    /// `None` if the product overflows.
    #[must_use]
    pub fn scrypt_memory(&self) -> Option<u64> {
        128_u64
            .checked_mul(u64::from(self.scrypt_r))?
            .checked_mul(self.scrypt_n)
    }
}

// ---------------------------------------------------------------------------
// KeygenSection
// ---------------------------------------------------------------------------

/// Key generation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenSection {
    /// Modulus size used for a bare `RSA` algorithm name.
    pub default_rsa_bits: u32,
}

impl Default for KeygenSection {
    fn default() -> Self {
        Self {
            default_rsa_bits: 2048,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_sections_use_defaults() {
        let config: Config = toml::from_str("[kdf]\n[keygen]\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!(Encoding::parse("HEX"), Some(Encoding::Hex));
        assert_eq!(Encoding::parse("base64"), Some(Encoding::Base64));
        assert_eq!(Encoding::parse("base32"), None);
    }

    #[test]
    fn test_encoding_deserializes_lowercase() {
        let config: Config = toml::from_str("[output]\nencoding = \"base64\"\n").unwrap();
        assert_eq!(config.output.encoding, Encoding::Base64);
        assert!(toml::from_str::<Config>("[output]\nencoding = \"Base64\"\n").is_err());
    }

    #[test]
    fn test_scrypt_memory() {
        assert_eq!(KdfSection::default().scrypt_memory(), Some(16_777_216));
        let huge = KdfSection {
            scrypt_n: u64::MAX,
            ..KdfSection::default()
        };
        assert_eq!(huge.scrypt_memory(), None);
    }
}

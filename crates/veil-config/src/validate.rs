//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// RSA modulus sizes the key generator accepts.
pub const RSA_KEY_SIZES: [u32; 4] = [1024, 2048, 3072, 4096];

/// Largest `kdf.output_len` accepted.
const MAX_OUTPUT_LEN: usize = 1024;

/// Largest scrypt working set, `128 * r * n` bytes (1 GiB).
const MAX_SCRYPT_MEMORY: u64 = 1_073_741_824;

/// Validate a merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_logging(config)?;
    validate_kdf(config)?;
    validate_keygen(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

fn validate_kdf(config: &Config) -> ConfigResult<()> {
    let kdf = &config.kdf;

    if kdf.pbkdf2_iterations == 0 {
        return Err(invalid("kdf.pbkdf2_iterations", "must be at least 1"));
    }
    if kdf.scrypt_n <= 1 || !kdf.scrypt_n.is_power_of_two() {
        return Err(invalid(
            "kdf.scrypt_n",
            format!("{} is not a power of two greater than 1", kdf.scrypt_n),
        ));
    }
    if kdf.scrypt_r == 0 {
        return Err(invalid("kdf.scrypt_r", "must be at least 1"));
    }
    if kdf.scrypt_p == 0 {
        return Err(invalid("kdf.scrypt_p", "must be at least 1"));
    }
    match kdf.scrypt_memory() {
        Some(bytes) if bytes <= MAX_SCRYPT_MEMORY => {},
        _ => {
            return Err(invalid(
                "kdf.scrypt_n",
                format!("128 * scrypt_r * scrypt_n exceeds {MAX_SCRYPT_MEMORY} bytes"),
            ));
        },
    }
    if kdf.output_len == 0 || kdf.output_len > MAX_OUTPUT_LEN {
        return Err(invalid(
            "kdf.output_len",
            format!("must be between 1 and {MAX_OUTPUT_LEN}"),
        ));
    }

    Ok(())
}

fn validate_keygen(config: &Config) -> ConfigResult<()> {
    if !RSA_KEY_SIZES.contains(&config.keygen.default_rsa_bits) {
        return Err(invalid(
            "keygen.default_rsa_bits",
            format!(
                "unsupported RSA size {}; expected one of: {:?}",
                config.keygen.default_rsa_bits, RSA_KEY_SIZES
            ),
        ));
    }
    Ok(())
}

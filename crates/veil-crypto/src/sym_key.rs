//! Symmetric keys and their generators.

use std::fmt;

use tracing::debug;
use veil_core::{Blob, CryptoError, CryptoResult, Family, KeySize, crypto_object};

use crate::backend::sym_key::RawKeyGenerator;
use crate::selector::{Accepts, Selector};
use crate::spi::SymKeyGeneratorSpi;

/// Raw symmetric key material.
pub struct SymKey {
    key: Blob,
    algorithm: String,
}

crypto_object!(SymKey, "SymKey");

impl SymKey {
    /// Copy of the raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AllocationFailure`] if the copy cannot be
    /// allocated.
    pub fn get_encoded(&self) -> CryptoResult<Blob> {
        Blob::copy_from(&self.key)
    }

    /// Algorithm the key was made for, e.g. `"AES256"`.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Always `"RAW"`.
    #[must_use]
    pub fn format(&self) -> &'static str {
        "RAW"
    }

    /// Zero and drop the key bytes. The key is empty afterwards.
    pub fn clear_mem(&mut self) {
        self.key.clear();
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for SymKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymKey")
            .field("algorithm", &self.algorithm)
            .field("len", &self.key.len())
            .finish()
    }
}

/// Generates or imports [`SymKey`]s for one algorithm.
pub struct SymKeyGenerator {
    spi: Box<dyn SymKeyGeneratorSpi>,
    algorithm: String,
}

crypto_object!(SymKeyGenerator, "SymKeyGenerator");

impl SymKeyGenerator {
    /// Create a generator for `AES128`, `AES192`, `AES256`, `SM4_128`,
    /// `DES64`, `3DES192`, `HMAC|<digest>` or bare `HMAC`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a malformed name, a family
    /// without keys of its own, or a block cipher named without a size.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let accepts = Accepts {
            family: true,
            digest: true,
            ..Accepts::default()
        };
        let selector = Selector::parse(name, "SymKeyGenerator", accepts)?;
        let key_len = match selector.family()? {
            Family::Hmac => selector.digest.map(|digest| digest.output_len()),
            Family::Aes | Family::Sm4 | Family::Des | Family::TripleDes => {
                selector.forbid_digest()?;
                Some(symmetric_key_len(selector.key_size()?)?)
            },
            other => {
                return Err(CryptoError::InvalidParams(format!(
                    "{other} has no symmetric keys"
                )));
            },
        };
        debug!(algorithm = name, ?key_len, "created symmetric key generator");
        Ok(Self::from_spi(Box::new(RawKeyGenerator::new(name, key_len)), name))
    }

    /// Wrap a caller-supplied backend.
    #[must_use]
    pub fn from_spi(spi: Box<dyn SymKeyGeneratorSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            algorithm: algorithm.into(),
        }
    }

    /// Generate a fresh random key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for bare `HMAC`, which has no
    /// fixed length.
    pub fn generate_sym_key(&mut self) -> CryptoResult<SymKey> {
        Ok(SymKey {
            key: self.spi.generate()?,
            algorithm: self.algorithm.clone(),
        })
    }

    /// Import raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the length is wrong for the
    /// algorithm.
    pub fn convert_sym_key(&self, key: &[u8]) -> CryptoResult<SymKey> {
        Ok(SymKey {
            key: self.spi.convert(key)?,
            algorithm: self.algorithm.clone(),
        })
    }

    /// Algorithm name.
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

fn symmetric_key_len(size: KeySize) -> CryptoResult<usize> {
    match size {
        KeySize::Aes(_) | KeySize::Sm4 | KeySize::Des | KeySize::TripleDes => {
            usize::try_from(size.bits() / 8).map_err(CryptoError::backend)
        },
        other => Err(CryptoError::InvalidParams(format!(
            "{other} is not a symmetric key size"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lengths_per_family() {
        for (name, len) in [
            ("AES128", 16),
            ("AES192", 24),
            ("AES256", 32),
            ("SM4_128", 16),
            ("DES64", 8),
            ("3DES192", 24),
            ("HMAC|SHA384", 48),
        ] {
            let mut generator = SymKeyGenerator::create(name).unwrap();
            let key = generator.generate_sym_key().unwrap();
            assert_eq!(key.get_encoded().unwrap().len(), len, "{name}");
            assert_eq!(key.algorithm(), name);
        }
    }

    #[test]
    fn test_convert_checks_length() {
        let generator = SymKeyGenerator::create("AES128").unwrap();
        assert!(matches!(
            generator.convert_sym_key(&[0u8; 15]),
            Err(CryptoError::InvalidParams(_))
        ));
        assert!(generator.convert_sym_key(&[0u8; 16]).is_ok());
    }

    #[test]
    fn test_bare_hmac_converts_any_length() {
        let mut generator = SymKeyGenerator::create("HMAC").unwrap();
        assert!(generator.generate_sym_key().is_err());
        assert_eq!(generator.convert_sym_key(b"k").unwrap().bytes(), b"k");
    }

    #[test]
    fn test_rejects_asymmetric_and_unsized() {
        assert!(SymKeyGenerator::create("RSA2048").is_err());
        assert!(SymKeyGenerator::create("AES").is_err());
        assert!(SymKeyGenerator::create("AES128|SHA256").is_err());
    }

    #[test]
    fn test_clear_mem() {
        let mut generator = SymKeyGenerator::create("AES256").unwrap();
        let mut key = generator.generate_sym_key().unwrap();
        assert_eq!(key.format(), "RAW");
        key.clear_mem();
        assert!(key.get_encoded().unwrap().is_empty());
    }
}

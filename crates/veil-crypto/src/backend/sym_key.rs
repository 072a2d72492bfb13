//! Raw symmetric key generation.

use rand::RngCore;
use rand::rngs::OsRng;
use veil_core::{Blob, CryptoError, CryptoResult};

use crate::spi::SymKeyGeneratorSpi;

pub(crate) struct RawKeyGenerator {
    algorithm: String,
    /// Exact key length, or `None` when any nonzero length is accepted.
    key_len: Option<usize>,
}

impl RawKeyGenerator {
    pub(crate) fn new(algorithm: impl Into<String>, key_len: Option<usize>) -> Self {
        Self {
            algorithm: algorithm.into(),
            key_len,
        }
    }
}

impl SymKeyGeneratorSpi for RawKeyGenerator {
    fn generate(&mut self) -> CryptoResult<Blob> {
        let len = self.key_len.ok_or_else(|| {
            CryptoError::InvalidParams(format!(
                "{} has no fixed key length to generate",
                self.algorithm
            ))
        })?;
        let mut key = Blob::with_capacity(len)?.into_vec();
        key.resize(len, 0);
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(CryptoError::backend)?;
        Ok(Blob::from(key))
    }

    fn convert(&self, key: &[u8]) -> CryptoResult<Blob> {
        match self.key_len {
            Some(len) if key.len() != len => Err(CryptoError::InvalidParams(format!(
                "{} key must be {len} bytes, got {}",
                self.algorithm,
                key.len()
            ))),
            None if key.is_empty() => Err(CryptoError::InvalidParams(format!(
                "{} key must not be empty",
                self.algorithm
            ))),
            _ => Blob::copy_from(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_fixed_length() {
        let mut generator = RawKeyGenerator::new("AES256", Some(32));
        assert_eq!(generator.generate().unwrap().len(), 32);
    }

    #[test]
    fn test_unsized_cannot_generate() {
        let mut generator = RawKeyGenerator::new("HMAC", None);
        assert!(generator.generate().is_err());
        assert_eq!(generator.convert(&[1, 2, 3]).unwrap().len(), 3);
        assert!(generator.convert(&[]).is_err());
    }

    #[test]
    fn test_convert_checks_length() {
        let generator = RawKeyGenerator::new("3DES192", Some(24));
        assert!(generator.convert(&[0u8; 16]).is_err());
        assert!(generator.convert(&[0u8; 24]).is_ok());
    }
}

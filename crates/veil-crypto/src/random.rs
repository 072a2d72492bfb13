//! Random byte generation.

use tracing::debug;
use veil_core::{Blob, CryptoError, CryptoResult, crypto_object};

use crate::backend::rand::StdRandBackend;
use crate::spi::RandSpi;

/// A cryptographically secure random generator.
pub struct Rand {
    spi: Box<dyn RandSpi>,
}

crypto_object!(Rand, "Rand");

impl Rand {
    /// Create the default generator, seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::OperationFailed`] if the OS has no entropy to
    /// give.
    pub fn create() -> CryptoResult<Self> {
        let spi = StdRandBackend::new()?;
        debug!(algorithm = spi.algo_name(), "created random generator");
        Ok(Self::from_spi(Box::new(spi)))
    }

    /// Wrap a caller-supplied backend.
    #[must_use]
    pub fn from_spi(spi: Box<dyn RandSpi>) -> Self {
        Self { spi }
    }

    /// Produce `len` random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if `len` is zero.
    pub fn generate_random(&mut self, len: usize) -> CryptoResult<Blob> {
        if len == 0 {
            return Err(CryptoError::InvalidParams(
                "random length must be positive".into(),
            ));
        }
        self.spi.generate(len)
    }

    /// Mix `seed` into the generator state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot reseed.
    pub fn set_seed(&mut self, seed: &[u8]) -> CryptoResult<()> {
        self.spi.set_seed(seed)
    }

    /// Generator name.
    #[must_use]
    pub fn algo_name(&self) -> &'static str {
        self.spi.algo_name()
    }
}

//! Random generator backend: a ChaCha12 generator seeded from the OS.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use veil_core::{Blob, CryptoError, CryptoResult};
use zeroize::Zeroizing;

use crate::spi::RandSpi;

pub(crate) struct StdRandBackend {
    rng: StdRng,
}

impl StdRandBackend {
    pub(crate) fn new() -> CryptoResult<Self> {
        let rng = StdRng::from_rng(rand::rngs::OsRng).map_err(CryptoError::backend)?;
        Ok(Self { rng })
    }
}

impl RandSpi for StdRandBackend {
    fn generate(&mut self, len: usize) -> CryptoResult<Blob> {
        let mut out = Vec::new();
        out.try_reserve_exact(len)
            .map_err(|_| CryptoError::AllocationFailure { requested: len })?;
        out.resize(len, 0);
        self.rng
            .try_fill_bytes(&mut out)
            .map_err(CryptoError::backend)?;
        Ok(Blob::from(out))
    }

    fn set_seed(&mut self, seed: &[u8]) -> CryptoResult<()> {
        let mut state = Zeroizing::new([0u8; 32]);
        self.rng.fill_bytes(&mut *state);

        let mut hasher = Sha256::new();
        hasher.update(&*state);
        hasher.update(seed);
        let mixed: [u8; 32] = hasher.finalize().into();

        self.rng = StdRng::from_seed(mixed);
        Ok(())
    }

    fn algo_name(&self) -> &'static str {
        "ChaCha12Rng"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length() {
        let mut rng = StdRandBackend::new().unwrap();
        assert_eq!(rng.generate(48).unwrap().len(), 48);
    }

    #[test]
    fn test_seed_changes_stream() {
        let mut rng = StdRandBackend::new().unwrap();
        let before = rng.generate(32).unwrap();
        rng.set_seed(b"extra entropy").unwrap();
        let after = rng.generate(32).unwrap();
        assert_ne!(before, after);
    }
}

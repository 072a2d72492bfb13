//! Message digests.

use tracing::debug;
use veil_core::{Blob, CryptoResult, DigestAlg, StreamState, crypto_object};

use crate::backend::digest::DigestBackend;
use crate::selector::{Accepts, Selector};
use crate::spi::MdSpi;

/// A streaming message digest.
///
/// Created ready for data. After [`Md::do_final`] it must be re-initialized
/// with [`Md::init`] before the next message.
///
/// # Example
///
/// ```
/// use veil_crypto::md::Md;
///
/// let mut md = Md::create("SHA256").unwrap();
/// md.update(b"abc").unwrap();
/// let digest = md.do_final().unwrap();
/// assert_eq!(
///     digest.to_hex(),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub struct Md {
    spi: Box<dyn MdSpi>,
    state: StreamState,
    algorithm: String,
}

crypto_object!(Md, "Md");

impl Md {
    /// Create a digest from a name such as `"SHA256"` or `"SM3"`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`](veil_core::CryptoError::InvalidParams)
    /// for a malformed name or one that is not a single digest.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let accepts = Accepts {
            digest: true,
            ..Accepts::default()
        };
        let digest = Selector::parse(name, "Md", accepts)?.digest()?;
        debug!(algorithm = name, "created digest");
        Ok(Self::from_spi(Box::new(DigestBackend::new(digest)), digest.name()))
    }

    /// Wrap a caller-supplied backend.
    #[must_use]
    pub fn from_spi(spi: Box<dyn MdSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            state: StreamState::Initialized,
            algorithm: algorithm.into(),
        }
    }

    /// Discard absorbed data and start a new message.
    pub fn init(&mut self) {
        self.spi.reset();
        self.state.init();
    }

    /// Absorb data.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`](veil_core::CryptoError::InvalidParams)
    /// after [`Md::do_final`] without a fresh [`Md::init`].
    pub fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.state.ensure_ready("Md::update")?;
        self.spi.update(data)?;
        self.state.update("Md::update")
    }

    /// Finish the message and return its digest.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`](veil_core::CryptoError::InvalidParams)
    /// if already finalized.
    pub fn do_final(&mut self) -> CryptoResult<Blob> {
        self.state.finish("Md::do_final")?;
        self.spi.finalize()
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn length(&self) -> usize {
        self.spi.output_len()
    }

    /// Algorithm name, e.g. `"SHA256"`.
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

/// One-shot digest of `data` under `alg`.
#[must_use]
pub fn digest(alg: DigestAlg, data: &[u8]) -> Blob {
    Blob::from(crate::backend::digest::digest(alg, data))
}

#[cfg(test)]
mod tests {
    use veil_core::CryptoError;

    use super::*;

    fn hash_hex(name: &str, data: &[u8]) -> String {
        let mut md = Md::create(name).unwrap();
        md.update(data).unwrap();
        md.do_final().unwrap().to_hex()
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(hash_hex("MD5", b"abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            hash_hex("SHA1", b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hash_hex("SM3", b"abc"),
            "66c7f0f462eeedd9d1f2d46bdc10e4e24167c4875cf2f7a2297da02b8f4ba8e0"
        );
    }

    #[test]
    fn test_lengths() {
        for alg in DigestAlg::ALL {
            assert_eq!(Md::create(alg.name()).unwrap().length(), alg.output_len());
        }
    }

    #[test]
    fn test_update_after_final_needs_init() {
        let mut md = Md::create("SHA512").unwrap();
        md.do_final().unwrap();
        assert!(matches!(
            md.update(b"more"),
            Err(CryptoError::InvalidParams(_))
        ));
        md.init();
        md.update(b"more").unwrap();
    }

    #[test]
    fn test_rejects_non_digest_names() {
        assert!(Md::create("AES128").is_err());
        assert!(Md::create("sha256").is_err());
        assert!(Md::create("").is_err());
    }

    #[test]
    fn test_class_tag() {
        let md = Md::create("SHA224").unwrap();
        assert_eq!(veil_core::CryptoObject::class(&md), "Md");
    }
}

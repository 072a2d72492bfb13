//! Digest backend over the RustCrypto hash crates.

use sha2::digest::DynDigest;
use veil_core::{Blob, CryptoResult, DigestAlg};

use crate::spi::MdSpi;

/// Run `$body` with `$d` bound to the concrete hasher type for `$alg`.
macro_rules! with_digest {
    ($alg:expr, $d:ident => $body:expr) => {
        match $alg {
            ::veil_core::DigestAlg::Md5 => {
                type $d = ::md5::Md5;
                $body
            },
            ::veil_core::DigestAlg::Sha1 => {
                type $d = ::sha1::Sha1;
                $body
            },
            ::veil_core::DigestAlg::Sha224 => {
                type $d = ::sha2::Sha224;
                $body
            },
            ::veil_core::DigestAlg::Sha256 => {
                type $d = ::sha2::Sha256;
                $body
            },
            ::veil_core::DigestAlg::Sha384 => {
                type $d = ::sha2::Sha384;
                $body
            },
            ::veil_core::DigestAlg::Sha512 => {
                type $d = ::sha2::Sha512;
                $body
            },
            ::veil_core::DigestAlg::Sm3 => {
                type $d = ::sm3::Sm3;
                $body
            },
        }
    };
}

pub(crate) use with_digest;

/// Boxed, object-safe hasher for `alg`.
pub(crate) fn dyn_digest(alg: DigestAlg) -> Box<dyn DynDigest + Send + Sync> {
    with_digest!(alg, D => Box::new(<D as sha2::Digest>::new()))
}

/// One-shot digest of `data`.
pub(crate) fn digest(alg: DigestAlg, data: &[u8]) -> Vec<u8> {
    let mut hasher = dyn_digest(alg);
    hasher.update(data);
    hasher.finalize_reset().into_vec()
}

/// Streaming digest for the `Md` facade and the signature backends.
pub(crate) struct DigestBackend {
    alg: DigestAlg,
    hasher: Box<dyn DynDigest + Send + Sync>,
}

impl DigestBackend {
    pub(crate) fn new(alg: DigestAlg) -> Self {
        Self {
            alg,
            hasher: dyn_digest(alg),
        }
    }

    pub(crate) fn alg(&self) -> DigestAlg {
        self.alg
    }

    /// Finish and reset, returning the raw hash.
    pub(crate) fn take_hash(&mut self) -> Vec<u8> {
        self.hasher.finalize_reset().into_vec()
    }
}

impl MdSpi for DigestBackend {
    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.hasher.update(data);
        Ok(())
    }

    fn finalize(&mut self) -> CryptoResult<Blob> {
        Ok(Blob::from(self.take_hash()))
    }

    fn reset(&mut self) {
        self.hasher.reset();
    }

    fn output_len(&self) -> usize {
        self.hasher.output_size()
    }
}

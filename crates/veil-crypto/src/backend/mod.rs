//! Built-in RustCrypto backends behind the SPI traits.

pub(crate) mod block;
pub(crate) mod curve25519;
pub(crate) mod dh;
pub(crate) mod digest;
pub(crate) mod dsa;
pub(crate) mod ecc;
pub(crate) mod hmac;
pub(crate) mod kdf;
pub(crate) mod rand;
pub(crate) mod rsa;
pub(crate) mod sym_key;

use veil_core::{CryptoError, CryptoResult, Family, KeyParamSpec, KeySize, Primes};

use crate::spi::{AsyKeyGeneratorSpi, AsyKeySpecGeneratorSpi};

/// One asymmetric family: builds generators from a named size or from a
/// key parameter spec.
pub(crate) trait AsyKeyBackend: Sync {
    /// Generator for keys of `size`.
    fn generator(&self, size: KeySize, primes: Primes) -> CryptoResult<Box<dyn AsyKeyGeneratorSpi>>;

    /// Generator for keys described by `spec`.
    fn spec_generator(&self, spec: &KeyParamSpec) -> CryptoResult<Box<dyn AsyKeySpecGeneratorSpi>>;
}

/// The backend for `family`. Name-driven and spec-driven construction both
/// resolve here.
pub(crate) fn find_backend(family: Family) -> CryptoResult<&'static dyn AsyKeyBackend> {
    match family {
        Family::Rsa => Ok(&rsa::RsaBackend),
        Family::Ecc => Ok(&ecc::EccBackend),
        Family::Dsa => Ok(&dsa::DsaBackend),
        Family::Ed25519 => Ok(&curve25519::ED25519_BACKEND),
        Family::X25519 => Ok(&curve25519::X25519_BACKEND),
        Family::Dh => Ok(&dh::DhBackend),
        Family::Sm2 => Err(CryptoError::NotSupported(format!(
            "no {family} key backend"
        ))),
        Family::Aes
        | Family::Sm4
        | Family::Des
        | Family::TripleDes
        | Family::Hmac
        | Family::Hkdf
        | Family::Pbkdf2
        | Family::Scrypt => Err(CryptoError::InvalidParams(format!(
            "{family} is not an asymmetric family"
        ))),
    }
}

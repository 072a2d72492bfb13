//! Key agreement.

use tracing::debug;
use veil_core::{Blob, CryptoError, CryptoResult, Family, KeySize, crypto_object};

use crate::asy_key::{PriKey, PubKey};
use crate::backend::curve25519::X25519AgreementBackend;
use crate::backend::dh::DhAgreementBackend;
use crate::backend::ecc::EcdhBackend;
use crate::selector::{Accepts, Selector};
use crate::spi::KeyAgreementSpi;

/// Derives a shared secret from a private key and a peer's public key.
pub struct KeyAgreement {
    spi: Box<dyn KeyAgreementSpi>,
    algorithm: String,
}

crypto_object!(KeyAgreement, "KeyAgreement");

impl KeyAgreement {
    /// Create an agreement from `"ECC256"`, `"ECC384"`, `"X25519"` or a
    /// DH group such as `"DH_modp2048"`.
    ///
    /// A DH agreement takes keys of any DH domain as long as both keys
    /// share it; the group in the name is not enforced.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a malformed name or a
    /// family without agreement, and [`CryptoError::NotSupported`] for SM2
    /// and curves without a backend.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let accepts = Accepts {
            family: true,
            ..Accepts::default()
        };
        let selector = Selector::parse(name, "KeyAgreement", accepts)?;
        let family = selector.family()?;
        let spi: Box<dyn KeyAgreementSpi> = match (family, selector.key_size()?) {
            (Family::Ecc, KeySize::Ecc(curve)) => Box::new(EcdhBackend::new(curve)?),
            (Family::X25519, _) => Box::new(X25519AgreementBackend),
            (Family::Dh, KeySize::Dh(_)) => Box::new(DhAgreementBackend),
            (Family::Sm2, _) => {
                return Err(CryptoError::NotSupported(format!(
                    "no {family} agreement backend"
                )));
            },
            (other, _) => {
                return Err(CryptoError::InvalidParams(format!(
                    "{other} has no key agreement"
                )));
            },
        };
        debug!(algorithm = name, %family, "created key agreement");
        Ok(Self::from_spi(spi, name))
    }

    /// Wrap a caller-supplied backend.
    #[must_use]
    pub fn from_spi(spi: Box<dyn KeyAgreementSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            algorithm: algorithm.into(),
        }
    }

    /// Shared secret of `private` and the peer's `public`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for keys of another family or
    /// curve or DH domain, and [`CryptoError::OperationFailed`] for an
    /// X25519 peer key of low order or a DH peer value outside `[2, p - 2]`.
    pub fn generate_secret(&mut self, private: &PriKey, public: &PubKey) -> CryptoResult<Blob> {
        self.spi.generate_secret(private.spi()?, public.spi())
    }

    /// Algorithm name as given to [`KeyAgreement::create`].
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asy_key::AsyKeyGenerator;

    fn agree_both_ways(name: &str, secret_len: usize) {
        let mut generator = AsyKeyGenerator::create(name).unwrap();
        let alice = generator.generate_key_pair().unwrap();
        let bob = generator.generate_key_pair().unwrap();
        let mut agreement = KeyAgreement::create(name).unwrap();

        let ab = agreement
            .generate_secret(alice.private_key().unwrap(), bob.public_key().unwrap())
            .unwrap();
        let ba = agreement
            .generate_secret(bob.private_key().unwrap(), alice.public_key().unwrap())
            .unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), secret_len);
    }

    #[test]
    fn test_ecdh() {
        agree_both_ways("ECC256", 32);
        agree_both_ways("ECC384", 48);
    }

    #[test]
    fn test_x25519() {
        agree_both_ways("X25519", 32);
    }

    #[test]
    fn test_dh() {
        agree_both_ways("DH_modp1536", 192);
        agree_both_ways("DH_ffdhe2048", 256);
    }

    #[test]
    fn test_dh_group_mismatch() {
        let modp = AsyKeyGenerator::create("DH_modp1536")
            .unwrap()
            .generate_key_pair()
            .unwrap();
        let ffdhe = AsyKeyGenerator::create("DH_ffdhe2048")
            .unwrap()
            .generate_key_pair()
            .unwrap();
        let mut agreement = KeyAgreement::create("DH_modp1536").unwrap();
        assert!(matches!(
            agreement.generate_secret(modp.private_key().unwrap(), ffdhe.public_key().unwrap()),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_curve_mismatch() {
        let p256 = AsyKeyGenerator::create("ECC256")
            .unwrap()
            .generate_key_pair()
            .unwrap();
        let mut agreement = KeyAgreement::create("ECC384").unwrap();
        assert!(matches!(
            agreement.generate_secret(p256.private_key().unwrap(), p256.public_key().unwrap()),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_create_rejections() {
        assert!(matches!(
            KeyAgreement::create("SM2_256"),
            Err(CryptoError::NotSupported(_))
        ));
        assert!(matches!(
            KeyAgreement::create("ECC521"),
            Err(CryptoError::NotSupported(_))
        ));
        assert!(matches!(
            KeyAgreement::create("RSA2048"),
            Err(CryptoError::InvalidParams(_))
        ));
        assert!(matches!(
            KeyAgreement::create("Ed25519"),
            Err(CryptoError::InvalidParams(_))
        ));
    }
}

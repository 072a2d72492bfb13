//! Asymmetric keys, key pairs and their generators.
//!
//! Keys come from three places: [`AsyKeyGenerator`] generates or decodes them
//! by algorithm name, and [`AsyKeyGeneratorBySpec`] builds them from raw
//! components in a [`KeyParamSpec`]. All three share one backend per family.

use std::fmt;

use tracing::debug;
use veil_core::descriptor::unexpected_token;
use veil_core::{
    AsyKeySpecItem, BigInteger, Blob, CryptoError, CryptoResult, Family, KeyParamSpec, Primes,
    SpecKind, Token, crypto_object,
};

use crate::backend::find_backend;
use crate::selector::{Accepts, Selector};
use crate::spi::{
    AsyKeyGeneratorSpi, AsyKeySpecGeneratorSpi, ConvertedKeys, KeyPairSpi, PriKeySpi, PubKeySpi,
};

/// Public half of an asymmetric key.
pub struct PubKey {
    spi: Box<dyn PubKeySpi>,
}

crypto_object!(PubKey, "PubKey");

impl PubKey {
    /// Wrap a backend key.
    #[must_use]
    pub fn from_spi(spi: Box<dyn PubKeySpi>) -> Self {
        Self { spi }
    }

    /// SubjectPublicKeyInfo DER.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot encode the key.
    pub fn get_encoded(&self) -> CryptoResult<Blob> {
        self.spi.encoded()
    }

    /// Family name, e.g. `"RSA"`.
    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        self.spi.algorithm()
    }

    /// Always `"X.509"`.
    #[must_use]
    pub fn format(&self) -> &'static str {
        "X.509"
    }

    /// Read a big-integer component, big-endian.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the key has no such
    /// component.
    pub fn get_asy_key_spec_big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        self.spi.big_integer(item)
    }

    /// Read an integer component, such as the ECC cofactor.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the key has no such
    /// component.
    pub fn get_asy_key_spec_int(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        self.spi.int_item(item)
    }

    /// Read a string component, such as the ECC curve name.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the key has no such
    /// component.
    pub fn get_asy_key_spec_string(&self, item: AsyKeySpecItem) -> CryptoResult<String> {
        self.spi.string_item(item)
    }

    pub(crate) fn spi(&self) -> &dyn PubKeySpi {
        self.spi.as_ref()
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

/// Private half of an asymmetric key.
///
/// [`PriKey::clear_mem`] drops the secret early; every later use fails with
/// [`CryptoError::InvalidParams`].
pub struct PriKey {
    spi: Option<Box<dyn PriKeySpi>>,
    algorithm: &'static str,
}

crypto_object!(PriKey, "PriKey");

impl PriKey {
    /// Wrap a backend key.
    #[must_use]
    pub fn from_spi(spi: Box<dyn PriKeySpi>) -> Self {
        let algorithm = spi.algorithm();
        Self {
            spi: Some(spi),
            algorithm,
        }
    }

    /// PKCS#8 DER.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] after [`PriKey::clear_mem`].
    pub fn get_encoded(&self) -> CryptoResult<Blob> {
        self.spi()?.encoded()
    }

    /// Family name, e.g. `"RSA"`.
    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }

    /// Always `"PKCS#8"`.
    #[must_use]
    pub fn format(&self) -> &'static str {
        "PKCS#8"
    }

    /// Read a big-integer component, big-endian.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the key has no such
    /// component or was cleared.
    pub fn get_asy_key_spec_big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        self.spi()?.big_integer(item)
    }

    /// Read an integer component.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the key has no such
    /// component or was cleared.
    pub fn get_asy_key_spec_int(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        self.spi()?.int_item(item)
    }

    /// Read a string component.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the key has no such
    /// component or was cleared.
    pub fn get_asy_key_spec_string(&self, item: AsyKeySpecItem) -> CryptoResult<String> {
        self.spi()?.string_item(item)
    }

    /// Drop the secret material now.
    pub fn clear_mem(&mut self) {
        self.spi = None;
    }

    pub(crate) fn spi(&self) -> CryptoResult<&dyn PriKeySpi> {
        self.spi.as_deref().ok_or_else(|| {
            CryptoError::InvalidParams(format!("{} private key was cleared", self.algorithm))
        })
    }
}

impl fmt::Debug for PriKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriKey")
            .field("algorithm", &self.algorithm)
            .field("cleared", &self.spi.is_none())
            .finish_non_exhaustive()
    }
}

/// A public key, a private key, or both.
#[derive(Debug)]
pub struct KeyPair {
    public: Option<PubKey>,
    private: Option<PriKey>,
}

crypto_object!(KeyPair, "KeyPair");

impl KeyPair {
    /// Assemble a pair from optional halves.
    #[must_use]
    pub fn new(public: Option<PubKey>, private: Option<PriKey>) -> Self {
        Self { public, private }
    }

    /// The public half, if present.
    #[must_use]
    pub fn public_key(&self) -> Option<&PubKey> {
        self.public.as_ref()
    }

    /// The private half, if present.
    #[must_use]
    pub fn private_key(&self) -> Option<&PriKey> {
        self.private.as_ref()
    }

    /// Mutable access to the private half, for [`PriKey::clear_mem`].
    pub fn private_key_mut(&mut self) -> Option<&mut PriKey> {
        self.private.as_mut()
    }

    /// Split into owned halves.
    #[must_use]
    pub fn into_parts(self) -> (Option<PubKey>, Option<PriKey>) {
        (self.public, self.private)
    }
}

impl From<KeyPairSpi> for KeyPair {
    fn from(pair: KeyPairSpi) -> Self {
        Self::new(
            Some(PubKey::from_spi(pair.public)),
            Some(PriKey::from_spi(pair.private)),
        )
    }
}

impl From<ConvertedKeys> for KeyPair {
    fn from(keys: ConvertedKeys) -> Self {
        Self::new(
            keys.public.map(PubKey::from_spi),
            keys.private.map(PriKey::from_spi),
        )
    }
}

/// Generates and decodes keys for one named algorithm.
pub struct AsyKeyGenerator {
    spi: Box<dyn AsyKeyGeneratorSpi>,
    algorithm: String,
}

crypto_object!(AsyKeyGenerator, "AsyKeyGenerator");

impl AsyKeyGenerator {
    /// Create a generator from a name such as `"RSA2048|PRIMES_2"`,
    /// `"ECC384"` or `"Ed25519"`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a malformed name, a
    /// symmetric family or an RSA size outside 512..=8192 bits, and
    /// [`CryptoError::NotSupported`] for families and sizes without a
    /// backend.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let accepts = Accepts {
            family: true,
            primes: true,
            ..Accepts::default()
        };
        let selector = Selector::parse(name, "AsyKeyGenerator", accepts)?;
        let family = selector.family()?;
        if !family.is_asymmetric() {
            return Err(CryptoError::InvalidParams(format!(
                "{family} has no asymmetric keys"
            )));
        }
        if let Some(primes) = selector.primes
            && family != Family::Rsa
        {
            return Err(unexpected_token("AsyKeyGenerator", Token::Primes(primes)));
        }
        let size = selector.key_size()?;
        let primes = selector.primes.unwrap_or(Primes::Two);
        let spi = find_backend(family)?.generator(size, primes)?;
        debug!(algorithm = name, %family, %size, "created asymmetric key generator");
        Ok(Self::from_spi(spi, name))
    }

    /// Wrap a caller-supplied backend.
    #[must_use]
    pub fn from_spi(spi: Box<dyn AsyKeyGeneratorSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            algorithm: algorithm.into(),
        }
    }

    /// Generate a fresh key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to generate.
    pub fn generate_key_pair(&mut self) -> CryptoResult<KeyPair> {
        self.spi.generate_key_pair().map(KeyPair::from)
    }

    /// Decode SubjectPublicKeyInfo and/or PKCS#8 DER into a pair holding
    /// whichever halves were given.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if neither half is given or
    /// either fails to decode.
    pub fn convert_key(
        &self,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> CryptoResult<KeyPair> {
        if public.is_none() && private.is_none() {
            return Err(CryptoError::InvalidParams(
                "convert_key needs a public or a private key".into(),
            ));
        }
        self.spi.convert_key(public, private).map(KeyPair::from)
    }

    /// Algorithm name as given to [`AsyKeyGenerator::create`].
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

/// Builds keys from a [`KeyParamSpec`].
///
/// Which operations are available depends on the spec's kind: domain
/// parameters alone allow all three, public or private components allow only
/// their own half, and a full pair allows all three.
pub struct AsyKeyGeneratorBySpec {
    spi: Box<dyn AsyKeySpecGeneratorSpi>,
    kind: SpecKind,
    algorithm: &'static str,
}

crypto_object!(AsyKeyGeneratorBySpec, "AsyKeyGeneratorBySpec");

impl AsyKeyGeneratorBySpec {
    /// Validate `spec` and bind it to its family's backend.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if a component has the wrong
    /// length and [`CryptoError::NotSupported`] if no backend handles the
    /// family or its domain parameters.
    pub fn create(spec: &KeyParamSpec) -> CryptoResult<Self> {
        spec.validate()?;
        let family = spec.family();
        let spi = find_backend(family)?.spec_generator(spec)?;
        debug!(%family, kind = ?spec.kind(), "created asymmetric key generator from spec");
        Ok(Self {
            spi,
            kind: spec.kind(),
            algorithm: spec.algorithm_name(),
        })
    }

    /// Build or generate both halves.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a public-only or
    /// private-only spec.
    pub fn generate_key_pair(&mut self) -> CryptoResult<KeyPair> {
        self.require(matches!(self.kind, SpecKind::Common | SpecKind::KeyPair), "a key pair")?;
        self.spi.generate_key_pair().map(KeyPair::from)
    }

    /// Build or generate the public half.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a private-only spec.
    pub fn generate_pub_key(&mut self) -> CryptoResult<PubKey> {
        self.require(self.kind != SpecKind::PrivateOnly, "a public key")?;
        self.spi.generate_pub_key().map(PubKey::from_spi)
    }

    /// Build or generate the private half.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a public-only spec.
    pub fn generate_pri_key(&mut self) -> CryptoResult<PriKey> {
        self.require(self.kind != SpecKind::PublicOnly, "a private key")?;
        self.spi.generate_pri_key().map(PriKey::from_spi)
    }

    /// Family name of the spec, e.g. `"ECC"`.
    #[must_use]
    pub fn algo_name(&self) -> &'static str {
        self.algorithm
    }

    fn require(&self, allowed: bool, what: &str) -> CryptoResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(CryptoError::InvalidParams(format!(
                "a {:?} spec cannot produce {what}",
                self.kind
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use veil_core::spec::{Curve25519KeySpec, Curve25519Private, Curve25519Public};
    use veil_core::{AsyKeySpec, spec::Curve25519Common};

    use super::*;

    #[test]
    fn test_ed25519_round_trip_through_der() {
        let mut generator = AsyKeyGenerator::create("Ed25519").unwrap();
        let pair = generator.generate_key_pair().unwrap();
        let public = pair.public_key().unwrap().get_encoded().unwrap();
        let private = pair.private_key().unwrap().get_encoded().unwrap();

        let restored = generator
            .convert_key(Some(public.as_slice()), Some(private.as_slice()))
            .unwrap();
        assert_eq!(
            restored.public_key().unwrap().get_encoded().unwrap(),
            public
        );
        assert_eq!(restored.private_key().unwrap().format(), "PKCS#8");
        assert_eq!(restored.public_key().unwrap().format(), "X.509");
    }

    #[test]
    fn test_convert_one_half() {
        let mut generator = AsyKeyGenerator::create("X25519").unwrap();
        let pair = generator.generate_key_pair().unwrap();
        let public = pair.public_key().unwrap().get_encoded().unwrap();
        let restored = generator.convert_key(Some(public.as_slice()), None).unwrap();
        assert!(restored.private_key().is_none());
        assert!(generator.convert_key(None, None).is_err());
    }

    #[test]
    fn test_create_rejections() {
        for name in ["AES128", "HMAC|SHA256", "rsa2048", "", "ECC256|PRIMES_2"] {
            assert!(
                matches!(
                    AsyKeyGenerator::create(name),
                    Err(CryptoError::InvalidParams(_))
                ),
                "{name}"
            );
        }
        for name in ["SM2_256", "ECC224", "ECC521"] {
            assert!(
                matches!(
                    AsyKeyGenerator::create(name),
                    Err(CryptoError::NotSupported(_))
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn test_rsa_primes_rules() {
        assert!(matches!(
            AsyKeyGenerator::create("RSA512|PRIMES_3"),
            Err(CryptoError::InvalidParams(_))
        ));
        assert!(matches!(
            AsyKeyGenerator::create("RSA2048|PRIMES_3"),
            Err(CryptoError::NotSupported(_))
        ));
        assert!(AsyKeyGenerator::create("RSA2048|PRIMES_2").is_ok());
    }

    #[test]
    fn test_clear_mem_disables_private_key() {
        let mut generator = AsyKeyGenerator::create("Ed25519").unwrap();
        let mut pair = generator.generate_key_pair().unwrap();
        let private = pair.private_key_mut().unwrap();
        private.clear_mem();
        assert!(matches!(
            private.get_encoded(),
            Err(CryptoError::InvalidParams(_))
        ));
        assert_eq!(private.algorithm(), "Ed25519");
    }

    #[test]
    fn test_spec_kind_rules() {
        let public = Curve25519KeySpec::public_only(
            Curve25519Common,
            Curve25519Public {
                pk: BigInteger::from_be_bytes(&[9u8; 32]),
            },
        );
        let mut generator =
            AsyKeyGeneratorBySpec::create(&KeyParamSpec::X25519(public)).unwrap();
        assert!(generator.generate_pub_key().is_ok());
        assert!(matches!(
            generator.generate_pri_key(),
            Err(CryptoError::InvalidParams(_))
        ));
        assert!(matches!(
            generator.generate_key_pair(),
            Err(CryptoError::InvalidParams(_))
        ));

        let private = AsyKeySpec::private_only(
            Curve25519Common,
            Curve25519Private {
                sk: BigInteger::from_be_bytes(&[7u8; 32]),
            },
        );
        let mut generator =
            AsyKeyGeneratorBySpec::create(&KeyParamSpec::Ed25519(private)).unwrap();
        assert!(generator.generate_pub_key().is_err());
        let key = generator.generate_pri_key().unwrap();
        assert_eq!(
            key.get_asy_key_spec_big_integer(AsyKeySpecItem::Ed25519Sk)
                .unwrap()
                .as_bytes(),
            &[7u8; 32]
        );
    }

    #[test]
    fn test_spec_length_checked_at_create() {
        let bad = Curve25519KeySpec::public_only(
            Curve25519Common,
            Curve25519Public {
                pk: BigInteger::from_be_bytes(&[9u8; 31]),
            },
        );
        assert!(matches!(
            AsyKeyGeneratorBySpec::create(&KeyParamSpec::Ed25519(bad)),
            Err(CryptoError::InvalidParams(_))
        ));
    }
}

//! DSA over the `dsa` crate.

use dsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use dsa::signature::SignatureEncoding;
use dsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use dsa::{BigUint, Components, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use tracing::debug;
use veil_core::spec::DsaKeySpec;
use veil_core::{
    AsyKeySpecItem, BigInteger, Blob, CryptoError, CryptoResult, DigestAlg, KeyParamSpec, KeySize,
    Primes,
};
use zeroize::Zeroizing;

use super::AsyKeyBackend;
use super::digest::DigestBackend;
use crate::spi::{
    AsyKeyGeneratorSpi, AsyKeySpecGeneratorSpi, ConvertedKeys, KeyPairSpi, MdSpi, PriKeySpi,
    PubKeySpi, SignSpi, VerifySpi, downcast_pri, downcast_pub, not_an_item,
};

pub(crate) struct DsaBackend;

impl AsyKeyBackend for DsaBackend {
    fn generator(&self, size: KeySize, _primes: Primes) -> CryptoResult<Box<dyn AsyKeyGeneratorSpi>> {
        let KeySize::Dsa(bits) = size else {
            return Err(CryptoError::InvalidParams(format!("{size} is not a DSA size")));
        };
        parameter_size(bits)?;
        Ok(Box::new(DsaKeyGenerator { bits }))
    }

    fn spec_generator(&self, spec: &KeyParamSpec) -> CryptoResult<Box<dyn AsyKeySpecGeneratorSpi>> {
        let KeyParamSpec::Dsa(spec) = spec else {
            return Err(CryptoError::InvalidParams(format!(
                "{} spec given to the DSA backend",
                spec.algorithm_name()
            )));
        };
        let components = Components::from_components(
            biguint(&spec.common.p),
            biguint(&spec.common.q),
            biguint(&spec.common.g),
        )
        .map_err(|_| CryptoError::InvalidParams("DSA domain parameters rejected".into()))?;
        Ok(Box::new(DsaSpecGenerator {
            components,
            spec: spec.clone(),
        }))
    }
}

#[allow(deprecated)]
fn parameter_size(bits: u32) -> CryptoResult<dsa::KeySize> {
    match bits {
        1024 => Ok(dsa::KeySize::DSA_1024_160),
        2048 => Ok(dsa::KeySize::DSA_2048_256),
        3072 => Ok(dsa::KeySize::DSA_3072_256),
        other => Err(CryptoError::NotSupported(format!("DSA{other}"))),
    }
}

fn biguint(value: &BigInteger) -> BigUint {
    BigUint::from_bytes_be(value.as_bytes())
}

fn fixed(value: &BigUint, width_of: &BigUint) -> CryptoResult<BigInteger> {
    let bytes = Zeroizing::new(value.to_bytes_be());
    BigInteger::fixed_from(&bytes, width_of.bits().div_ceil(8))
}

fn domain_item(components: &Components, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
    match item {
        AsyKeySpecItem::DsaP => Ok(BigInteger::from(components.p().to_bytes_be())),
        AsyKeySpecItem::DsaQ => Ok(BigInteger::from(components.q().to_bytes_be())),
        AsyKeySpecItem::DsaG => fixed(components.g(), components.p()),
        other => Err(not_an_item(other)),
    }
}

pub(crate) struct DsaPub(VerifyingKey);

pub(crate) struct DsaPri(SigningKey);

impl PubKeySpi for DsaPub {
    fn algorithm(&self) -> &'static str {
        "DSA"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = self.0.to_public_key_der().map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        let components = self.0.components();
        match item {
            AsyKeySpecItem::DsaPk => fixed(self.0.y(), components.p()),
            other => domain_item(components, other),
        }
    }
}

impl PriKeySpi for DsaPri {
    fn algorithm(&self) -> &'static str {
        "DSA"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = self.0.to_pkcs8_der().map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        let public = self.0.verifying_key();
        let components = public.components();
        match item {
            AsyKeySpecItem::DsaSk => fixed(self.0.x(), components.q()),
            AsyKeySpecItem::DsaPk => fixed(public.y(), components.p()),
            other => domain_item(components, other),
        }
    }
}

fn key_pair(private: SigningKey) -> KeyPairSpi {
    KeyPairSpi {
        public: Box::new(DsaPub(private.verifying_key().clone())),
        private: Box::new(DsaPri(private)),
    }
}

struct DsaKeyGenerator {
    bits: u32,
}

impl AsyKeyGeneratorSpi for DsaKeyGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        let components = Components::generate(&mut OsRng, parameter_size(self.bits)?);
        let private = SigningKey::generate(&mut OsRng, components);
        debug!(bits = self.bits, "generated DSA key pair");
        Ok(key_pair(private))
    }

    fn convert_key(
        &self,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> CryptoResult<ConvertedKeys> {
        let public = public
            .map(|der| {
                VerifyingKey::from_public_key_der(der)
                    .map(|k| Box::new(DsaPub(k)) as Box<dyn PubKeySpi>)
                    .map_err(|e| CryptoError::InvalidParams(format!("bad DSA public key: {e}")))
            })
            .transpose()?;
        let private = private
            .map(|der| {
                SigningKey::from_pkcs8_der(der)
                    .map(|k| Box::new(DsaPri(k)) as Box<dyn PriKeySpi>)
                    .map_err(|e| CryptoError::InvalidParams(format!("bad DSA private key: {e}")))
            })
            .transpose()?;
        Ok(ConvertedKeys { public, private })
    }
}

struct DsaSpecGenerator {
    components: Components,
    spec: DsaKeySpec,
}

impl DsaSpecGenerator {
    fn verifying_key(&self, y: BigUint) -> CryptoResult<VerifyingKey> {
        VerifyingKey::from_components(self.components.clone(), y)
            .map_err(|_| CryptoError::InvalidParams("DSA public value rejected".into()))
    }

    fn public_key(&self) -> CryptoResult<Option<VerifyingKey>> {
        self.spec
            .public
            .as_ref()
            .map(|public| self.verifying_key(biguint(&public.pk)))
            .transpose()
    }

    /// Private key from `x`, deriving `y = g^x mod p` when no public value
    /// was supplied and checking it when one was.
    fn private_key(&self) -> CryptoResult<Option<SigningKey>> {
        let Some(private) = &self.spec.private else {
            return Ok(None);
        };
        let x = biguint(&private.sk);
        let y = self.components.g().modpow(&x, self.components.p());
        if let Some(public) = self.public_key()?
            && *public.y() != y
        {
            return Err(CryptoError::InvalidParams(
                "DSA public value does not match the private value".into(),
            ));
        }
        SigningKey::from_components(self.verifying_key(y)?, x)
            .map(Some)
            .map_err(|_| CryptoError::InvalidParams("DSA private value rejected".into()))
    }

    fn generated(&self) -> SigningKey {
        SigningKey::generate(&mut OsRng, self.components.clone())
    }
}

impl AsyKeySpecGeneratorSpi for DsaSpecGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        let private = match self.private_key()? {
            Some(private) => private,
            None => self.generated(),
        };
        Ok(key_pair(private))
    }

    fn generate_pub_key(&mut self) -> CryptoResult<Box<dyn PubKeySpi>> {
        let public = match self.public_key()? {
            Some(public) => public,
            None => self.generated().verifying_key().clone(),
        };
        Ok(Box::new(DsaPub(public)))
    }

    fn generate_pri_key(&mut self) -> CryptoResult<Box<dyn PriKeySpi>> {
        let private = match self.private_key()? {
            Some(private) => private,
            None => self.generated(),
        };
        Ok(Box::new(DsaPri(private)))
    }
}

/// DSA signer; signatures are DER `SEQUENCE { r, s }`.
pub(crate) struct DsaSignBackend {
    hasher: DigestBackend,
    key: Option<SigningKey>,
}

impl DsaSignBackend {
    pub(crate) fn new(md: DigestAlg) -> Self {
        Self {
            hasher: DigestBackend::new(md),
            key: None,
        }
    }
}

impl SignSpi for DsaSignBackend {
    fn init(&mut self, key: &dyn PriKeySpi) -> CryptoResult<()> {
        self.key = Some(downcast_pri::<DsaPri>(key)?.0.clone());
        self.hasher.reset();
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.hasher.update(data)
    }

    fn sign(&mut self, data: &[u8]) -> CryptoResult<Blob> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("DSA signer has no key".into()))?;
        self.hasher.update(data)?;
        let hashed = self.hasher.take_hash();
        let signature = key
            .sign_prehash(&hashed)
            .map_err(|_| CryptoError::OperationFailed("DSA signing failed".into()))?;
        Ok(Blob::from(signature.to_vec()))
    }
}

/// DSA verifier.
pub(crate) struct DsaVerifyBackend {
    hasher: DigestBackend,
    key: Option<VerifyingKey>,
}

impl DsaVerifyBackend {
    pub(crate) fn new(md: DigestAlg) -> Self {
        Self {
            hasher: DigestBackend::new(md),
            key: None,
        }
    }
}

impl VerifySpi for DsaVerifyBackend {
    fn init(&mut self, key: &dyn PubKeySpi) -> CryptoResult<()> {
        self.key = Some(downcast_pub::<DsaPub>(key)?.0.clone());
        self.hasher.reset();
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.hasher.update(data)
    }

    fn verify(&mut self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("DSA verifier has no key".into()))?;
        self.hasher.update(data)?;
        let hashed = self.hasher.take_hash();
        Ok(dsa::Signature::try_from(signature)
            .is_ok_and(|sig| key.verify_prehash(&hashed, &sig).is_ok()))
    }
}

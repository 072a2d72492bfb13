//! Ed25519 signatures and X25519 key agreement.

use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{Signer, Verifier};
use rand::rngs::OsRng;
use tracing::debug;
use veil_core::spec::{CURVE25519_KEY_LEN, Curve25519KeySpec};
use veil_core::{
    AsyKeySpecItem, BigInteger, Blob, CryptoError, CryptoResult, Family, KeyParamSpec, KeySize,
    Primes,
};
use zeroize::Zeroizing;

use super::AsyKeyBackend;
use crate::spi::{
    AsyKeyGeneratorSpi, AsyKeySpecGeneratorSpi, ConvertedKeys, KeyAgreementSpi, KeyPairSpi,
    PriKeySpi, PubKeySpi, SignSpi, VerifySpi, downcast_pri, downcast_pub, not_an_item,
};

/// SubjectPublicKeyInfo header for an X25519 key (OID 1.3.101.110).
const X25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

/// PKCS#8 v1 header for an X25519 key.
const X25519_PKCS8_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x04, 0x22, 0x04, 0x20,
];

fn key_bytes(value: &BigInteger, what: &str) -> CryptoResult<Zeroizing<[u8; CURVE25519_KEY_LEN]>> {
    let bytes: [u8; CURVE25519_KEY_LEN] = value.as_bytes().try_into().map_err(|_| {
        CryptoError::InvalidParams(format!("{what} must be {CURVE25519_KEY_LEN} bytes"))
    })?;
    Ok(Zeroizing::new(bytes))
}

fn strip_prefix<'a>(der: &'a [u8], prefix: &[u8], what: &str) -> CryptoResult<&'a [u8; CURVE25519_KEY_LEN]> {
    der.strip_prefix(prefix)
        .and_then(|rest| <&[u8; CURVE25519_KEY_LEN]>::try_from(rest).ok())
        .ok_or_else(|| CryptoError::InvalidParams(format!("bad X25519 {what}")))
}

pub(crate) struct Curve25519Backend {
    family: Family,
}

pub(crate) static ED25519_BACKEND: Curve25519Backend = Curve25519Backend {
    family: Family::Ed25519,
};

pub(crate) static X25519_BACKEND: Curve25519Backend = Curve25519Backend {
    family: Family::X25519,
};

impl AsyKeyBackend for Curve25519Backend {
    fn generator(&self, size: KeySize, _primes: Primes) -> CryptoResult<Box<dyn AsyKeyGeneratorSpi>> {
        if size.family() != self.family {
            return Err(CryptoError::InvalidParams(format!(
                "{size} given to the {} backend",
                self.family
            )));
        }
        match self.family {
            Family::Ed25519 => Ok(Box::new(Ed25519KeyGenerator)),
            _ => Ok(Box::new(X25519KeyGenerator)),
        }
    }

    fn spec_generator(&self, spec: &KeyParamSpec) -> CryptoResult<Box<dyn AsyKeySpecGeneratorSpi>> {
        match (self.family, spec) {
            (Family::Ed25519, KeyParamSpec::Ed25519(spec)) => {
                Ok(Box::new(Ed25519SpecGenerator { spec: spec.clone() }))
            },
            (Family::X25519, KeyParamSpec::X25519(spec)) => {
                Ok(Box::new(X25519SpecGenerator { spec: spec.clone() }))
            },
            _ => Err(CryptoError::InvalidParams(format!(
                "{} spec given to the {} backend",
                spec.algorithm_name(),
                self.family
            ))),
        }
    }
}

// Ed25519

pub(crate) struct Ed25519Pub(ed25519_dalek::VerifyingKey);

pub(crate) struct Ed25519Pri(ed25519_dalek::SigningKey);

impl PubKeySpi for Ed25519Pub {
    fn algorithm(&self) -> &'static str {
        "Ed25519"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = self.0.to_public_key_der().map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::Ed25519Pk => Ok(BigInteger::from_be_bytes(self.0.as_bytes())),
            other => Err(not_an_item(other)),
        }
    }
}

impl PriKeySpi for Ed25519Pri {
    fn algorithm(&self) -> &'static str {
        "Ed25519"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = self.0.to_pkcs8_der().map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::Ed25519Sk => Ok(BigInteger::from_be_bytes(self.0.as_bytes())),
            AsyKeySpecItem::Ed25519Pk => {
                Ok(BigInteger::from_be_bytes(self.0.verifying_key().as_bytes()))
            },
            other => Err(not_an_item(other)),
        }
    }
}

fn ed25519_pair(private: ed25519_dalek::SigningKey) -> KeyPairSpi {
    KeyPairSpi {
        public: Box::new(Ed25519Pub(private.verifying_key())),
        private: Box::new(Ed25519Pri(private)),
    }
}

struct Ed25519KeyGenerator;

impl AsyKeyGeneratorSpi for Ed25519KeyGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        debug!("generated Ed25519 key pair");
        Ok(ed25519_pair(ed25519_dalek::SigningKey::generate(&mut OsRng)))
    }

    fn convert_key(
        &self,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> CryptoResult<ConvertedKeys> {
        let public = public
            .map(|der| {
                ed25519_dalek::VerifyingKey::from_public_key_der(der)
                    .map(|k| Box::new(Ed25519Pub(k)) as Box<dyn PubKeySpi>)
                    .map_err(|e| CryptoError::InvalidParams(format!("bad Ed25519 public key: {e}")))
            })
            .transpose()?;
        let private = private
            .map(|der| {
                ed25519_dalek::SigningKey::from_pkcs8_der(der)
                    .map(|k| Box::new(Ed25519Pri(k)) as Box<dyn PriKeySpi>)
                    .map_err(|e| CryptoError::InvalidParams(format!("bad Ed25519 private key: {e}")))
            })
            .transpose()?;
        Ok(ConvertedKeys { public, private })
    }
}

struct Ed25519SpecGenerator {
    spec: Curve25519KeySpec,
}

impl Ed25519SpecGenerator {
    fn public_key(&self) -> CryptoResult<Option<ed25519_dalek::VerifyingKey>> {
        let Some(public) = &self.spec.public else {
            return Ok(None);
        };
        let bytes = key_bytes(&public.pk, "Ed25519 public key")?;
        ed25519_dalek::VerifyingKey::from_bytes(&*bytes)
            .map(Some)
            .map_err(|_| CryptoError::InvalidParams("Ed25519 public key is not a curve point".into()))
    }

    fn private_key(&self) -> CryptoResult<Option<ed25519_dalek::SigningKey>> {
        let Some(private) = &self.spec.private else {
            return Ok(None);
        };
        let bytes = key_bytes(&private.sk, "Ed25519 private key")?;
        let key = ed25519_dalek::SigningKey::from_bytes(&*bytes);
        if let Some(public) = self.public_key()?
            && key.verifying_key() != public
        {
            return Err(CryptoError::InvalidParams(
                "Ed25519 public key does not match the private key".into(),
            ));
        }
        Ok(Some(key))
    }
}

impl AsyKeySpecGeneratorSpi for Ed25519SpecGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        let private = self
            .private_key()?
            .unwrap_or_else(|| ed25519_dalek::SigningKey::generate(&mut OsRng));
        Ok(ed25519_pair(private))
    }

    fn generate_pub_key(&mut self) -> CryptoResult<Box<dyn PubKeySpi>> {
        let public = self
            .public_key()?
            .unwrap_or_else(|| ed25519_dalek::SigningKey::generate(&mut OsRng).verifying_key());
        Ok(Box::new(Ed25519Pub(public)))
    }

    fn generate_pri_key(&mut self) -> CryptoResult<Box<dyn PriKeySpi>> {
        let private = self
            .private_key()?
            .unwrap_or_else(|| ed25519_dalek::SigningKey::generate(&mut OsRng));
        Ok(Box::new(Ed25519Pri(private)))
    }
}

fn one_shot() -> CryptoError {
    CryptoError::NotSupported("Ed25519 signs the whole message in one call".into())
}

/// Ed25519 signer. Pure EdDSA, so the message is passed whole to `sign`.
#[derive(Default)]
pub(crate) struct Ed25519SignBackend {
    key: Option<ed25519_dalek::SigningKey>,
}

impl SignSpi for Ed25519SignBackend {
    fn init(&mut self, key: &dyn PriKeySpi) -> CryptoResult<()> {
        self.key = Some(downcast_pri::<Ed25519Pri>(key)?.0.clone());
        Ok(())
    }

    fn update(&mut self, _data: &[u8]) -> CryptoResult<()> {
        Err(one_shot())
    }

    fn sign(&mut self, data: &[u8]) -> CryptoResult<Blob> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("Ed25519 signer has no key".into()))?;
        Blob::copy_from(&key.sign(data).to_bytes())
    }
}

/// Ed25519 verifier.
#[derive(Default)]
pub(crate) struct Ed25519VerifyBackend {
    key: Option<ed25519_dalek::VerifyingKey>,
}

impl VerifySpi for Ed25519VerifyBackend {
    fn init(&mut self, key: &dyn PubKeySpi) -> CryptoResult<()> {
        self.key = Some(downcast_pub::<Ed25519Pub>(key)?.0);
        Ok(())
    }

    fn update(&mut self, _data: &[u8]) -> CryptoResult<()> {
        Err(one_shot())
    }

    fn verify(&mut self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("Ed25519 verifier has no key".into()))?;
        Ok(ed25519_dalek::Signature::from_slice(signature)
            .is_ok_and(|sig| key.verify(data, &sig).is_ok()))
    }
}

// X25519

pub(crate) struct X25519Pub(x25519_dalek::PublicKey);

pub(crate) struct X25519Pri(x25519_dalek::StaticSecret);

impl PubKeySpi for X25519Pub {
    fn algorithm(&self) -> &'static str {
        "X25519"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let mut der = Blob::with_capacity(X25519_SPKI_PREFIX.len().saturating_add(CURVE25519_KEY_LEN))?;
        der.extend_from_slice(&X25519_SPKI_PREFIX)?;
        der.extend_from_slice(self.0.as_bytes())?;
        Ok(der)
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::X25519Pk => Ok(BigInteger::from_be_bytes(self.0.as_bytes())),
            other => Err(not_an_item(other)),
        }
    }
}

impl PriKeySpi for X25519Pri {
    fn algorithm(&self) -> &'static str {
        "X25519"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let mut der = Blob::with_capacity(X25519_PKCS8_PREFIX.len().saturating_add(CURVE25519_KEY_LEN))?;
        der.extend_from_slice(&X25519_PKCS8_PREFIX)?;
        der.extend_from_slice(self.0.as_bytes())?;
        Ok(der)
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::X25519Sk => Ok(BigInteger::from_be_bytes(self.0.as_bytes())),
            AsyKeySpecItem::X25519Pk => Ok(BigInteger::from_be_bytes(
                x25519_dalek::PublicKey::from(&self.0).as_bytes(),
            )),
            other => Err(not_an_item(other)),
        }
    }
}

fn x25519_pair(private: x25519_dalek::StaticSecret) -> KeyPairSpi {
    KeyPairSpi {
        public: Box::new(X25519Pub(x25519_dalek::PublicKey::from(&private))),
        private: Box::new(X25519Pri(private)),
    }
}

fn x25519_random() -> x25519_dalek::StaticSecret {
    x25519_dalek::StaticSecret::random_from_rng(OsRng)
}

struct X25519KeyGenerator;

impl AsyKeyGeneratorSpi for X25519KeyGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        debug!("generated X25519 key pair");
        Ok(x25519_pair(x25519_random()))
    }

    fn convert_key(
        &self,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> CryptoResult<ConvertedKeys> {
        let public = public
            .map(|der| {
                let bytes = strip_prefix(der, &X25519_SPKI_PREFIX, "public key")?;
                Ok::<_, CryptoError>(
                    Box::new(X25519Pub(x25519_dalek::PublicKey::from(*bytes))) as Box<dyn PubKeySpi>
                )
            })
            .transpose()?;
        let private = private
            .map(|der| {
                let bytes = Zeroizing::new(*strip_prefix(der, &X25519_PKCS8_PREFIX, "private key")?);
                Ok::<_, CryptoError>(
                    Box::new(X25519Pri(x25519_dalek::StaticSecret::from(*bytes))) as Box<dyn PriKeySpi>
                )
            })
            .transpose()?;
        Ok(ConvertedKeys { public, private })
    }
}

struct X25519SpecGenerator {
    spec: Curve25519KeySpec,
}

impl X25519SpecGenerator {
    fn public_key(&self) -> CryptoResult<Option<x25519_dalek::PublicKey>> {
        let Some(public) = &self.spec.public else {
            return Ok(None);
        };
        let bytes = key_bytes(&public.pk, "X25519 public key")?;
        Ok(Some(x25519_dalek::PublicKey::from(*bytes)))
    }

    fn private_key(&self) -> CryptoResult<Option<x25519_dalek::StaticSecret>> {
        let Some(private) = &self.spec.private else {
            return Ok(None);
        };
        let key = x25519_dalek::StaticSecret::from(*key_bytes(&private.sk, "X25519 private key")?);
        if let Some(public) = self.public_key()?
            && x25519_dalek::PublicKey::from(&key) != public
        {
            return Err(CryptoError::InvalidParams(
                "X25519 public key does not match the private key".into(),
            ));
        }
        Ok(Some(key))
    }
}

impl AsyKeySpecGeneratorSpi for X25519SpecGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        Ok(x25519_pair(self.private_key()?.unwrap_or_else(x25519_random)))
    }

    fn generate_pub_key(&mut self) -> CryptoResult<Box<dyn PubKeySpi>> {
        let public = match self.public_key()? {
            Some(public) => public,
            None => x25519_dalek::PublicKey::from(&x25519_random()),
        };
        Ok(Box::new(X25519Pub(public)))
    }

    fn generate_pri_key(&mut self) -> CryptoResult<Box<dyn PriKeySpi>> {
        Ok(Box::new(X25519Pri(
            self.private_key()?.unwrap_or_else(x25519_random),
        )))
    }
}

/// X25519 agreement; low-order peer points are rejected.
pub(crate) struct X25519AgreementBackend;

impl KeyAgreementSpi for X25519AgreementBackend {
    fn generate_secret(
        &mut self,
        private: &dyn PriKeySpi,
        public: &dyn PubKeySpi,
    ) -> CryptoResult<Blob> {
        let private = downcast_pri::<X25519Pri>(private)?;
        let public = downcast_pub::<X25519Pub>(public)?;
        let shared = private.0.diffie_hellman(&public.0);
        if !shared.was_contributory() {
            return Err(CryptoError::OperationFailed(
                "X25519 peer key is a low-order point".into(),
            ));
        }
        Blob::copy_from(shared.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x25519_der_round_trip() {
        let pair = X25519KeyGenerator.generate_key_pair().unwrap();
        let public_der = pair.public.encoded().unwrap();
        let private_der = pair.private.encoded().unwrap();
        assert_eq!(public_der.len(), 44);
        assert_eq!(private_der.len(), 48);

        let converted = X25519KeyGenerator
            .convert_key(Some(public_der.as_slice()), Some(private_der.as_slice()))
            .unwrap();
        assert_eq!(
            converted.public.unwrap().big_integer(AsyKeySpecItem::X25519Pk).unwrap(),
            pair.public.big_integer(AsyKeySpecItem::X25519Pk).unwrap()
        );
    }

    #[test]
    fn test_x25519_rejects_truncated_der() {
        let pair = X25519KeyGenerator.generate_key_pair().unwrap();
        let der = pair.public.encoded().unwrap();
        assert!(X25519KeyGenerator.convert_key(Some(&der[..40]), None).is_err());
    }

    #[test]
    fn test_ed25519_update_not_supported() {
        let mut signer = Ed25519SignBackend::default();
        assert!(matches!(signer.update(b"x"), Err(CryptoError::NotSupported(_))));
    }

    #[test]
    fn test_low_order_point_rejected() {
        let pair = X25519KeyGenerator.generate_key_pair().unwrap();
        let zero = X25519Pub(x25519_dalek::PublicKey::from([0u8; 32]));
        let err = X25519AgreementBackend
            .generate_secret(pair.private.as_ref(), &zero)
            .unwrap_err();
        assert!(matches!(err, CryptoError::OperationFailed(_)));
    }

    #[test]
    fn test_wrong_family_spec_rejected() {
        let spec = KeyParamSpec::X25519(Curve25519KeySpec::common(
            veil_core::spec::Curve25519Common,
        ));
        assert!(ED25519_BACKEND.spec_generator(&spec).is_err());
    }
}

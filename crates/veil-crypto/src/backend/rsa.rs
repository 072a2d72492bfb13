//! RSA over the `rsa` crate: key generation, key specs, PKCS#1 v1.5 and
//! PSS signatures, PKCS#1 v1.5 and OAEP encryption.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use tracing::debug;
use veil_core::spec::RsaKeySpec;
use veil_core::{
    AsyKeySpecItem, BigInteger, Blob, CryptoError, CryptoResult, DigestAlg, KeyParamSpec, KeySize,
    Primes,
};
use zeroize::Zeroizing;

use super::AsyKeyBackend;
use super::digest::{DigestBackend, dyn_digest, with_digest};
use crate::cipher::{CryptoMode, ParamsSpec};
use crate::signature::SignSpecItem;
use crate::spi::{
    AsyKeyGeneratorSpi, AsyKeySpecGeneratorSpi, CipherKeyRef, CipherSpi, ConvertedKeys,
    KeyPairSpi, MdSpi, PriKeySpi, PubKeySpi, SignSpi, VerifySpi, downcast_pri, downcast_pub,
    not_an_item,
};

/// Smallest and largest modulus sizes the generator accepts.
const MIN_BITS: u32 = 512;
const MAX_BITS: u32 = 8192;

/// Public exponent used for generated keys.
const DEFAULT_EXPONENT: u64 = 65_537;

/// PSS trailer field; only the 0xbc trailer exists.
const PSS_TRAILER_FIELD: i32 = 1;

pub(crate) struct RsaBackend;

impl AsyKeyBackend for RsaBackend {
    fn generator(&self, size: KeySize, primes: Primes) -> CryptoResult<Box<dyn AsyKeyGeneratorSpi>> {
        let KeySize::Rsa(bits) = size else {
            return Err(CryptoError::InvalidParams(format!("{size} is not an RSA size")));
        };
        if !(MIN_BITS..=MAX_BITS).contains(&bits) {
            return Err(CryptoError::InvalidParams(format!(
                "RSA modulus of {bits} bits is outside {MIN_BITS}..={MAX_BITS}"
            )));
        }
        if primes.count() > Primes::max_for_rsa_bits(bits).count() {
            return Err(CryptoError::InvalidParams(format!(
                "RSA{bits} allows at most {} primes",
                Primes::max_for_rsa_bits(bits).count()
            )));
        }
        if primes != Primes::Two {
            return Err(CryptoError::NotSupported(format!(
                "multi-prime RSA with {} primes",
                primes.count()
            )));
        }
        Ok(Box::new(RsaKeyGenerator { bits }))
    }

    fn spec_generator(&self, spec: &KeyParamSpec) -> CryptoResult<Box<dyn AsyKeySpecGeneratorSpi>> {
        let KeyParamSpec::Rsa(spec) = spec else {
            return Err(CryptoError::InvalidParams(format!(
                "{} spec given to the RSA backend",
                spec.algorithm_name()
            )));
        };
        Ok(Box::new(RsaSpecGenerator { spec: spec.clone() }))
    }
}

pub(crate) struct RsaPub(pub(crate) RsaPublicKey);

pub(crate) struct RsaPri(pub(crate) RsaPrivateKey);

impl PubKeySpi for RsaPub {
    fn algorithm(&self) -> &'static str {
        "RSA"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = self.0.to_public_key_der().map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::RsaN => Ok(BigInteger::from(self.0.n().to_bytes_be())),
            AsyKeySpecItem::RsaPk => Ok(BigInteger::from(self.0.e().to_bytes_be())),
            other => Err(not_an_item(other)),
        }
    }
}

impl PriKeySpi for RsaPri {
    fn algorithm(&self) -> &'static str {
        "RSA"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = self.0.to_pkcs8_der().map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        let width = self.0.size();
        match item {
            AsyKeySpecItem::RsaN => Ok(BigInteger::from(self.0.n().to_bytes_be())),
            AsyKeySpecItem::RsaPk => Ok(BigInteger::from(self.0.e().to_bytes_be())),
            AsyKeySpecItem::RsaSk => {
                let d = Zeroizing::new(self.0.d().to_bytes_be());
                BigInteger::fixed_from(&d, width)
            },
            other => Err(not_an_item(other)),
        }
    }
}

fn key_pair(private: RsaPrivateKey) -> KeyPairSpi {
    KeyPairSpi {
        public: Box::new(RsaPub(private.to_public_key())),
        private: Box::new(RsaPri(private)),
    }
}

struct RsaKeyGenerator {
    bits: u32,
}

impl AsyKeyGeneratorSpi for RsaKeyGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        let bits = usize::try_from(self.bits).map_err(CryptoError::backend)?;
        let exponent = BigUint::from(DEFAULT_EXPONENT);
        let private = RsaPrivateKey::new_with_exp(&mut OsRng, bits, &exponent)
            .map_err(CryptoError::backend)?;
        debug!(bits = self.bits, "generated RSA key pair");
        Ok(key_pair(private))
    }

    fn convert_key(
        &self,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> CryptoResult<ConvertedKeys> {
        let public = public
            .map(|der| {
                RsaPublicKey::from_public_key_der(der)
                    .map(|k| Box::new(RsaPub(k)) as Box<dyn PubKeySpi>)
                    .map_err(|e| CryptoError::InvalidParams(format!("bad RSA public key: {e}")))
            })
            .transpose()?;
        let private = private
            .map(|der| {
                RsaPrivateKey::from_pkcs8_der(der)
                    .map(|k| Box::new(RsaPri(k)) as Box<dyn PriKeySpi>)
                    .map_err(|e| CryptoError::InvalidParams(format!("bad RSA private key: {e}")))
            })
            .transpose()?;
        Ok(ConvertedKeys { public, private })
    }
}

struct RsaSpecGenerator {
    spec: RsaKeySpec,
}

impl RsaSpecGenerator {
    fn require_exponents(&self) -> CryptoResult<()> {
        if self.spec.public.is_none() {
            return Err(CryptoError::InvalidParams(
                "RSA keys cannot be generated from a modulus alone".into(),
            ));
        }
        Ok(())
    }

    fn public_key(&self) -> CryptoResult<RsaPublicKey> {
        let public = self.spec.public.as_ref().ok_or_else(|| {
            CryptoError::InvalidParams("RSA spec has no public exponent".into())
        })?;
        RsaPublicKey::new_with_max_size(
            biguint(&self.spec.common.n),
            biguint(&public.e),
            usize::try_from(MAX_BITS).map_err(CryptoError::backend)?,
        )
        .map_err(|e| CryptoError::InvalidParams(format!("RSA public components rejected: {e}")))
    }

    fn private_key(&self) -> CryptoResult<RsaPrivateKey> {
        let (Some(public), Some(private)) = (&self.spec.public, &self.spec.private) else {
            return Err(CryptoError::InvalidParams(
                "RSA private key needs both exponents".into(),
            ));
        };
        RsaPrivateKey::from_components(
            biguint(&self.spec.common.n),
            biguint(&public.e),
            biguint(&private.d),
            Vec::new(),
        )
        .map_err(|e| CryptoError::InvalidParams(format!("RSA private components rejected: {e}")))
    }
}

impl AsyKeySpecGeneratorSpi for RsaSpecGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        self.require_exponents()?;
        Ok(key_pair(self.private_key()?))
    }

    fn generate_pub_key(&mut self) -> CryptoResult<Box<dyn PubKeySpi>> {
        self.require_exponents()?;
        Ok(Box::new(RsaPub(self.public_key()?)))
    }

    fn generate_pri_key(&mut self) -> CryptoResult<Box<dyn PriKeySpi>> {
        self.require_exponents()?;
        Ok(Box::new(RsaPri(self.private_key()?)))
    }
}

fn biguint(value: &BigInteger) -> BigUint {
    BigUint::from_bytes_be(value.as_bytes())
}

// Signatures

/// Padding-specific half of an RSA signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RsaSignPadding {
    Pkcs1,
    Pss { mgf1: DigestAlg, salt_len: usize },
}

struct RsaSignParams {
    md: DigestAlg,
    padding: RsaSignPadding,
}

impl RsaSignParams {
    fn new(md: DigestAlg, padding: RsaSignPadding) -> CryptoResult<Self> {
        match padding {
            RsaSignPadding::Pkcs1 => {
                pkcs1_scheme(md)?;
            },
            RsaSignPadding::Pss { mgf1, .. } if mgf1 != md => {
                return Err(CryptoError::NotSupported(format!(
                    "PSS with MGF1_{mgf1} over {md}"
                )));
            },
            RsaSignPadding::Pss { .. } => {},
        }
        Ok(Self { md, padding })
    }

    fn sign(&self, key: &RsaPrivateKey, hashed: &[u8]) -> CryptoResult<Vec<u8>> {
        let signature = match self.padding {
            RsaSignPadding::Pkcs1 => key.sign(pkcs1_scheme(self.md)?, hashed),
            RsaSignPadding::Pss { salt_len, .. } => {
                key.sign_with_rng(&mut OsRng, pss_scheme(self.md, salt_len), hashed)
            },
        };
        signature.map_err(CryptoError::backend)
    }

    fn verify(&self, key: &RsaPublicKey, hashed: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let result = match self.padding {
            RsaSignPadding::Pkcs1 => key.verify(pkcs1_scheme(self.md)?, hashed, signature),
            RsaSignPadding::Pss { salt_len, .. } => {
                key.verify(pss_scheme(self.md, salt_len), hashed, signature)
            },
        };
        Ok(result.is_ok())
    }

    fn set_spec_int(&mut self, item: SignSpecItem, value: i32) -> CryptoResult<()> {
        match (&mut self.padding, item) {
            (RsaSignPadding::Pss { salt_len, .. }, SignSpecItem::PssSaltLen) => {
                *salt_len = usize::try_from(value).map_err(|_| {
                    CryptoError::InvalidParams(format!("PSS salt length {value} is negative"))
                })?;
                Ok(())
            },
            _ => Err(CryptoError::InvalidParams(format!(
                "{item:?} cannot be set on this signature"
            ))),
        }
    }

    fn spec_int(&self, item: SignSpecItem) -> CryptoResult<i32> {
        match (self.padding, item) {
            (RsaSignPadding::Pss { salt_len, .. }, SignSpecItem::PssSaltLen) => {
                i32::try_from(salt_len).map_err(CryptoError::backend)
            },
            (RsaSignPadding::Pss { .. }, SignSpecItem::PssTrailerField) => Ok(PSS_TRAILER_FIELD),
            _ => Err(CryptoError::InvalidParams(format!(
                "{item:?} is not an integer parameter of this signature"
            ))),
        }
    }

    fn spec_string(&self, item: SignSpecItem) -> CryptoResult<String> {
        match (self.padding, item) {
            (RsaSignPadding::Pss { .. }, SignSpecItem::PssMdName) => Ok(self.md.name().into()),
            (RsaSignPadding::Pss { .. }, SignSpecItem::PssMgfName) => Ok("MGF1".into()),
            (RsaSignPadding::Pss { mgf1, .. }, SignSpecItem::PssMgf1MdName) => {
                Ok(mgf1.name().into())
            },
            _ => Err(CryptoError::InvalidParams(format!(
                "{item:?} is not a string parameter of this signature"
            ))),
        }
    }
}

fn pkcs1_scheme(md: DigestAlg) -> CryptoResult<Pkcs1v15Sign> {
    Ok(match md {
        DigestAlg::Md5 => Pkcs1v15Sign::new::<md5::Md5>(),
        DigestAlg::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        DigestAlg::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
        DigestAlg::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        DigestAlg::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        DigestAlg::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        DigestAlg::Sm3 => {
            return Err(CryptoError::NotSupported("RSA PKCS1 signatures over SM3".into()));
        },
    })
}

fn pss_scheme(md: DigestAlg, salt_len: usize) -> Pss {
    with_digest!(md, D => Pss::new_with_salt::<D>(salt_len))
}

pub(crate) struct RsaSignBackend {
    params: RsaSignParams,
    hasher: DigestBackend,
    key: Option<RsaPrivateKey>,
}

impl RsaSignBackend {
    pub(crate) fn new(md: DigestAlg, padding: RsaSignPadding) -> CryptoResult<Self> {
        Ok(Self {
            params: RsaSignParams::new(md, padding)?,
            hasher: DigestBackend::new(md),
            key: None,
        })
    }
}

impl SignSpi for RsaSignBackend {
    fn init(&mut self, key: &dyn PriKeySpi) -> CryptoResult<()> {
        self.key = Some(downcast_pri::<RsaPri>(key)?.0.clone());
        self.hasher = DigestBackend::new(self.hasher.alg());
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.hasher.update(data)
    }

    fn sign(&mut self, data: &[u8]) -> CryptoResult<Blob> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("RSA signer has no key".into()))?;
        self.hasher.update(data)?;
        let hashed = self.hasher.take_hash();
        self.params.sign(key, &hashed).map(Blob::from)
    }

    fn set_spec_int(&mut self, item: SignSpecItem, value: i32) -> CryptoResult<()> {
        self.params.set_spec_int(item, value)
    }

    fn spec_int(&self, item: SignSpecItem) -> CryptoResult<i32> {
        self.params.spec_int(item)
    }

    fn spec_string(&self, item: SignSpecItem) -> CryptoResult<String> {
        self.params.spec_string(item)
    }
}

pub(crate) struct RsaVerifyBackend {
    params: RsaSignParams,
    hasher: DigestBackend,
    key: Option<RsaPublicKey>,
}

impl RsaVerifyBackend {
    pub(crate) fn new(md: DigestAlg, padding: RsaSignPadding) -> CryptoResult<Self> {
        Ok(Self {
            params: RsaSignParams::new(md, padding)?,
            hasher: DigestBackend::new(md),
            key: None,
        })
    }
}

impl VerifySpi for RsaVerifyBackend {
    fn init(&mut self, key: &dyn PubKeySpi) -> CryptoResult<()> {
        self.key = Some(downcast_pub::<RsaPub>(key)?.0.clone());
        self.hasher = DigestBackend::new(self.hasher.alg());
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.hasher.update(data)
    }

    fn verify(&mut self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("RSA verifier has no key".into()))?;
        self.hasher.update(data)?;
        let hashed = self.hasher.take_hash();
        self.params.verify(key, &hashed, signature)
    }

    fn set_spec_int(&mut self, item: SignSpecItem, value: i32) -> CryptoResult<()> {
        self.params.set_spec_int(item, value)
    }

    fn spec_int(&self, item: SignSpecItem) -> CryptoResult<i32> {
        self.params.spec_int(item)
    }

    fn spec_string(&self, item: SignSpecItem) -> CryptoResult<String> {
        self.params.spec_string(item)
    }
}

// Encryption

/// Padding-specific half of an RSA cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RsaCipherPadding {
    Pkcs1,
    Oaep { md: DigestAlg, mgf1: DigestAlg },
}

enum RsaCipherKey {
    Encrypt(RsaPublicKey),
    Decrypt(RsaPrivateKey),
}

/// Buffers input and runs one RSA operation in `do_final`.
pub(crate) struct RsaCipherBackend {
    padding: RsaCipherPadding,
    key: Option<RsaCipherKey>,
    buffer: Zeroizing<Vec<u8>>,
}

impl RsaCipherBackend {
    pub(crate) fn new(padding: RsaCipherPadding) -> Self {
        Self {
            padding,
            key: None,
            buffer: Zeroizing::new(Vec::new()),
        }
    }

    fn oaep(md: DigestAlg, mgf1: DigestAlg) -> Oaep {
        Oaep {
            digest: dyn_digest(md),
            mgf_digest: dyn_digest(mgf1),
            label: None,
        }
    }
}

impl CipherSpi for RsaCipherBackend {
    fn init(
        &mut self,
        mode: CryptoMode,
        key: CipherKeyRef<'_>,
        _params: Option<&ParamsSpec>,
    ) -> CryptoResult<()> {
        let key = match (mode, key) {
            (CryptoMode::Encrypt, CipherKeyRef::Public(key)) => {
                RsaCipherKey::Encrypt(downcast_pub::<RsaPub>(key)?.0.clone())
            },
            (CryptoMode::Decrypt, CipherKeyRef::Private(key)) => {
                RsaCipherKey::Decrypt(downcast_pri::<RsaPri>(key)?.0.clone())
            },
            (CryptoMode::Encrypt, _) => {
                return Err(CryptoError::InvalidParams(
                    "RSA encryption needs a public key".into(),
                ));
            },
            (CryptoMode::Decrypt, _) => {
                return Err(CryptoError::InvalidParams(
                    "RSA decryption needs a private key".into(),
                ));
            },
        };
        self.key = Some(key);
        self.buffer.clear();
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> CryptoResult<Blob> {
        if self.key.is_none() {
            return Err(CryptoError::InvalidParams("cipher is not initialized".into()));
        }
        self.buffer.try_reserve(input.len())?;
        self.buffer.extend_from_slice(input);
        Ok(Blob::new())
    }

    fn do_final(&mut self, input: &[u8]) -> CryptoResult<Blob> {
        let key = self
            .key
            .take()
            .ok_or_else(|| CryptoError::InvalidParams("cipher is not initialized".into()))?;
        self.buffer.try_reserve(input.len())?;
        self.buffer.extend_from_slice(input);
        let message = std::mem::take(&mut *self.buffer);
        let message = Zeroizing::new(message);

        let output = match (key, self.padding) {
            (RsaCipherKey::Encrypt(key), RsaCipherPadding::Pkcs1) => {
                key.encrypt(&mut OsRng, Pkcs1v15Encrypt, &message)
            },
            (RsaCipherKey::Encrypt(key), RsaCipherPadding::Oaep { md, mgf1 }) => {
                key.encrypt(&mut OsRng, Self::oaep(md, mgf1), &message)
            },
            (RsaCipherKey::Decrypt(key), RsaCipherPadding::Pkcs1) => {
                key.decrypt(Pkcs1v15Encrypt, &message)
            },
            (RsaCipherKey::Decrypt(key), RsaCipherPadding::Oaep { md, mgf1 }) => {
                key.decrypt(Self::oaep(md, mgf1), &message)
            },
        };
        output.map(Blob::from).map_err(CryptoError::backend)
    }
}

//! ECC over NIST P-256 and P-384: key generation, key specs, ECDSA and
//! ECDH.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;
use tracing::debug;
use veil_core::spec::{EccCommon, EccKeySpec, EcPoint};
use veil_core::{
    AsyKeySpecItem, BigInteger, Blob, CryptoError, CryptoResult, DigestAlg, EcCurve, KeyParamSpec,
    KeySize, Primes,
};

use super::AsyKeyBackend;
use super::digest::DigestBackend;
use crate::spi::{
    AsyKeyGeneratorSpi, AsyKeySpecGeneratorSpi, ConvertedKeys, KeyAgreementSpi, KeyPairSpi, MdSpi,
    PriKeySpi, PubKeySpi, SignSpi, VerifySpi, downcast_pri, downcast_pub, not_an_item,
};

/// Domain parameters of a named prime curve, big-endian hex.
struct CurveParams {
    p: &'static str,
    a: &'static str,
    b: &'static str,
    gx: &'static str,
    gy: &'static str,
    n: &'static str,
}

const P256_PARAMS: CurveParams = CurveParams {
    p: "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
    a: "ffffffff00000001000000000000000000000000fffffffffffffffffffffffc",
    b: "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b",
    gx: "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296",
    gy: "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5",
    n: "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551",
};

const P384_PARAMS: CurveParams = CurveParams {
    p: "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffff0000000000000000ffffffff",
    a: "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffff0000000000000000fffffffc",
    b: "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875ac656398d8a2ed19d2a85c8edd3ec2aef",
    gx: "aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a385502f25dbf55296c3a545e3872760ab7",
    gy: "3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c00a60b1ce1d7e819d7a431d7c90ea0e5f",
    n: "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf581a0db248b0a77aecec196accc52973",
};

fn params_for(curve: EcCurve) -> CryptoResult<&'static CurveParams> {
    match curve {
        EcCurve::P256 => Ok(&P256_PARAMS),
        EcCurve::P384 => Ok(&P384_PARAMS),
        EcCurve::P224 | EcCurve::P521 => Err(unsupported_curve(curve)),
    }
}

fn unsupported_curve(curve: EcCurve) -> CryptoError {
    CryptoError::NotSupported(format!("ECC curve {}", curve.name()))
}

fn decode_param(hex_value: &str) -> CryptoResult<BigInteger> {
    hex::decode(hex_value)
        .map(BigInteger::from)
        .map_err(CryptoError::backend)
}

/// Which named curve `common` describes, if it is one this backend knows.
fn match_curve(common: &EccCommon) -> CryptoResult<EcCurve> {
    let curve = common.curve_for_width().ok_or_else(|| {
        CryptoError::NotSupported(format!("ECC field of {} bits", common.field_bits()))
    })?;
    let params = params_for(curve)?;
    let matches = common.h == 1
        && common.p == decode_param(params.p)?
        && common.a == decode_param(params.a)?
        && common.b == decode_param(params.b)?
        && common.g.x == decode_param(params.gx)?
        && common.g.y == decode_param(params.gy)?
        && common.n == decode_param(params.n)?;
    if !matches {
        return Err(CryptoError::NotSupported(
            "ECC domain parameters do not name a supported curve".into(),
        ));
    }
    Ok(curve)
}

pub(crate) struct EccBackend;

impl AsyKeyBackend for EccBackend {
    fn generator(&self, size: KeySize, _primes: Primes) -> CryptoResult<Box<dyn AsyKeyGeneratorSpi>> {
        let KeySize::Ecc(curve) = size else {
            return Err(CryptoError::InvalidParams(format!("{size} is not an ECC size")));
        };
        params_for(curve)?;
        Ok(Box::new(EccKeyGenerator { curve }))
    }

    fn spec_generator(&self, spec: &KeyParamSpec) -> CryptoResult<Box<dyn AsyKeySpecGeneratorSpi>> {
        let KeyParamSpec::Ecc(spec) = spec else {
            return Err(CryptoError::InvalidParams(format!(
                "{} spec given to the ECC backend",
                spec.algorithm_name()
            )));
        };
        let curve = match_curve(&spec.common)?;
        Ok(Box::new(EccSpecGenerator {
            curve,
            spec: spec.clone(),
        }))
    }
}

/// ECC public key.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum EccPub {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
}

/// ECC private key.
#[derive(Clone)]
pub(crate) enum EccPri {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
}

impl EccPub {
    pub(crate) fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
        }
    }

    fn from_point(curve: EcCurve, point: &EcPoint) -> CryptoResult<Self> {
        let mut sec1 = vec![0x04];
        sec1.extend_from_slice(point.x.as_bytes());
        sec1.extend_from_slice(point.y.as_bytes());
        let key = match curve {
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(&sec1).map(Self::P256),
            EcCurve::P384 => p384::PublicKey::from_sec1_bytes(&sec1).map(Self::P384),
            EcCurve::P224 | EcCurve::P521 => return Err(unsupported_curve(curve)),
        };
        key.map_err(|_| CryptoError::InvalidParams("public point is not on the curve".into()))
    }

    fn coordinates(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        let (x, y) = match self {
            Self::P256(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|v| v.to_vec()), point.y().map(|v| v.to_vec()))
            },
            Self::P384(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|v| v.to_vec()), point.y().map(|v| v.to_vec()))
            },
        };
        x.zip(y)
            .ok_or_else(|| CryptoError::OperationFailed("public key is the identity".into()))
    }
}

impl EccPri {
    pub(crate) fn curve(&self) -> EcCurve {
        match self {
            Self::P256(_) => EcCurve::P256,
            Self::P384(_) => EcCurve::P384,
        }
    }

    fn random(curve: EcCurve) -> CryptoResult<Self> {
        match curve {
            EcCurve::P256 => Ok(Self::P256(p256::SecretKey::random(&mut OsRng))),
            EcCurve::P384 => Ok(Self::P384(p384::SecretKey::random(&mut OsRng))),
            EcCurve::P224 | EcCurve::P521 => Err(unsupported_curve(curve)),
        }
    }

    fn from_scalar(curve: EcCurve, sk: &BigInteger) -> CryptoResult<Self> {
        let key = match curve {
            EcCurve::P256 => p256::SecretKey::from_slice(sk.as_bytes()).map(Self::P256),
            EcCurve::P384 => p384::SecretKey::from_slice(sk.as_bytes()).map(Self::P384),
            EcCurve::P224 | EcCurve::P521 => return Err(unsupported_curve(curve)),
        };
        key.map_err(|_| CryptoError::InvalidParams("private scalar is out of range".into()))
    }

    fn public(&self) -> EccPub {
        match self {
            Self::P256(key) => EccPub::P256(key.public_key()),
            Self::P384(key) => EccPub::P384(key.public_key()),
        }
    }

    fn scalar(&self) -> Vec<u8> {
        match self {
            Self::P256(key) => key.to_bytes().to_vec(),
            Self::P384(key) => key.to_bytes().to_vec(),
        }
    }
}

/// Items every ECC key reports from its curve.
fn domain_item(curve: EcCurve, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
    let params = params_for(curve)?;
    match item {
        AsyKeySpecItem::EccFpP => decode_param(params.p),
        AsyKeySpecItem::EccA => decode_param(params.a),
        AsyKeySpecItem::EccB => decode_param(params.b),
        AsyKeySpecItem::EccGx => decode_param(params.gx),
        AsyKeySpecItem::EccGy => decode_param(params.gy),
        AsyKeySpecItem::EccN => decode_param(params.n),
        other => Err(not_an_item(other)),
    }
}

fn domain_int(curve: EcCurve, item: AsyKeySpecItem) -> CryptoResult<i64> {
    match item {
        AsyKeySpecItem::EccH => Ok(1),
        AsyKeySpecItem::EccFieldSize => Ok(i64::from(curve.bits())),
        other => Err(not_an_item(other)),
    }
}

fn domain_string(curve: EcCurve, item: AsyKeySpecItem) -> CryptoResult<String> {
    match item {
        AsyKeySpecItem::EccFieldType => Ok("Fp".into()),
        AsyKeySpecItem::EccCurveName => Ok(curve.name().into()),
        other => Err(not_an_item(other)),
    }
}

impl PubKeySpi for EccPub {
    fn algorithm(&self) -> &'static str {
        "ECC"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = match self {
            Self::P256(key) => key.to_public_key_der(),
            Self::P384(key) => key.to_public_key_der(),
        }
        .map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::EccPkX => Ok(BigInteger::from(self.coordinates()?.0)),
            AsyKeySpecItem::EccPkY => Ok(BigInteger::from(self.coordinates()?.1)),
            other => domain_item(self.curve(), other),
        }
    }

    fn int_item(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        domain_int(self.curve(), item)
    }

    fn string_item(&self, item: AsyKeySpecItem) -> CryptoResult<String> {
        domain_string(self.curve(), item)
    }
}

impl PriKeySpi for EccPri {
    fn algorithm(&self) -> &'static str {
        "ECC"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = match self {
            Self::P256(key) => key.to_pkcs8_der(),
            Self::P384(key) => key.to_pkcs8_der(),
        }
        .map_err(CryptoError::backend)?;
        Blob::copy_from(der.as_bytes())
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::EccSk => Ok(BigInteger::from(self.scalar())),
            other => domain_item(self.curve(), other),
        }
    }

    fn int_item(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        domain_int(self.curve(), item)
    }

    fn string_item(&self, item: AsyKeySpecItem) -> CryptoResult<String> {
        domain_string(self.curve(), item)
    }
}

fn key_pair(private: EccPri) -> KeyPairSpi {
    KeyPairSpi {
        public: Box::new(private.public()),
        private: Box::new(private),
    }
}

struct EccKeyGenerator {
    curve: EcCurve,
}

impl AsyKeyGeneratorSpi for EccKeyGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        let private = EccPri::random(self.curve)?;
        debug!(curve = self.curve.name(), "generated ECC key pair");
        Ok(key_pair(private))
    }

    fn convert_key(
        &self,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> CryptoResult<ConvertedKeys> {
        let bad_public = |e: p256::pkcs8::spki::Error| {
            CryptoError::InvalidParams(format!("bad ECC public key: {e}"))
        };
        let bad_private = |e: p256::pkcs8::Error| {
            CryptoError::InvalidParams(format!("bad ECC private key: {e}"))
        };
        let public = match public {
            None => None,
            Some(der) => Some(match self.curve {
                EcCurve::P256 => EccPub::P256(p256::PublicKey::from_public_key_der(der).map_err(bad_public)?),
                EcCurve::P384 => EccPub::P384(p384::PublicKey::from_public_key_der(der).map_err(bad_public)?),
                curve => return Err(unsupported_curve(curve)),
            }),
        };
        let private = match private {
            None => None,
            Some(der) => Some(match self.curve {
                EcCurve::P256 => EccPri::P256(p256::SecretKey::from_pkcs8_der(der).map_err(bad_private)?),
                EcCurve::P384 => EccPri::P384(p384::SecretKey::from_pkcs8_der(der).map_err(bad_private)?),
                curve => return Err(unsupported_curve(curve)),
            }),
        };
        Ok(ConvertedKeys {
            public: public.map(|k| Box::new(k) as Box<dyn PubKeySpi>),
            private: private.map(|k| Box::new(k) as Box<dyn PriKeySpi>),
        })
    }
}

struct EccSpecGenerator {
    curve: EcCurve,
    spec: EccKeySpec,
}

impl EccSpecGenerator {
    fn public_key(&self) -> CryptoResult<Option<EccPub>> {
        self.spec
            .public
            .as_ref()
            .map(|public| EccPub::from_point(self.curve, &public.pk))
            .transpose()
    }

    fn private_key(&self) -> CryptoResult<Option<EccPri>> {
        self.spec
            .private
            .as_ref()
            .map(|private| EccPri::from_scalar(self.curve, &private.sk))
            .transpose()
    }
}

impl AsyKeySpecGeneratorSpi for EccSpecGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        match (self.public_key()?, self.private_key()?) {
            (Some(public), Some(private)) => {
                if private.public() != public {
                    return Err(CryptoError::InvalidParams(
                        "ECC public point does not match the private scalar".into(),
                    ));
                }
                Ok(KeyPairSpi {
                    public: Box::new(public),
                    private: Box::new(private),
                })
            },
            _ => Ok(key_pair(EccPri::random(self.curve)?)),
        }
    }

    fn generate_pub_key(&mut self) -> CryptoResult<Box<dyn PubKeySpi>> {
        match self.public_key()? {
            Some(public) => Ok(Box::new(public)),
            None => Ok(Box::new(EccPri::random(self.curve)?.public())),
        }
    }

    fn generate_pri_key(&mut self) -> CryptoResult<Box<dyn PriKeySpi>> {
        match self.private_key()? {
            Some(private) => Ok(Box::new(private)),
            None => Ok(Box::new(EccPri::random(self.curve)?)),
        }
    }
}

fn curve_mismatch(expected: EcCurve, actual: EcCurve) -> CryptoError {
    CryptoError::InvalidParams(format!(
        "key is on {}, expected {}",
        actual.name(),
        expected.name()
    ))
}

fn signing_failed<E>(_: E) -> CryptoError {
    CryptoError::OperationFailed("ECDSA signing failed".into())
}

/// Left-pads a digest shorter than the curve's field to the field width.
///
/// Leading zeros leave the integer the digest encodes unchanged, so the
/// signature matches one over the bare digest; the padding only satisfies
/// the backend's minimum prehash length.
fn field_prehash(curve: EcCurve, hashed: Vec<u8>) -> Vec<u8> {
    let Some(pad) = curve.field_len().checked_sub(hashed.len()).filter(|pad| *pad > 0) else {
        return hashed;
    };
    let mut padded = vec![0_u8; pad];
    padded.extend_from_slice(&hashed);
    padded
}

/// ECDSA signer over a prehashed message; signatures are DER.
pub(crate) struct EcdsaSignBackend {
    curve: EcCurve,
    hasher: DigestBackend,
    key: Option<EccPri>,
}

impl EcdsaSignBackend {
    pub(crate) fn new(curve: EcCurve, md: DigestAlg) -> CryptoResult<Self> {
        params_for(curve)?;
        Ok(Self {
            curve,
            hasher: DigestBackend::new(md),
            key: None,
        })
    }
}

impl SignSpi for EcdsaSignBackend {
    fn init(&mut self, key: &dyn PriKeySpi) -> CryptoResult<()> {
        let key = downcast_pri::<EccPri>(key)?;
        if key.curve() != self.curve {
            return Err(curve_mismatch(self.curve, key.curve()));
        }
        self.key = Some(key.clone());
        self.hasher.reset();
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.hasher.update(data)
    }

    fn sign(&mut self, data: &[u8]) -> CryptoResult<Blob> {
        use p256::ecdsa::signature::hazmat::PrehashSigner;

        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("ECDSA signer has no key".into()))?;
        self.hasher.update(data)?;
        let hashed = field_prehash(self.curve, self.hasher.take_hash());
        let der = match key {
            EccPri::P256(secret) => {
                let signer = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature =
                    signer.sign_prehash(&hashed).map_err(signing_failed)?;
                signature.to_der().as_bytes().to_vec()
            },
            EccPri::P384(secret) => {
                let signer = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature =
                    signer.sign_prehash(&hashed).map_err(signing_failed)?;
                signature.to_der().as_bytes().to_vec()
            },
        };
        Ok(Blob::from(der))
    }
}

/// ECDSA verifier over a prehashed message.
pub(crate) struct EcdsaVerifyBackend {
    curve: EcCurve,
    hasher: DigestBackend,
    key: Option<EccPub>,
}

impl EcdsaVerifyBackend {
    pub(crate) fn new(curve: EcCurve, md: DigestAlg) -> CryptoResult<Self> {
        params_for(curve)?;
        Ok(Self {
            curve,
            hasher: DigestBackend::new(md),
            key: None,
        })
    }
}

impl VerifySpi for EcdsaVerifyBackend {
    fn init(&mut self, key: &dyn PubKeySpi) -> CryptoResult<()> {
        let key = downcast_pub::<EccPub>(key)?;
        if key.curve() != self.curve {
            return Err(curve_mismatch(self.curve, key.curve()));
        }
        self.key = Some(key.clone());
        self.hasher.reset();
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.hasher.update(data)
    }

    fn verify(&mut self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        use p256::ecdsa::signature::hazmat::PrehashVerifier;

        let key = self
            .key
            .as_ref()
            .ok_or_else(|| CryptoError::InvalidParams("ECDSA verifier has no key".into()))?;
        self.hasher.update(data)?;
        let hashed = field_prehash(self.curve, self.hasher.take_hash());
        let valid = match key {
            EccPub::P256(public) => p256::ecdsa::Signature::from_der(signature).is_ok_and(|sig| {
                p256::ecdsa::VerifyingKey::from(public)
                    .verify_prehash(&hashed, &sig)
                    .is_ok()
            }),
            EccPub::P384(public) => p384::ecdsa::Signature::from_der(signature).is_ok_and(|sig| {
                p384::ecdsa::VerifyingKey::from(public)
                    .verify_prehash(&hashed, &sig)
                    .is_ok()
            }),
        };
        Ok(valid)
    }
}

/// ECDH; the secret is the x coordinate of the shared point.
pub(crate) struct EcdhBackend {
    curve: EcCurve,
}

impl EcdhBackend {
    pub(crate) fn new(curve: EcCurve) -> CryptoResult<Self> {
        params_for(curve)?;
        Ok(Self { curve })
    }
}

impl KeyAgreementSpi for EcdhBackend {
    fn generate_secret(
        &mut self,
        private: &dyn PriKeySpi,
        public: &dyn PubKeySpi,
    ) -> CryptoResult<Blob> {
        let private = downcast_pri::<EccPri>(private)?;
        let public = downcast_pub::<EccPub>(public)?;
        if private.curve() != self.curve {
            return Err(curve_mismatch(self.curve, private.curve()));
        }
        let secret = match (private, public) {
            (EccPri::P256(sk), EccPub::P256(pk)) => {
                p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine())
                    .raw_secret_bytes()
                    .to_vec()
            },
            (EccPri::P384(sk), EccPub::P384(pk)) => {
                p384::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine())
                    .raw_secret_bytes()
                    .to_vec()
            },
            _ => return Err(curve_mismatch(self.curve, public.curve())),
        };
        Ok(Blob::from(secret))
    }
}

//! Finite-field Diffie-Hellman over `num-bigint-dig`.
//!
//! The named groups are the RFC 3526 MODP and RFC 7919 ffdhe safe primes.
//! Both RFCs define the prime as
//! `2^n - 2^(n-64) - 1 + 2^64 * (floor(2^(n-130) * c) + k)` with `c = pi`
//! (MODP) or `c = e` (ffdhe), so the primes are derived from those
//! constants here rather than embedded as hex. Keys encode as PKCS#3
//! `dhKeyAgreement` SPKI and PKCS#8 documents.

use std::fmt;
use std::sync::OnceLock;

use num_bigint_dig::{BigUint, RandBigInt};
use pkcs8::der::asn1::{BitStringRef, UintRef};
use pkcs8::der::{
    self, AnyRef, Decode, DecodeValue, Encode, EncodeValue, Header, Length, Reader, Sequence,
    Writer,
};
use pkcs8::{AlgorithmIdentifierRef, ObjectIdentifier, PrivateKeyInfo, SubjectPublicKeyInfoRef};
use rand::rngs::OsRng;
use tracing::debug;
use veil_core::spec::{DhCommon, DhKeySpec};
use veil_core::{
    AsyKeySpecItem, BigInteger, Blob, CryptoError, CryptoResult, DhGroup, KeyParamSpec, KeySize,
    Primes,
};
use zeroize::{Zeroize, Zeroizing};

use super::AsyKeyBackend;
use crate::spi::{
    AsyKeyGeneratorSpi, AsyKeySpecGeneratorSpi, ConvertedKeys, KeyAgreementSpi, KeyPairSpi,
    PriKeySpi, PubKeySpi, downcast_pri, downcast_pub, not_an_item,
};

/// PKCS#3 `dhKeyAgreement`.
const DH_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.3.1");

/// Generator of every named group.
const GENERATOR: u32 = 2;

/// Fraction bits of pi needed by the largest MODP group (8192 - 130).
const PI_BITS: usize = 8062;

/// Fraction bits of e needed by the largest ffdhe group (4096 - 130).
const E_BITS: usize = 3966;

/// Extra precision carried through the series and dropped at the end.
const GUARD_BITS: usize = 64;

pub(crate) struct DhBackend;

impl AsyKeyBackend for DhBackend {
    fn generator(&self, size: KeySize, _primes: Primes) -> CryptoResult<Box<dyn AsyKeyGeneratorSpi>> {
        let KeySize::Dh(group) = size else {
            return Err(CryptoError::InvalidParams(format!("{size} is not a DH group")));
        };
        Ok(Box::new(DhKeyGenerator { group }))
    }

    fn spec_generator(&self, spec: &KeyParamSpec) -> CryptoResult<Box<dyn AsyKeySpecGeneratorSpi>> {
        let KeyParamSpec::Dh(spec) = spec else {
            return Err(CryptoError::InvalidParams(format!(
                "{} spec given to the DH backend",
                spec.algorithm_name()
            )));
        };
        Ok(Box::new(DhSpecGenerator {
            domain: DhDomain::from_common(&spec.common)?,
            spec: spec.clone(),
        }))
    }
}

/// `floor(2^bits * atan(1/x))` by the alternating Taylor series.
#[allow(clippy::arithmetic_side_effects)] // terms shrink, so every partial sum stays positive
fn arctan_inv(one: &BigUint, x: u32) -> BigUint {
    let x_squared = x * x;
    let mut power = one / x;
    let mut sum = power.clone();
    let mut divisor = 1_u32;
    let mut subtract = true;
    loop {
        power = power / x_squared;
        if power.bits() == 0 {
            return sum;
        }
        divisor += 2;
        let term = &power / divisor;
        if subtract {
            sum -= term;
        } else {
            sum += term;
        }
        subtract = !subtract;
    }
}

/// `floor(2^PI_BITS * pi)` by Machin's formula.
#[allow(clippy::arithmetic_side_effects)] // 16 atan(1/5) > 4 atan(1/239)
fn pi() -> &'static BigUint {
    static PI: OnceLock<BigUint> = OnceLock::new();
    PI.get_or_init(|| {
        let one = BigUint::from(1_u32) << (PI_BITS + GUARD_BITS);
        (arctan_inv(&one, 5) * 16_u32 - arctan_inv(&one, 239) * 4_u32) >> GUARD_BITS
    })
}

/// `floor(2^E_BITS * e)` as the sum of `1/k!`.
#[allow(clippy::arithmetic_side_effects)] // k stays far below u32::MAX before the terms vanish
fn e() -> &'static BigUint {
    static E: OnceLock<BigUint> = OnceLock::new();
    E.get_or_init(|| {
        let mut term = BigUint::from(1_u32) << (E_BITS + GUARD_BITS);
        let mut sum = BigUint::default();
        let mut k = 1_u32;
        while term.bits() > 0 {
            sum += &term;
            term = term / k;
            k += 1;
        }
        sum >> GUARD_BITS
    })
}

/// Safe prime of a named group.
#[allow(clippy::arithmetic_side_effects)] // n >= 1536, so every shift amount and difference is positive
pub(crate) fn group_prime(group: DhGroup) -> BigUint {
    let (constant, precision, offset) = match group {
        DhGroup::Modp1536 => (pi(), PI_BITS, 741_804_u32),
        DhGroup::Modp2048 => (pi(), PI_BITS, 124_476),
        DhGroup::Modp3072 => (pi(), PI_BITS, 1_690_314),
        DhGroup::Modp4096 => (pi(), PI_BITS, 240_904),
        DhGroup::Modp6144 => (pi(), PI_BITS, 929_484),
        DhGroup::Modp8192 => (pi(), PI_BITS, 4_743_158),
        DhGroup::Ffdhe2048 => (e(), E_BITS, 560_316),
        DhGroup::Ffdhe3072 => (e(), E_BITS, 2_625_351),
        DhGroup::Ffdhe4096 => (e(), E_BITS, 5_736_041),
    };
    let n = group.bits() as usize;
    let one = BigUint::from(1_u32);
    let fraction = constant >> (precision - (n - 130));
    (&one << n) - (&one << (n - 64)) - 1_u32 + ((fraction + offset) << 64)
}

fn biguint(value: &BigInteger) -> BigUint {
    BigUint::from_bytes_be(value.as_bytes())
}

fn malformed(what: &str, err: impl fmt::Display) -> CryptoError {
    CryptoError::InvalidParams(format!("bad DH {what}: {err}"))
}

/// `p`, `g` and the private value length shared by both halves of a key.
#[derive(Clone)]
struct DhDomain {
    p: BigUint,
    g: BigUint,
    length: u32,
}

impl DhDomain {
    fn named(group: DhGroup) -> Self {
        Self {
            p: group_prime(group),
            g: BigUint::from(GENERATOR),
            length: 0,
        }
    }

    fn from_common(common: &DhCommon) -> CryptoResult<Self> {
        Self::checked(biguint(&common.p), biguint(&common.g), common.length)
    }

    /// Domain with an odd `p`, `g` in `[2, p - 2]` and a private length
    /// below the size of `p`.
    fn checked(p: BigUint, g: BigUint, length: u32) -> CryptoResult<Self> {
        if p.bits() < 3 || p.trailing_zeros() != Some(0) {
            return Err(CryptoError::InvalidParams("DH p must be an odd prime".into()));
        }
        let domain = Self { p, g, length };
        if !domain.in_group(&domain.g) {
            return Err(CryptoError::InvalidParams("DH g must lie in [2, p - 2]".into()));
        }
        if usize::try_from(length).is_ok_and(|l| l >= domain.p.bits()) {
            return Err(CryptoError::InvalidParams(format!(
                "DH private length {length} is not below the {}-bit prime",
                domain.p.bits()
            )));
        }
        Ok(domain)
    }

    /// Width of `p` in bytes.
    fn width(&self) -> usize {
        self.p.bits().div_ceil(8)
    }

    /// Whether `value` lies in `[2, p - 2]`.
    #[allow(clippy::arithmetic_side_effects)] // p >= 5 after `checked`
    fn in_group(&self, value: &BigUint) -> bool {
        *value >= BigUint::from(2_u32) && *value < &self.p - 1_u32
    }

    /// Random private value: exactly `length` bits when set, else uniform in
    /// `[2, p - 2]`.
    #[allow(clippy::arithmetic_side_effects)] // 0 < length < bits(p), and p >= 5
    fn private_value(&self) -> BigUint {
        let one = BigUint::from(1_u32);
        let (low, high) = match usize::try_from(self.length) {
            Ok(bits) if bits > 0 => (&one << (bits - 1), &one << bits),
            _ => (BigUint::from(2_u32), &self.p - 1_u32),
        };
        OsRng.gen_biguint_range(&low, &high)
    }

    fn public_value(&self, x: &BigUint) -> BigUint {
        self.g.modpow(x, &self.p)
    }

    fn generate(&self) -> DhPri {
        let x = self.private_value();
        let y = self.public_value(&x);
        DhPri {
            domain: self.clone(),
            x,
            y,
        }
    }

    fn item(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::DhP => Ok(BigInteger::from(self.p.to_bytes_be())),
            AsyKeySpecItem::DhG => Ok(BigInteger::from(self.g.to_bytes_be())),
            other => Err(not_an_item(other)),
        }
    }

    fn int_item(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        match item {
            AsyKeySpecItem::DhL => Ok(i64::from(self.length)),
            other => Err(not_an_item(other)),
        }
    }

    fn fixed(&self, value: &BigUint) -> CryptoResult<BigInteger> {
        let bytes = Zeroizing::new(value.to_bytes_be());
        BigInteger::fixed_from(&bytes, self.width())
    }

    fn parameters_der(&self) -> der::Result<Vec<u8>> {
        let p = self.p.to_bytes_be();
        let g = self.g.to_bytes_be();
        DhParameter {
            prime: UintRef::new(&p)?,
            base: UintRef::new(&g)?,
            private_length: (self.length > 0).then_some(self.length),
        }
        .to_der()
    }

    fn algorithm_der<T>(
        &self,
        encode: impl FnOnce(AlgorithmIdentifierRef<'_>) -> der::Result<T>,
    ) -> der::Result<T> {
        let parameters = self.parameters_der()?;
        encode(AlgorithmIdentifierRef {
            oid: DH_OID,
            parameters: Some(AnyRef::from_der(&parameters)?),
        })
    }

    fn from_algorithm(algorithm: &AlgorithmIdentifierRef<'_>) -> CryptoResult<Self> {
        algorithm
            .assert_algorithm_oid(DH_OID)
            .map_err(|e| malformed("algorithm", e))?;
        let parameters = algorithm
            .parameters_any()
            .map_err(|e| malformed("parameters", e))?
            .decode_as::<DhParameter<'_>>()
            .map_err(|e| malformed("parameters", e))?;
        Self::checked(
            BigUint::from_bytes_be(parameters.prime.as_bytes()),
            BigUint::from_bytes_be(parameters.base.as_bytes()),
            parameters.private_length.unwrap_or(0),
        )
    }
}

/// PKCS#3 `DHParameter ::= SEQUENCE { prime, base, privateValueLength OPTIONAL }`.
struct DhParameter<'a> {
    prime: UintRef<'a>,
    base: UintRef<'a>,
    private_length: Option<u32>,
}

impl<'a> DecodeValue<'a> for DhParameter<'a> {
    fn decode_value<R: Reader<'a>>(reader: &mut R, _header: Header) -> der::Result<Self> {
        Ok(Self {
            prime: reader.decode()?,
            base: reader.decode()?,
            private_length: reader.decode()?,
        })
    }
}

impl EncodeValue for DhParameter<'_> {
    #[allow(clippy::arithmetic_side_effects)] // `Length` addition is checked
    fn value_len(&self) -> der::Result<Length> {
        self.prime.encoded_len()? + self.base.encoded_len()? + self.private_length.encoded_len()?
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.prime.encode(writer)?;
        self.base.encode(writer)?;
        self.private_length.encode(writer)
    }
}

impl<'a> Sequence<'a> for DhParameter<'a> {}

#[derive(Clone)]
pub(crate) struct DhPub {
    domain: DhDomain,
    y: BigUint,
}

pub(crate) struct DhPri {
    domain: DhDomain,
    x: BigUint,
    y: BigUint,
}

impl Drop for DhPri {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

impl DhPub {
    fn new(domain: DhDomain, y: BigUint) -> CryptoResult<Self> {
        if !domain.in_group(&y) {
            return Err(CryptoError::InvalidParams(
                "DH public value must lie in [2, p - 2]".into(),
            ));
        }
        Ok(Self { domain, y })
    }

    fn from_der(der: &[u8]) -> CryptoResult<Self> {
        let info = SubjectPublicKeyInfoRef::from_der(der).map_err(|e| malformed("public key", e))?;
        let domain = DhDomain::from_algorithm(&info.algorithm)?;
        let bytes = info
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| malformed("public key", "unaligned bit string"))?;
        let y = UintRef::from_der(bytes).map_err(|e| malformed("public key", e))?;
        Self::new(domain, BigUint::from_bytes_be(y.as_bytes()))
    }

    fn to_der(&self) -> der::Result<Vec<u8>> {
        let y = self.y.to_bytes_be();
        let public_key = UintRef::new(&y)?.to_der()?;
        self.domain.algorithm_der(|algorithm| {
            SubjectPublicKeyInfoRef {
                algorithm,
                subject_public_key: BitStringRef::new(0, &public_key)?,
            }
            .to_der()
        })
    }
}

impl DhPri {
    /// Private key from `x`, deriving `y = g^x mod p`.
    fn new(domain: DhDomain, x: BigUint) -> CryptoResult<Self> {
        if x.bits() == 0 || x >= domain.p {
            return Err(CryptoError::InvalidParams(
                "DH private value must lie in [1, p - 1]".into(),
            ));
        }
        let y = domain.public_value(&x);
        Ok(Self { domain, x, y })
    }

    fn from_der(der: &[u8]) -> CryptoResult<Self> {
        let info = PrivateKeyInfo::from_der(der).map_err(|e| malformed("private key", e))?;
        let domain = DhDomain::from_algorithm(&info.algorithm)?;
        let x = UintRef::from_der(info.private_key).map_err(|e| malformed("private key", e))?;
        Self::new(domain, BigUint::from_bytes_be(x.as_bytes()))
    }

    fn to_der(&self) -> der::Result<Zeroizing<Vec<u8>>> {
        let x = Zeroizing::new(self.x.to_bytes_be());
        let private_key = Zeroizing::new(UintRef::new(&x)?.to_der()?);
        self.domain
            .algorithm_der(|algorithm| PrivateKeyInfo::new(algorithm, &private_key).to_der())
            .map(Zeroizing::new)
    }

    fn public(&self) -> DhPub {
        DhPub {
            domain: self.domain.clone(),
            y: self.y.clone(),
        }
    }
}

impl PubKeySpi for DhPub {
    fn algorithm(&self) -> &'static str {
        "DH"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        Ok(Blob::from(self.to_der().map_err(CryptoError::backend)?))
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::DhPk => self.domain.fixed(&self.y),
            other => self.domain.item(other),
        }
    }

    fn int_item(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        self.domain.int_item(item)
    }
}

impl PriKeySpi for DhPri {
    fn algorithm(&self) -> &'static str {
        "DH"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        let der = self.to_der().map_err(CryptoError::backend)?;
        Blob::copy_from(&der)
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        match item {
            AsyKeySpecItem::DhSk => {
                let bytes = Zeroizing::new(self.x.to_bytes_be());
                BigInteger::fixed_from(&bytes, bytes.len())
            }
            AsyKeySpecItem::DhPk => self.domain.fixed(&self.y),
            other => self.domain.item(other),
        }
    }

    fn int_item(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        self.domain.int_item(item)
    }
}

fn key_pair(private: DhPri) -> KeyPairSpi {
    KeyPairSpi {
        public: Box::new(private.public()),
        private: Box::new(private),
    }
}

struct DhKeyGenerator {
    group: DhGroup,
}

impl AsyKeyGeneratorSpi for DhKeyGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        let private = DhDomain::named(self.group).generate();
        debug!(group = %KeySize::Dh(self.group), "generated DH key pair");
        Ok(key_pair(private))
    }

    fn convert_key(
        &self,
        public: Option<&[u8]>,
        private: Option<&[u8]>,
    ) -> CryptoResult<ConvertedKeys> {
        let public = public
            .map(|der| DhPub::from_der(der).map(|k| Box::new(k) as Box<dyn PubKeySpi>))
            .transpose()?;
        let private = private
            .map(|der| DhPri::from_der(der).map(|k| Box::new(k) as Box<dyn PriKeySpi>))
            .transpose()?;
        Ok(ConvertedKeys { public, private })
    }
}

struct DhSpecGenerator {
    domain: DhDomain,
    spec: DhKeySpec,
}

impl DhSpecGenerator {
    fn public_key(&self) -> CryptoResult<Option<DhPub>> {
        self.spec
            .public
            .as_ref()
            .map(|public| DhPub::new(self.domain.clone(), biguint(&public.pk)))
            .transpose()
    }

    /// Private key from `x`, checking `g^x mod p` against the public value
    /// when one was supplied.
    fn private_key(&self) -> CryptoResult<Option<DhPri>> {
        let Some(private) = &self.spec.private else {
            return Ok(None);
        };
        let private = DhPri::new(self.domain.clone(), biguint(&private.sk))?;
        if let Some(public) = self.public_key()?
            && public.y != private.y
        {
            return Err(CryptoError::InvalidParams(
                "DH public value does not match the private value".into(),
            ));
        }
        Ok(Some(private))
    }
}

impl AsyKeySpecGeneratorSpi for DhSpecGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        let private = match self.private_key()? {
            Some(private) => private,
            None => self.domain.generate(),
        };
        Ok(key_pair(private))
    }

    fn generate_pub_key(&mut self) -> CryptoResult<Box<dyn PubKeySpi>> {
        let public = match self.public_key()? {
            Some(public) => public,
            None => self.domain.generate().public(),
        };
        Ok(Box::new(public))
    }

    fn generate_pri_key(&mut self) -> CryptoResult<Box<dyn PriKeySpi>> {
        let private = match self.private_key()? {
            Some(private) => private,
            None => self.domain.generate(),
        };
        Ok(Box::new(private))
    }
}

/// DH agreement; the secret is `y^x mod p`, left-padded to the width of `p`.
pub(crate) struct DhAgreementBackend;

impl KeyAgreementSpi for DhAgreementBackend {
    fn generate_secret(
        &mut self,
        private: &dyn PriKeySpi,
        public: &dyn PubKeySpi,
    ) -> CryptoResult<Blob> {
        let private = downcast_pri::<DhPri>(private)?;
        let public = downcast_pub::<DhPub>(public)?;
        if private.domain.p != public.domain.p || private.domain.g != public.domain.g {
            return Err(CryptoError::InvalidParams(
                "DH keys belong to different groups".into(),
            ));
        }
        if !private.domain.in_group(&public.y) {
            return Err(CryptoError::OperationFailed(
                "DH peer value is outside [2, p - 2]".into(),
            ));
        }
        let shared = public.y.modpow(&private.x, &private.domain.p);
        let secret = private.domain.fixed(&shared)?;
        Blob::copy_from(secret.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use num_bigint_dig::prime::probably_prime;
    use veil_core::AsyKeySpec;
    use veil_core::spec::{DhPrivate, DhPublic};

    use super::*;

    const ALL_GROUPS: [DhGroup; 9] = [
        DhGroup::Modp1536,
        DhGroup::Modp2048,
        DhGroup::Modp3072,
        DhGroup::Modp4096,
        DhGroup::Modp6144,
        DhGroup::Modp8192,
        DhGroup::Ffdhe2048,
        DhGroup::Ffdhe3072,
        DhGroup::Ffdhe4096,
    ];

    fn pair(group: DhGroup) -> KeyPairSpi {
        DhBackend
            .generator(KeySize::Dh(group), Primes::Two)
            .unwrap()
            .generate_key_pair()
            .unwrap()
    }

    fn common_of(key: &dyn PubKeySpi) -> DhCommon {
        DhCommon {
            p: key.big_integer(AsyKeySpecItem::DhP).unwrap(),
            g: key.big_integer(AsyKeySpecItem::DhG).unwrap(),
            length: 0,
        }
    }

    #[test]
    fn test_group_primes_have_the_rfc_shape() {
        for group in ALL_GROUPS {
            let p = group_prime(group);
            let n = group.bits() as usize;
            assert_eq!(p.bits(), n, "{group:?}");
            let bytes = p.to_bytes_be();
            assert!(bytes[..8].iter().all(|b| *b == 0xFF), "{group:?}");
            assert!(bytes[bytes.len() - 8..].iter().all(|b| *b == 0xFF), "{group:?}");
        }
    }

    #[test]
    fn test_group_primes_match_published_prefixes() {
        let prefix = |group| hex::encode_upper(&group_prime(group).to_bytes_be()[..24]);
        assert_eq!(
            prefix(DhGroup::Modp2048),
            "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1"
        );
        assert_eq!(
            prefix(DhGroup::Ffdhe2048),
            "FFFFFFFFFFFFFFFFADF85458A2BB4A9AAFDC5620273D3CF1"
        );
    }

    #[test]
    fn test_group_primes_are_safe_primes() {
        for group in [DhGroup::Modp1536, DhGroup::Ffdhe2048] {
            let p = group_prime(group);
            let q = &p >> 1;
            assert!(probably_prime(&p, 2), "{group:?} p");
            assert!(probably_prime(&q, 2), "{group:?} q");
        }
    }

    #[test]
    fn test_agreement_is_symmetric() {
        let alice = pair(DhGroup::Modp1536);
        let bob = pair(DhGroup::Modp1536);
        let ab = DhAgreementBackend
            .generate_secret(alice.private.as_ref(), bob.public.as_ref())
            .unwrap();
        let ba = DhAgreementBackend
            .generate_secret(bob.private.as_ref(), alice.public.as_ref())
            .unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 192);
    }

    #[test]
    fn test_agreement_rejects_mixed_groups() {
        let alice = pair(DhGroup::Modp1536);
        let bob = pair(DhGroup::Ffdhe2048);
        let err = DhAgreementBackend
            .generate_secret(alice.private.as_ref(), bob.public.as_ref())
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParams(_)));
    }

    #[test]
    fn test_der_round_trip() {
        let pair = pair(DhGroup::Modp1536);
        let public_der = pair.public.encoded().unwrap();
        let private_der = pair.private.encoded().unwrap();
        let converted = DhKeyGenerator {
            group: DhGroup::Modp1536,
        }
        .convert_key(Some(&public_der[..]), Some(&private_der[..]))
        .unwrap();
        let public = converted.public.unwrap();
        let private = converted.private.unwrap();
        assert_eq!(public.encoded().unwrap(), public_der);
        assert_eq!(private.encoded().unwrap(), private_der);
        assert_eq!(
            private.big_integer(AsyKeySpecItem::DhPk).unwrap(),
            pair.public.big_integer(AsyKeySpecItem::DhPk).unwrap()
        );
    }

    #[test]
    fn test_private_length_is_honored_and_encoded() {
        let base = pair(DhGroup::Modp1536);
        let common = DhCommon {
            length: 256,
            ..common_of(base.public.as_ref())
        };
        let mut generator = DhBackend
            .spec_generator(&KeyParamSpec::Dh(AsyKeySpec::common(common)))
            .unwrap();
        let pair = generator.generate_key_pair().unwrap();
        assert_eq!(pair.private.big_integer(AsyKeySpecItem::DhSk).unwrap().bits(), 256);
        assert_eq!(pair.public.int_item(AsyKeySpecItem::DhL).unwrap(), 256);

        let der = pair.public.encoded().unwrap();
        let public = DhPub::from_der(&der).unwrap();
        assert_eq!(public.domain.length, 256);
    }

    #[test]
    fn test_private_only_spec_derives_public() {
        let pair = pair(DhGroup::Modp1536);
        let spec = AsyKeySpec::private_only(
            common_of(pair.public.as_ref()),
            DhPrivate {
                sk: pair.private.big_integer(AsyKeySpecItem::DhSk).unwrap(),
            },
        );
        let mut generator = DhBackend.spec_generator(&KeyParamSpec::Dh(spec)).unwrap();
        let private = generator.generate_pri_key().unwrap();
        assert_eq!(
            private.big_integer(AsyKeySpecItem::DhPk).unwrap(),
            pair.public.big_integer(AsyKeySpecItem::DhPk).unwrap()
        );
    }

    #[test]
    fn test_mismatched_key_pair_spec_rejected() {
        let first = pair(DhGroup::Modp1536);
        let second = pair(DhGroup::Modp1536);
        let spec = AsyKeySpec::key_pair(
            common_of(first.public.as_ref()),
            DhPublic {
                pk: second.public.big_integer(AsyKeySpecItem::DhPk).unwrap(),
            },
            DhPrivate {
                sk: first.private.big_integer(AsyKeySpecItem::DhSk).unwrap(),
            },
        );
        let mut generator = DhBackend.spec_generator(&KeyParamSpec::Dh(spec)).unwrap();
        assert!(matches!(
            generator.generate_key_pair(),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_degenerate_generator_rejected() {
        let pair = pair(DhGroup::Modp1536);
        let common = DhCommon {
            g: BigInteger::from(vec![1]),
            ..common_of(pair.public.as_ref())
        };
        assert!(matches!(
            DhBackend.spec_generator(&KeyParamSpec::Dh(AsyKeySpec::common(common))),
            Err(CryptoError::InvalidParams(_))
        ));
    }
}

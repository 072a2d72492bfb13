//! Key parameter specifications: asymmetric keys described by their raw
//! domain components instead of an encoded blob.
//!
//! Every family shares one shape, [`AsyKeySpec`]: a `common` domain payload
//! plus optional public and private halves. Which halves are present decides
//! the [`SpecKind`], so a `KeyPair` spec always carries the `Common` payload
//! as its prefix.
//!
//! All big-integer components are unsigned, big-endian and fixed width: a
//! value is left-padded with zeros to the width its family implies (the
//! modulus length for RSA private exponents, the field length for curve
//! coordinates, and so on). [`KeyParamSpec::validate`] rejects any component
//! whose length disagrees, it never truncates.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::algorithm::{EcCurve, Family, KeySize};
use crate::error::{CryptoError, CryptoResult};

/// RSA modulus lengths in bytes accepted by a spec.
pub const RSA_MODULUS_LENGTHS: [usize; 7] = [64, 96, 128, 256, 384, 512, 1024];

/// DSA prime `p` lengths in bytes.
pub const DSA_P_LENGTHS: [usize; 3] = [128, 256, 384];

/// DSA subgroup order `q` lengths in bytes.
pub const DSA_Q_LENGTHS: [usize; 3] = [20, 28, 32];

/// Key length for X25519 and Ed25519.
pub const CURVE25519_KEY_LEN: usize = 32;

/// An unsigned big-endian integer.
#[derive(Clone, PartialEq, Eq, Default, Zeroize, ZeroizeOnDrop)]
pub struct BigInteger(Vec<u8>);

impl BigInteger {
    /// Wrap big-endian bytes as given.
    #[must_use]
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Minimal big-endian encoding of `value`.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        if first == bytes.len() {
            return Self(vec![0]);
        }
        Self(bytes.get(first..).unwrap_or_default().to_vec())
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encoded length in bytes, leading zeros included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// The value without leading zero bytes.
    #[must_use]
    pub fn trimmed(&self) -> &[u8] {
        let first = self.0.iter().position(|b| *b != 0).unwrap_or(self.0.len());
        self.0.get(first..).unwrap_or_default()
    }

    /// Number of significant bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        let trimmed = self.trimmed();
        match trimmed.first() {
            None => 0,
            Some(top) => {
                let top_bits = 8usize.saturating_sub(top.leading_zeros() as usize);
                trimmed
                    .len()
                    .saturating_sub(1)
                    .saturating_mul(8)
                    .saturating_add(top_bits)
            },
        }
    }

    /// Re-encode left-padded to exactly `width` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the value needs more than
    /// `width` bytes.
    pub fn to_fixed(&self, width: usize) -> CryptoResult<Self> {
        Self::fixed_from(self.trimmed(), width)
    }

    /// Left-pad big-endian `bytes` to exactly `width` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the value needs more than
    /// `width` bytes.
    pub fn fixed_from(bytes: &[u8], width: usize) -> CryptoResult<Self> {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let significant = bytes.get(first..).unwrap_or_default();
        let pad = width.checked_sub(significant.len()).ok_or_else(|| {
            CryptoError::InvalidParams(format!(
                "value of {} bytes does not fit in {width}",
                significant.len()
            ))
        })?;
        let mut out = vec![0u8; pad];
        out.extend_from_slice(significant);
        Ok(Self(out))
    }

    /// Value as a `u64` if it fits.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        let trimmed = self.trimmed();
        if trimmed.len() > 8 {
            return None;
        }
        Some(
            trimmed
                .iter()
                .fold(0u64, |acc, b| acc.wrapping_shl(8) | u64::from(*b)),
        )
    }
}

impl fmt::Debug for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInteger({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for BigInteger {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Which halves of a key pair a spec carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    /// Domain parameters only; usable to generate a fresh key.
    Common,
    /// Public half only.
    PublicOnly,
    /// Private half only.
    PrivateOnly,
    /// Both halves.
    KeyPair,
}

/// Shared shape of every family's spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyKeySpec<C, P, S> {
    /// Domain parameters.
    pub common: C,
    /// Public half.
    pub public: Option<P>,
    /// Private half.
    pub private: Option<S>,
}

impl<C, P, S> AsyKeySpec<C, P, S> {
    /// Domain parameters only.
    pub fn common(common: C) -> Self {
        Self {
            common,
            public: None,
            private: None,
        }
    }

    /// Public half over `common`.
    pub fn public_only(common: C, public: P) -> Self {
        Self {
            common,
            public: Some(public),
            private: None,
        }
    }

    /// Private half over `common`.
    pub fn private_only(common: C, private: S) -> Self {
        Self {
            common,
            public: None,
            private: Some(private),
        }
    }

    /// Both halves over `common`.
    pub fn key_pair(common: C, public: P, private: S) -> Self {
        Self {
            common,
            public: Some(public),
            private: Some(private),
        }
    }

    /// Kind implied by the halves present.
    pub fn kind(&self) -> SpecKind {
        match (self.public.is_some(), self.private.is_some()) {
            (false, false) => SpecKind::Common,
            (true, false) => SpecKind::PublicOnly,
            (false, true) => SpecKind::PrivateOnly,
            (true, true) => SpecKind::KeyPair,
        }
    }
}

/// RSA domain: the modulus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaCommon {
    /// Modulus `n`.
    pub n: BigInteger,
}

/// RSA public half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublic {
    /// Public exponent `e`.
    pub e: BigInteger,
}

/// RSA private half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPrivate {
    /// Private exponent `d`, padded to the modulus length.
    pub d: BigInteger,
}

/// Affine point on a prime curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcPoint {
    /// x coordinate, field width.
    pub x: BigInteger,
    /// y coordinate, field width.
    pub y: BigInteger,
}

/// ECC domain over a prime field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EccCommon {
    /// Field prime `p`.
    pub p: BigInteger,
    /// Curve coefficient `a`.
    pub a: BigInteger,
    /// Curve coefficient `b`.
    pub b: BigInteger,
    /// Base point.
    pub g: EcPoint,
    /// Order of the base point.
    pub n: BigInteger,
    /// Cofactor.
    pub h: u32,
}

impl EccCommon {
    /// Field type tag. Only prime fields are modelled.
    #[must_use]
    pub fn field_type(&self) -> &'static str {
        "Fp"
    }

    /// Field size in bits.
    #[must_use]
    pub fn field_bits(&self) -> usize {
        self.p.bits()
    }

    /// Named curve with this field width, if there is one.
    #[must_use]
    pub fn curve_for_width(&self) -> Option<EcCurve> {
        [EcCurve::P224, EcCurve::P256, EcCurve::P384, EcCurve::P521]
            .into_iter()
            .find(|c| c.field_len() == self.p.len())
    }
}

/// ECC public half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EccPublic {
    /// Public point.
    pub pk: EcPoint,
}

/// ECC private half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EccPrivate {
    /// Private scalar, order width.
    pub sk: BigInteger,
}

/// DSA domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaCommon {
    /// Prime `p`.
    pub p: BigInteger,
    /// Subgroup order `q`.
    pub q: BigInteger,
    /// Generator `g`, width of `p`.
    pub g: BigInteger,
}

/// DSA public half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaPublic {
    /// `y = g^x mod p`, width of `p`.
    pub pk: BigInteger,
}

/// DSA private half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaPrivate {
    /// `x`, width of `q`.
    pub sk: BigInteger,
}

/// Curve25519 keys have no domain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Curve25519Common;

/// Curve25519 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve25519Public {
    /// 32-byte public key.
    pub pk: BigInteger,
}

/// Curve25519 private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve25519Private {
    /// 32-byte private key.
    pub sk: BigInteger,
}

/// Finite-field DH domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhCommon {
    /// Prime `p`.
    pub p: BigInteger,
    /// Generator `g`.
    pub g: BigInteger,
    /// Private value length in bits, 0 for the backend default.
    pub length: u32,
}

/// DH public half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhPublic {
    /// Public value, width of `p`.
    pub pk: BigInteger,
}

/// DH private half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhPrivate {
    /// Private value.
    pub sk: BigInteger,
}

/// RSA spec.
pub type RsaKeySpec = AsyKeySpec<RsaCommon, RsaPublic, RsaPrivate>;
/// ECC and SM2 spec.
pub type EccKeySpec = AsyKeySpec<EccCommon, EccPublic, EccPrivate>;
/// DSA spec.
pub type DsaKeySpec = AsyKeySpec<DsaCommon, DsaPublic, DsaPrivate>;
/// Ed25519 and X25519 spec.
pub type Curve25519KeySpec = AsyKeySpec<Curve25519Common, Curve25519Public, Curve25519Private>;
/// DH spec.
pub type DhKeySpec = AsyKeySpec<DhCommon, DhPublic, DhPrivate>;

/// A key described by raw components, tagged by family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParamSpec {
    /// RSA.
    Rsa(RsaKeySpec),
    /// DSA.
    Dsa(DsaKeySpec),
    /// ECC over a prime field.
    Ecc(EccKeySpec),
    /// SM2.
    Sm2(EccKeySpec),
    /// Ed25519.
    Ed25519(Curve25519KeySpec),
    /// X25519.
    X25519(Curve25519KeySpec),
    /// Finite-field DH.
    Dh(DhKeySpec),
}

impl KeyParamSpec {
    /// Family of the spec.
    #[must_use]
    pub fn family(&self) -> Family {
        match self {
            Self::Rsa(_) => Family::Rsa,
            Self::Dsa(_) => Family::Dsa,
            Self::Ecc(_) => Family::Ecc,
            Self::Sm2(_) => Family::Sm2,
            Self::Ed25519(_) => Family::Ed25519,
            Self::X25519(_) => Family::X25519,
            Self::Dh(_) => Family::Dh,
        }
    }

    /// Algorithm name carried in the shared prefix.
    #[must_use]
    pub fn algorithm_name(&self) -> &'static str {
        self.family().name()
    }

    /// Which halves the spec carries.
    #[must_use]
    pub fn kind(&self) -> SpecKind {
        match self {
            Self::Rsa(s) => s.kind(),
            Self::Dsa(s) => s.kind(),
            Self::Ecc(s) | Self::Sm2(s) => s.kind(),
            Self::Ed25519(s) | Self::X25519(s) => s.kind(),
            Self::Dh(s) => s.kind(),
        }
    }

    /// Key size implied by the components, when it maps to a named size.
    #[must_use]
    pub fn key_size(&self) -> Option<KeySize> {
        match self {
            Self::Rsa(s) => u32::try_from(s.common.n.bits()).ok().map(KeySize::Rsa),
            Self::Dsa(s) => u32::try_from(s.common.p.bits()).ok().map(KeySize::Dsa),
            Self::Ecc(s) => s.common.curve_for_width().map(KeySize::Ecc),
            Self::Sm2(_) => Some(KeySize::Sm2),
            Self::Ed25519(_) => Some(KeySize::Ed25519),
            Self::X25519(_) => Some(KeySize::X25519),
            Self::Dh(_) => None,
        }
    }

    /// Check every component length against the width its family implies.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] naming the first component
    /// whose length is wrong.
    pub fn validate(&self) -> CryptoResult<()> {
        match self {
            Self::Rsa(s) => validate_rsa(s),
            Self::Dsa(s) => validate_dsa(s),
            Self::Ecc(s) | Self::Sm2(s) => validate_ecc(s),
            Self::Ed25519(s) | Self::X25519(s) => validate_curve25519(s),
            Self::Dh(s) => validate_dh(s),
        }
    }
}

fn invalid(component: &str, detail: impl fmt::Display) -> CryptoError {
    CryptoError::InvalidParams(format!("{component}: {detail}"))
}

fn expect_len(component: &str, value: &BigInteger, len: usize) -> CryptoResult<()> {
    if value.len() == len {
        Ok(())
    } else {
        Err(invalid(
            component,
            format_args!("expected {len} bytes, got {}", value.len()),
        ))
    }
}

fn expect_nonzero_lead(component: &str, value: &BigInteger) -> CryptoResult<()> {
    match value.as_bytes().first() {
        Some(0) | None => Err(invalid(component, "leading byte must be nonzero")),
        Some(_) => Ok(()),
    }
}

fn validate_rsa(spec: &RsaKeySpec) -> CryptoResult<()> {
    let n = &spec.common.n;
    if !RSA_MODULUS_LENGTHS.contains(&n.len()) {
        return Err(invalid(
            "RSA n",
            format_args!("{} bytes is not a supported modulus length", n.len()),
        ));
    }
    expect_nonzero_lead("RSA n", n)?;

    if let Some(public) = &spec.public {
        if public.e.is_zero() || public.e.len() > n.len() {
            return Err(invalid(
                "RSA e",
                format_args!("must be nonzero and at most {} bytes", n.len()),
            ));
        }
    }
    if let Some(private) = &spec.private {
        if spec.public.is_none() {
            return Err(invalid("RSA d", "a private exponent needs the public exponent"));
        }
        expect_len("RSA d", &private.d, n.len())?;
        if private.d.is_zero() {
            return Err(invalid("RSA d", "must be nonzero"));
        }
    }
    Ok(())
}

fn validate_ecc(spec: &EccKeySpec) -> CryptoResult<()> {
    let common = &spec.common;
    let width = common.p.len();
    if width == 0 {
        return Err(invalid("ECC p", "empty field prime"));
    }
    expect_nonzero_lead("ECC p", &common.p)?;
    expect_len("ECC a", &common.a, width)?;
    expect_len("ECC b", &common.b, width)?;
    expect_len("ECC g.x", &common.g.x, width)?;
    expect_len("ECC g.y", &common.g.y, width)?;
    expect_len("ECC n", &common.n, width)?;
    if common.h == 0 {
        return Err(invalid("ECC h", "cofactor must be at least 1"));
    }

    if let Some(public) = &spec.public {
        expect_len("ECC pk.x", &public.pk.x, width)?;
        expect_len("ECC pk.y", &public.pk.y, width)?;
    }
    if let Some(private) = &spec.private {
        expect_len("ECC sk", &private.sk, common.n.len())?;
    }
    Ok(())
}

fn validate_dsa(spec: &DsaKeySpec) -> CryptoResult<()> {
    let common = &spec.common;
    if !DSA_P_LENGTHS.contains(&common.p.len()) {
        return Err(invalid(
            "DSA p",
            format_args!("{} bytes is not a supported prime length", common.p.len()),
        ));
    }
    if !DSA_Q_LENGTHS.contains(&common.q.len()) {
        return Err(invalid(
            "DSA q",
            format_args!("{} bytes is not a supported order length", common.q.len()),
        ));
    }
    expect_nonzero_lead("DSA p", &common.p)?;
    expect_len("DSA g", &common.g, common.p.len())?;

    if let Some(public) = &spec.public {
        expect_len("DSA pk", &public.pk, common.p.len())?;
    }
    if let Some(private) = &spec.private {
        expect_len("DSA sk", &private.sk, common.q.len())?;
    }
    Ok(())
}

fn validate_curve25519(spec: &Curve25519KeySpec) -> CryptoResult<()> {
    if let Some(public) = &spec.public {
        expect_len("25519 pk", &public.pk, CURVE25519_KEY_LEN)?;
    }
    if let Some(private) = &spec.private {
        expect_len("25519 sk", &private.sk, CURVE25519_KEY_LEN)?;
    }
    Ok(())
}

fn validate_dh(spec: &DhKeySpec) -> CryptoResult<()> {
    let common = &spec.common;
    let width = common.p.len();
    if width == 0 {
        return Err(invalid("DH p", "empty prime"));
    }
    expect_nonzero_lead("DH p", &common.p)?;
    if common.g.is_empty() || common.g.len() > width {
        return Err(invalid(
            "DH g",
            format_args!("must be 1 to {width} bytes"),
        ));
    }
    let p_bits = common.p.bits();
    if common.length != 0 && !usize::try_from(common.length).is_ok_and(|l| l < p_bits) {
        return Err(invalid(
            "DH length",
            format_args!("must be below {p_bits} bits"),
        ));
    }

    if let Some(public) = &spec.public {
        expect_len("DH pk", &public.pk, width)?;
    }
    if let Some(private) = &spec.private {
        if private.sk.is_empty() || private.sk.len() > width {
            return Err(invalid(
                "DH sk",
                format_args!("must be 1 to {width} bytes"),
            ));
        }
    }
    Ok(())
}

/// Component of a key object that can be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsyKeySpecItem {
    /// RSA modulus.
    RsaN,
    /// RSA public exponent.
    RsaPk,
    /// RSA private exponent.
    RsaSk,
    /// ECC field prime.
    EccFpP,
    /// ECC coefficient a.
    EccA,
    /// ECC coefficient b.
    EccB,
    /// ECC base point x.
    EccGx,
    /// ECC base point y.
    EccGy,
    /// ECC order.
    EccN,
    /// ECC cofactor (integer).
    EccH,
    /// ECC field size in bits (integer).
    EccFieldSize,
    /// ECC field type (string).
    EccFieldType,
    /// ECC curve name (string).
    EccCurveName,
    /// ECC public point x.
    EccPkX,
    /// ECC public point y.
    EccPkY,
    /// ECC private scalar.
    EccSk,
    /// DSA p.
    DsaP,
    /// DSA q.
    DsaQ,
    /// DSA g.
    DsaG,
    /// DSA public value.
    DsaPk,
    /// DSA private value.
    DsaSk,
    /// DH p.
    DhP,
    /// DH g.
    DhG,
    /// DH private length (integer).
    DhL,
    /// DH public value.
    DhPk,
    /// DH private value.
    DhSk,
    /// Ed25519 public key.
    Ed25519Pk,
    /// Ed25519 private key.
    Ed25519Sk,
    /// X25519 public key.
    X25519Pk,
    /// X25519 private key.
    X25519Sk,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(len: usize, lead: u8) -> BigInteger {
        let mut v = vec![0x11; len];
        if let Some(first) = v.first_mut() {
            *first = lead;
        }
        BigInteger::from(v)
    }

    fn rsa_pair(n_len: usize, d_len: usize) -> KeyParamSpec {
        KeyParamSpec::Rsa(AsyKeySpec::key_pair(
            RsaCommon { n: bytes(n_len, 0xc1) },
            RsaPublic {
                e: BigInteger::from_u64(65537),
            },
            RsaPrivate { d: bytes(d_len, 0x01) },
        ))
    }

    fn ecc_common(width: usize) -> EccCommon {
        EccCommon {
            p: bytes(width, 0xff),
            a: bytes(width, 0xff),
            b: bytes(width, 0x5a),
            g: EcPoint {
                x: bytes(width, 0x6b),
                y: bytes(width, 0x4f),
            },
            n: bytes(width, 0xff),
            h: 1,
        }
    }

    #[test]
    fn test_kind_follows_halves() {
        let common = RsaCommon { n: bytes(256, 0xc1) };
        let e = RsaPublic {
            e: BigInteger::from_u64(3),
        };
        assert_eq!(AsyKeySpec::<_, RsaPublic, RsaPrivate>::common(common.clone()).kind(), SpecKind::Common);
        assert_eq!(
            AsyKeySpec::<_, _, RsaPrivate>::public_only(common, e).kind(),
            SpecKind::PublicOnly
        );
        assert_eq!(rsa_pair(256, 256).kind(), SpecKind::KeyPair);
    }

    #[test]
    fn test_rsa_lengths() {
        assert!(rsa_pair(256, 256).validate().is_ok());
        assert!(matches!(
            rsa_pair(250, 250).validate(),
            Err(CryptoError::InvalidParams(_))
        ));
        assert!(rsa_pair(256, 255).validate().is_err());
    }

    #[test]
    fn test_rsa_private_only_rejected() {
        let spec = KeyParamSpec::Rsa(AsyKeySpec::private_only(
            RsaCommon { n: bytes(128, 0xc1) },
            RsaPrivate { d: bytes(128, 1) },
        ));
        assert!(matches!(spec.validate(), Err(CryptoError::InvalidParams(_))));
    }

    #[test]
    fn test_rsa_modulus_needs_leading_byte() {
        let spec = KeyParamSpec::Rsa(AsyKeySpec::common(RsaCommon { n: bytes(256, 0) }));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_ecc_lengths() {
        let ok = KeyParamSpec::Ecc(AsyKeySpec::key_pair(
            ecc_common(32),
            EccPublic {
                pk: EcPoint {
                    x: bytes(32, 1),
                    y: bytes(32, 2),
                },
            },
            EccPrivate { sk: bytes(32, 3) },
        ));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.key_size(), Some(KeySize::Ecc(EcCurve::P256)));

        let mut short = ecc_common(32);
        short.b = bytes(31, 1);
        let bad = KeyParamSpec::Ecc(AsyKeySpec::common(short));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_ecc_cofactor_zero_rejected() {
        let mut common = ecc_common(48);
        common.h = 0;
        assert!(KeyParamSpec::Ecc(AsyKeySpec::common(common)).validate().is_err());
    }

    #[test]
    fn test_dsa_lengths() {
        let spec = KeyParamSpec::Dsa(AsyKeySpec::key_pair(
            DsaCommon {
                p: bytes(256, 0x80),
                q: bytes(32, 0x80),
                g: bytes(256, 0x01),
            },
            DsaPublic { pk: bytes(256, 2) },
            DsaPrivate { sk: bytes(32, 3) },
        ));
        assert!(spec.validate().is_ok());

        let bad = KeyParamSpec::Dsa(AsyKeySpec::common(DsaCommon {
            p: bytes(200, 0x80),
            q: bytes(32, 0x80),
            g: bytes(200, 1),
        }));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_curve25519_lengths() {
        let ok = KeyParamSpec::Ed25519(AsyKeySpec::public_only(
            Curve25519Common,
            Curve25519Public { pk: bytes(32, 9) },
        ));
        assert!(ok.validate().is_ok());
        let bad = KeyParamSpec::X25519(AsyKeySpec::private_only(
            Curve25519Common,
            Curve25519Private { sk: bytes(31, 9) },
        ));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_dh_lengths() {
        let common = DhCommon {
            p: bytes(256, 0xff),
            g: BigInteger::from_u64(2),
            length: 0,
        };
        assert!(KeyParamSpec::Dh(AsyKeySpec::common(common.clone())).validate().is_ok());

        let mut too_long = common;
        too_long.length = 4096;
        assert!(KeyParamSpec::Dh(AsyKeySpec::common(too_long)).validate().is_err());
    }

    #[test]
    fn test_big_integer_helpers() {
        let e = BigInteger::from_u64(65537);
        assert_eq!(e.as_bytes(), &[0x01, 0x00, 0x01]);
        assert_eq!(e.bits(), 17);
        assert_eq!(e.to_u64(), Some(65537));

        let padded = e.to_fixed(5).unwrap();
        assert_eq!(padded.as_bytes(), &[0, 0, 0x01, 0x00, 0x01]);
        assert_eq!(padded.trimmed(), e.as_bytes());
        assert!(e.to_fixed(2).is_err());

        assert_eq!(BigInteger::from_u64(0).as_bytes(), &[0]);
        assert!(BigInteger::from_u64(0).is_zero());
    }

    #[test]
    fn test_debug_hides_value() {
        let secret = BigInteger::from_be_bytes(&[0xaa; 4]);
        assert_eq!(format!("{secret:?}"), "BigInteger(4 bytes)");
    }
}

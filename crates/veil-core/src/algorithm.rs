//! Algorithm vocabulary: families, key sizes, digests, paddings and modes.
//!
//! Every value a descriptor token can resolve to lives here. Families that
//! are named without a size fall back to [`Family::default_key_size`], the
//! one table every primitive consults.

use std::fmt;

/// An algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// RSA.
    Rsa,
    /// DSA.
    Dsa,
    /// ECC over NIST prime curves.
    Ecc,
    /// SM2 over its recommended curve.
    Sm2,
    /// Ed25519 signatures.
    Ed25519,
    /// X25519 key agreement.
    X25519,
    /// Finite-field Diffie-Hellman.
    Dh,
    /// AES block cipher.
    Aes,
    /// SM4 block cipher.
    Sm4,
    /// Single DES.
    Des,
    /// Triple DES (EDE3).
    TripleDes,
    /// HMAC keys.
    Hmac,
    /// HKDF.
    Hkdf,
    /// PBKDF2.
    Pbkdf2,
    /// Scrypt.
    Scrypt,
}

impl Family {
    /// Canonical name used in algorithm strings and key objects.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Dsa => "DSA",
            Self::Ecc => "ECC",
            Self::Sm2 => "SM2",
            Self::Ed25519 => "Ed25519",
            Self::X25519 => "X25519",
            Self::Dh => "DH",
            Self::Aes => "AES",
            Self::Sm4 => "SM4",
            Self::Des => "DES",
            Self::TripleDes => "3DES",
            Self::Hmac => "HMAC",
            Self::Hkdf => "HKDF",
            Self::Pbkdf2 => "PBKDF2",
            Self::Scrypt => "SCRYPT",
        }
    }

    /// Size implied when the family is named without one.
    ///
    /// Families with a single size resolve to it. Families where no size is
    /// a safe guess (AES, DH, HMAC) and the KDFs resolve to `None`.
    #[must_use]
    pub fn default_key_size(self) -> Option<KeySize> {
        match self {
            Self::Rsa => Some(KeySize::Rsa(2048)),
            Self::Dsa => Some(KeySize::Dsa(2048)),
            Self::Ecc => Some(KeySize::Ecc(EcCurve::P256)),
            Self::Sm2 => Some(KeySize::Sm2),
            Self::Ed25519 => Some(KeySize::Ed25519),
            Self::X25519 => Some(KeySize::X25519),
            Self::Sm4 => Some(KeySize::Sm4),
            Self::Des => Some(KeySize::Des),
            Self::TripleDes => Some(KeySize::TripleDes),
            Self::Aes | Self::Dh | Self::Hmac | Self::Hkdf | Self::Pbkdf2 | Self::Scrypt => None,
        }
    }

    /// Whether keys of this family are asymmetric.
    #[must_use]
    pub fn is_asymmetric(self) -> bool {
        matches!(
            self,
            Self::Rsa | Self::Dsa | Self::Ecc | Self::Sm2 | Self::Ed25519 | Self::X25519 | Self::Dh
        )
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// NIST prime curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// secp224r1.
    P224,
    /// secp256r1.
    P256,
    /// secp384r1.
    P384,
    /// secp521r1.
    P521,
}

impl EcCurve {
    /// Field size in bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::P224 => 224,
            Self::P256 => 256,
            Self::P384 => 384,
            Self::P521 => 521,
        }
    }

    /// Field element length in bytes.
    #[must_use]
    pub fn field_len(self) -> usize {
        match self {
            Self::P224 => 28,
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// Standard curve name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::P224 => "NID_secp224r1",
            Self::P256 => "NID_X9_62_prime256v1",
            Self::P384 => "NID_secp384r1",
            Self::P521 => "NID_secp521r1",
        }
    }
}

/// Named finite-field Diffie-Hellman groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DhGroup {
    /// RFC 3526 1536-bit MODP group.
    Modp1536,
    /// RFC 3526 2048-bit MODP group.
    Modp2048,
    /// RFC 3526 3072-bit MODP group.
    Modp3072,
    /// RFC 3526 4096-bit MODP group.
    Modp4096,
    /// RFC 3526 6144-bit MODP group.
    Modp6144,
    /// RFC 3526 8192-bit MODP group.
    Modp8192,
    /// RFC 7919 ffdhe2048.
    Ffdhe2048,
    /// RFC 7919 ffdhe3072.
    Ffdhe3072,
    /// RFC 7919 ffdhe4096.
    Ffdhe4096,
}

impl DhGroup {
    /// Prime size in bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Modp1536 => 1536,
            Self::Modp2048 | Self::Ffdhe2048 => 2048,
            Self::Modp3072 | Self::Ffdhe3072 => 3072,
            Self::Modp4096 | Self::Ffdhe4096 => 4096,
            Self::Modp6144 => 6144,
            Self::Modp8192 => 8192,
        }
    }
}

/// A family fused with its key size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySize {
    /// RSA modulus size in bits.
    Rsa(u32),
    /// DSA prime size in bits.
    Dsa(u32),
    /// ECC curve.
    Ecc(EcCurve),
    /// SM2 256-bit curve.
    Sm2,
    /// Ed25519.
    Ed25519,
    /// X25519.
    X25519,
    /// DH group.
    Dh(DhGroup),
    /// AES key size in bits.
    Aes(u32),
    /// SM4 128-bit key.
    Sm4,
    /// DES 64-bit key.
    Des,
    /// 3DES 192-bit key.
    TripleDes,
}

impl KeySize {
    /// Family this size belongs to.
    #[must_use]
    pub fn family(self) -> Family {
        match self {
            Self::Rsa(_) => Family::Rsa,
            Self::Dsa(_) => Family::Dsa,
            Self::Ecc(_) => Family::Ecc,
            Self::Sm2 => Family::Sm2,
            Self::Ed25519 => Family::Ed25519,
            Self::X25519 => Family::X25519,
            Self::Dh(_) => Family::Dh,
            Self::Aes(_) => Family::Aes,
            Self::Sm4 => Family::Sm4,
            Self::Des => Family::Des,
            Self::TripleDes => Family::TripleDes,
        }
    }

    /// Key size in bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Rsa(bits) | Self::Dsa(bits) | Self::Aes(bits) => bits,
            Self::Ecc(curve) => curve.bits(),
            Self::Dh(group) => group.bits(),
            Self::Sm2 | Self::Ed25519 | Self::X25519 => 256,
            Self::Sm4 => 128,
            Self::Des => 64,
            Self::TripleDes => 192,
        }
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa(bits) => write!(f, "RSA{bits}"),
            Self::Dsa(bits) => write!(f, "DSA{bits}"),
            Self::Ecc(curve) => write!(f, "ECC{}", curve.bits()),
            Self::Sm2 => f.write_str("SM2_256"),
            Self::Ed25519 => f.write_str("Ed25519"),
            Self::X25519 => f.write_str("X25519"),
            Self::Dh(group) => write!(f, "DH_{}", dh_group_suffix(*group)),
            Self::Aes(bits) => write!(f, "AES{bits}"),
            Self::Sm4 => f.write_str("SM4_128"),
            Self::Des => f.write_str("DES64"),
            Self::TripleDes => f.write_str("3DES192"),
        }
    }
}

fn dh_group_suffix(group: DhGroup) -> &'static str {
    match group {
        DhGroup::Modp1536 => "modp1536",
        DhGroup::Modp2048 => "modp2048",
        DhGroup::Modp3072 => "modp3072",
        DhGroup::Modp4096 => "modp4096",
        DhGroup::Modp6144 => "modp6144",
        DhGroup::Modp8192 => "modp8192",
        DhGroup::Ffdhe2048 => "ffdhe2048",
        DhGroup::Ffdhe3072 => "ffdhe3072",
        DhGroup::Ffdhe4096 => "ffdhe4096",
    }
}

/// Message digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlg {
    /// MD5.
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
    /// SM3.
    Sm3,
}

impl DigestAlg {
    /// Every digest, in table order.
    pub const ALL: [Self; 7] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sm3,
    ];

    /// Canonical token.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha224 => "SHA224",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
            Self::Sm3 => "SM3",
        }
    }

    /// Output length in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 | Self::Sm3 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

impl fmt::Display for DigestAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Padding schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Padding {
    /// No padding; input must be block aligned.
    NoPadding,
    /// PKCS#5 (treated as PKCS#7 for every block size).
    Pkcs5,
    /// PKCS#7.
    Pkcs7,
    /// RSA PKCS#1 v1.5.
    Pkcs1,
    /// RSA OAEP.
    Pkcs1Oaep,
    /// RSA PSS.
    Pss,
}

impl Padding {
    /// Canonical token.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NoPadding => "NoPadding",
            Self::Pkcs5 => "PKCS5",
            Self::Pkcs7 => "PKCS7",
            Self::Pkcs1 => "PKCS1",
            Self::Pkcs1Oaep => "PKCS1_OAEP",
            Self::Pss => "PSS",
        }
    }
}

/// Block cipher modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMode {
    /// Electronic codebook.
    Ecb,
    /// Cipher block chaining.
    Cbc,
    /// Counter.
    Ctr,
    /// Output feedback.
    Ofb,
    /// Cipher feedback, full block.
    Cfb,
    /// 1-bit CFB.
    Cfb1,
    /// 8-bit CFB.
    Cfb8,
    /// 64-bit CFB.
    Cfb64,
    /// 128-bit CFB.
    Cfb128,
    /// Galois/counter mode.
    Gcm,
    /// Counter with CBC-MAC.
    Ccm,
}

impl CipherMode {
    /// Canonical token.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ecb => "ECB",
            Self::Cbc => "CBC",
            Self::Ctr => "CTR",
            Self::Ofb => "OFB",
            Self::Cfb => "CFB",
            Self::Cfb1 => "CFB1",
            Self::Cfb8 => "CFB8",
            Self::Cfb64 => "CFB64",
            Self::Cfb128 => "CFB128",
            Self::Gcm => "GCM",
            Self::Ccm => "CCM",
        }
    }

    /// Whether the mode needs an IV.
    #[must_use]
    pub fn needs_iv(self) -> bool {
        !matches!(self, Self::Ecb)
    }

    /// Whether the mode encrypts whole blocks, so a padding scheme applies.
    /// Every other mode produces output of the input's length.
    #[must_use]
    pub fn is_block_mode(self) -> bool {
        matches!(self, Self::Ecb | Self::Cbc)
    }
}

/// Number of RSA primes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Primes {
    /// Two primes.
    #[default]
    Two,
    /// Three primes.
    Three,
    /// Four primes.
    Four,
    /// Five primes.
    Five,
}

impl Primes {
    /// Prime count.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    /// Largest prime count allowed for an RSA modulus of `bits`.
    #[must_use]
    pub fn max_for_rsa_bits(bits: u32) -> Self {
        match bits {
            0..=1023 => Self::Two,
            1024..=4095 => Self::Three,
            4096..=8191 => Self::Four,
            _ => Self::Five,
        }
    }
}

/// HKDF operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HkdfMode {
    /// Extract then expand.
    #[default]
    ExtractAndExpand,
    /// Extract only; output is the PRK.
    ExtractOnly,
    /// Expand only; the key is taken as the PRK.
    ExpandOnly,
}

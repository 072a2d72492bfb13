//! Names the built-in backends accept, per primitive.
//!
//! Descriptors combine freely, so this is a representative list rather than
//! every accepted spelling. Each entry constructs successfully.

/// Primitive a catalog entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// [`Md`](crate::md::Md).
    Md,
    /// [`Mac`](crate::mac::Mac).
    Mac,
    /// [`SymKeyGenerator`](crate::sym_key::SymKeyGenerator).
    SymKey,
    /// [`Cipher`](crate::cipher::Cipher).
    Cipher,
    /// [`AsyKeyGenerator`](crate::asy_key::AsyKeyGenerator).
    AsyKey,
    /// [`Sign`](crate::signature::Sign) and [`Verify`](crate::signature::Verify).
    Signature,
    /// [`KeyAgreement`](crate::key_agreement::KeyAgreement).
    KeyAgreement,
    /// [`Kdf`](crate::kdf::Kdf).
    Kdf,
}

impl Primitive {
    /// Every primitive, in display order.
    pub const ALL: [Self; 8] = [
        Self::Md,
        Self::Mac,
        Self::SymKey,
        Self::Cipher,
        Self::AsyKey,
        Self::Signature,
        Self::KeyAgreement,
        Self::Kdf,
    ];

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md => "Md",
            Self::Mac => "Mac",
            Self::SymKey => "SymKeyGenerator",
            Self::Cipher => "Cipher",
            Self::AsyKey => "AsyKeyGenerator",
            Self::Signature => "Sign/Verify",
            Self::KeyAgreement => "KeyAgreement",
            Self::Kdf => "Kdf",
        }
    }

    /// Supported names.
    #[must_use]
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Md => &["MD5", "SHA1", "SHA224", "SHA256", "SHA384", "SHA512", "SM3"],
            Self::Mac => &[
                "HMAC|MD5",
                "HMAC|SHA1",
                "HMAC|SHA224",
                "HMAC|SHA256",
                "HMAC|SHA384",
                "HMAC|SHA512",
                "HMAC|SM3",
            ],
            Self::SymKey => &[
                "AES128", "AES192", "AES256", "SM4_128", "DES64", "3DES192", "HMAC|SHA256", "HMAC",
            ],
            Self::Cipher => &[
                "AES128|ECB|PKCS7",
                "AES256|CBC|PKCS7",
                "AES256|CTR|NoPadding",
                "AES256|GCM|NoPadding",
                "3DES192|ECB|PKCS5",
                "3DES192|CBC|PKCS5",
                "RSA2048|PKCS1",
                "RSA2048|PKCS1_OAEP|SHA256|MGF1_SHA256",
            ],
            Self::AsyKey => &[
                "RSA1024|PRIMES_2",
                "RSA2048|PRIMES_2",
                "RSA3072|PRIMES_2",
                "RSA4096|PRIMES_2",
                "ECC256",
                "ECC384",
                "DSA1024",
                "DSA2048",
                "DSA3072",
                "Ed25519",
                "X25519",
                "DH_modp1536",
                "DH_modp2048",
                "DH_modp3072",
                "DH_modp4096",
                "DH_modp6144",
                "DH_modp8192",
                "DH_ffdhe2048",
                "DH_ffdhe3072",
                "DH_ffdhe4096",
            ],
            Self::Signature => &[
                "RSA2048|PKCS1|SHA256",
                "RSA2048|PSS|SHA256|MGF1_SHA256",
                "ECC256|SHA256",
                "ECC384|SHA384",
                "DSA2048|SHA256",
                "Ed25519",
            ],
            Self::KeyAgreement => &["ECC256", "ECC384", "X25519", "DH_modp2048", "DH_ffdhe2048"],
            Self::Kdf => &[
                "HKDF|SHA256",
                "HKDF|SHA256|EXTRACT_ONLY",
                "HKDF|SHA256|EXPAND_ONLY",
                "PBKDF2|SHA256",
                "SCRYPT",
            ],
        }
    }
}

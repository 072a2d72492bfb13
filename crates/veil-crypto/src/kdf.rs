//! Key derivation: HKDF, PBKDF2 and scrypt.

use tracing::debug;
use veil_core::descriptor::unexpected_token;
use veil_core::{Blob, CryptoError, CryptoResult, Family, HkdfMode, Token, crypto_object};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::backend::kdf::{HkdfBackend, Pbkdf2Backend, ScryptBackend};
use crate::selector::{Accepts, Selector};
use crate::spi::KdfSpi;

/// HKDF input. In expand-only mode `key` is the PRK; in extract-only mode
/// `output_len` must equal the digest length.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct HkdfParams {
    /// Input keying material.
    pub key: Vec<u8>,
    /// Extraction salt, possibly empty.
    pub salt: Vec<u8>,
    /// Context info for expansion.
    pub info: Vec<u8>,
    /// Bytes to derive.
    pub output_len: usize,
}

/// PBKDF2 input.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Pbkdf2Params {
    /// Password.
    pub password: Vec<u8>,
    /// Salt.
    pub salt: Vec<u8>,
    /// Iteration count, at least 1.
    pub iterations: u32,
    /// Bytes to derive.
    pub output_len: usize,
}

/// scrypt input.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct ScryptParams {
    /// Passphrase.
    pub passphrase: Vec<u8>,
    /// Salt.
    pub salt: Vec<u8>,
    /// CPU/memory cost, a power of two above 1.
    pub n: u64,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
    /// Upper bound on `128 * r * n` bytes of working memory.
    pub max_mem: u64,
    /// Bytes to derive.
    pub output_len: usize,
}

/// Input to [`Kdf::generate_secret`], one variant per KDF.
#[derive(Clone)]
pub enum KdfParamsSpec {
    /// HKDF.
    Hkdf(HkdfParams),
    /// PBKDF2.
    Pbkdf2(Pbkdf2Params),
    /// scrypt.
    Scrypt(ScryptParams),
}

/// A key derivation function.
///
/// # Example
///
/// ```
/// use veil_crypto::kdf::{Kdf, KdfParamsSpec, Pbkdf2Params};
///
/// let mut kdf = Kdf::create("PBKDF2|SHA256").unwrap();
/// let key = kdf
///     .generate_secret(&KdfParamsSpec::Pbkdf2(Pbkdf2Params {
///         password: b"password".to_vec(),
///         salt: b"salt".to_vec(),
///         iterations: 1,
///         output_len: 32,
///     }))
///     .unwrap();
/// assert_eq!(key.len(), 32);
/// ```
pub struct Kdf {
    spi: Box<dyn KdfSpi>,
    algorithm: String,
}

crypto_object!(Kdf, "Kdf");

impl Kdf {
    /// Create a KDF from `"HKDF|<digest>[|<mode>]"`, `"PBKDF2|<digest>"` or
    /// `"SCRYPT"`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a malformed name, a missing
    /// digest, or a digest or mode the KDF does not take.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let accepts = Accepts {
            family: true,
            digest: true,
            hkdf_mode: true,
            ..Accepts::default()
        };
        let selector = Selector::parse(name, "Kdf", accepts)?;
        let family = selector.family()?;
        if family != Family::Hkdf
            && let Some(mode) = selector.hkdf_mode
        {
            return Err(unexpected_token("Kdf", Token::HkdfMode(mode)));
        }
        let spi: Box<dyn KdfSpi> = match family {
            Family::Hkdf => Box::new(HkdfBackend::new(
                selector.digest()?,
                selector.hkdf_mode.unwrap_or(HkdfMode::ExtractAndExpand),
            )),
            Family::Pbkdf2 => Box::new(Pbkdf2Backend::new(selector.digest()?)),
            Family::Scrypt => {
                selector.forbid_digest()?;
                Box::new(ScryptBackend)
            },
            other => {
                return Err(CryptoError::InvalidParams(format!("{other} is not a KDF")));
            },
        };
        debug!(algorithm = name, %family, "created KDF");
        Ok(Self::from_spi(spi, name))
    }

    /// Wrap a caller-supplied backend.
    #[must_use]
    pub fn from_spi(spi: Box<dyn KdfSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            algorithm: algorithm.into(),
        }
    }

    /// Derive key material.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for parameters of another KDF,
    /// a zero output length or iteration count, or scrypt costs outside
    /// their limits.
    pub fn generate_secret(&mut self, params: &KdfParamsSpec) -> CryptoResult<Blob> {
        self.spi.derive(params)
    }

    /// Algorithm name as given to [`Kdf::create`].
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hkdf_rfc5869_case_1() {
        let mut kdf = Kdf::create("HKDF|SHA256").unwrap();
        let okm = kdf
            .generate_secret(&KdfParamsSpec::Hkdf(HkdfParams {
                key: vec![0x0b; 22],
                salt: hex::decode("000102030405060708090a0b0c").unwrap(),
                info: hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap(),
                output_len: 42,
            }))
            .unwrap();
        assert_eq!(
            okm.to_hex(),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf\
             34007208d5b887185865"
        );
    }

    #[test]
    fn test_hkdf_expand_only_matches_full() {
        let prk = hex::decode("077709362c2e32df0ddc3f0dc47bba6390b6c73bb50f9c3122ec844ad7c2b3e5")
            .unwrap();
        let mut kdf = Kdf::create("HKDF|SHA256|EXPAND_ONLY").unwrap();
        let okm = kdf
            .generate_secret(&KdfParamsSpec::Hkdf(HkdfParams {
                key: prk,
                salt: Vec::new(),
                info: hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap(),
                output_len: 42,
            }))
            .unwrap();
        assert!(okm.to_hex().starts_with("3cb25f25faacd57a"));
    }

    #[test]
    fn test_pbkdf2_rfc7914() {
        let mut kdf = Kdf::create("PBKDF2|SHA256").unwrap();
        let key = kdf
            .generate_secret(&KdfParamsSpec::Pbkdf2(Pbkdf2Params {
                password: b"passwd".to_vec(),
                salt: b"salt".to_vec(),
                iterations: 1,
                output_len: 64,
            }))
            .unwrap();
        assert_eq!(
            key.to_hex(),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc\
             49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
        );
    }

    #[test]
    fn test_zero_iterations() {
        let mut kdf = Kdf::create("PBKDF2|SHA1").unwrap();
        let params = KdfParamsSpec::Pbkdf2(Pbkdf2Params {
            password: b"p".to_vec(),
            salt: b"s".to_vec(),
            iterations: 0,
            output_len: 16,
        });
        assert!(matches!(
            kdf.generate_secret(&params),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_scrypt_rfc7914_case_2() {
        let mut kdf = Kdf::create("SCRYPT").unwrap();
        let key = kdf
            .generate_secret(&KdfParamsSpec::Scrypt(ScryptParams {
                passphrase: b"password".to_vec(),
                salt: b"NaCl".to_vec(),
                n: 1024,
                r: 8,
                p: 16,
                max_mem: u64::MAX,
                output_len: 64,
            }))
            .unwrap();
        assert_eq!(
            key.to_hex(),
            "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162\
             2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640"
        );
    }

    #[test]
    fn test_create_rejections() {
        for name in ["HKDF", "PBKDF2", "SCRYPT|SHA256", "PBKDF2|SHA256|EXPAND_ONLY", "AES128"] {
            assert!(
                matches!(Kdf::create(name), Err(CryptoError::InvalidParams(_))),
                "{name}"
            );
        }
    }
}

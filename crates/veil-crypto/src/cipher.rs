//! Symmetric and RSA encryption.
//!
//! Block ciphers take a [`SymKey`]; RSA takes a [`PubKey`] to encrypt and a
//! [`PriKey`] to decrypt. Modes other than CTR hold input back until
//! [`Cipher::do_final`], where padding and authentication are applied.

use tracing::debug;
use veil_core::descriptor::unexpected_token;
use veil_core::{
    Blob, CipherMode, CryptoError, CryptoResult, Family, Padding, StreamState, Token,
    crypto_object,
};
use zeroize::Zeroize;

use crate::asy_key::{PriKey, PubKey};
use crate::backend::block::{BlockAlg, BlockCipherBackend};
use crate::backend::rsa::{RsaCipherBackend, RsaCipherPadding};
use crate::selector::{Accepts, Selector};
use crate::spi::{CipherKeyRef, CipherSpi};
use crate::sym_key::SymKey;

/// Direction of a cipher operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoMode {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

/// IV for CBC and CTR.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
pub struct IvParamsSpec {
    /// One block of IV or initial counter.
    pub iv: Vec<u8>,
}

/// GCM parameters.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
pub struct GcmParamsSpec {
    /// 12-byte nonce.
    pub iv: Vec<u8>,
    /// Additional authenticated data, possibly empty.
    pub aad: Vec<u8>,
    /// 16-byte tag to check when decrypting. Ignored when encrypting.
    pub auth_tag: Vec<u8>,
}

/// Mode parameters handed to [`Cipher::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsSpec {
    /// An IV.
    Iv(IvParamsSpec),
    /// GCM nonce, AAD and tag.
    Gcm(GcmParamsSpec),
}

/// Key handed to [`Cipher::init`].
#[derive(Debug, Clone, Copy)]
pub enum CipherKey<'a> {
    /// Block cipher key.
    Sym(&'a SymKey),
    /// RSA encryption key.
    Public(&'a PubKey),
    /// RSA decryption key.
    Private(&'a PriKey),
}

impl<'a> From<&'a SymKey> for CipherKey<'a> {
    fn from(key: &'a SymKey) -> Self {
        Self::Sym(key)
    }
}

impl<'a> From<&'a PubKey> for CipherKey<'a> {
    fn from(key: &'a PubKey) -> Self {
        Self::Public(key)
    }
}

impl<'a> From<&'a PriKey> for CipherKey<'a> {
    fn from(key: &'a PriKey) -> Self {
        Self::Private(key)
    }
}

/// A streaming encryptor or decryptor.
///
/// # Example
///
/// ```
/// use veil_crypto::cipher::{Cipher, CryptoMode, IvParamsSpec, ParamsSpec};
/// use veil_crypto::sym_key::SymKeyGenerator;
///
/// let key = SymKeyGenerator::create("AES128").unwrap().generate_sym_key().unwrap();
/// let iv = ParamsSpec::Iv(IvParamsSpec { iv: vec![0u8; 16] });
///
/// let mut cipher = Cipher::create("AES128|CBC|PKCS7").unwrap();
/// cipher.init(CryptoMode::Encrypt, (&key).into(), Some(&iv)).unwrap();
/// let ciphertext = cipher.do_final(b"attack at dawn").unwrap();
///
/// cipher.init(CryptoMode::Decrypt, (&key).into(), Some(&iv)).unwrap();
/// assert_eq!(cipher.do_final(ciphertext.as_slice()).unwrap().as_slice(), b"attack at dawn");
/// ```
pub struct Cipher {
    spi: Box<dyn CipherSpi>,
    state: StreamState,
    algorithm: String,
}

crypto_object!(Cipher, "Cipher");

impl Cipher {
    /// Create a cipher from a name such as `"AES256|GCM|NoPadding"`,
    /// `"3DES192|CBC|PKCS5"` or `"RSA2048|PKCS1_OAEP|SHA256|MGF1_SHA256"`.
    ///
    /// A block cipher without a mode runs in ECB; without a padding it uses
    /// PKCS#7. OAEP without an MGF1 digest uses the message digest.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a malformed name or a token
    /// that does not fit the family, and [`CryptoError::NotSupported`] for
    /// SM4, SM2, RSA without padding, and the OFB, CFB and CCM modes.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let accepts = Accepts {
            family: true,
            digest: true,
            mgf1: true,
            padding: true,
            mode: true,
            ..Accepts::default()
        };
        let selector = Selector::parse(name, "Cipher", accepts)?;
        let family = selector.family()?;
        let spi: Box<dyn CipherSpi> = match family {
            Family::Aes | Family::TripleDes | Family::Des => block_cipher(&selector)?,
            Family::Rsa => rsa_cipher(&selector)?,
            Family::Sm4 | Family::Sm2 => {
                return Err(CryptoError::NotSupported(format!("no {family} cipher backend")));
            },
            other => {
                return Err(CryptoError::InvalidParams(format!(
                    "{other} is not a cipher"
                )));
            },
        };
        debug!(algorithm = name, %family, "created cipher");
        Ok(Self::from_spi(spi, name))
    }

    /// Wrap a caller-supplied backend. The cipher still needs a key.
    #[must_use]
    pub fn from_spi(spi: Box<dyn CipherSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            state: StreamState::Uninitialized,
            algorithm: algorithm.into(),
        }
    }

    /// Key the cipher for one direction, discarding any buffered input.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a key of the wrong kind or
    /// length, or missing or malformed mode parameters.
    pub fn init(
        &mut self,
        mode: CryptoMode,
        key: CipherKey<'_>,
        params: Option<&ParamsSpec>,
    ) -> CryptoResult<()> {
        let key = match key {
            CipherKey::Sym(key) => CipherKeyRef::Symmetric(key.bytes()),
            CipherKey::Public(key) => CipherKeyRef::Public(key.spi()),
            CipherKey::Private(key) => CipherKeyRef::Private(key.spi()?),
        };
        self.spi.init(mode, key, params)?;
        self.state.init();
        Ok(())
    }

    /// Process a chunk. Returns whatever output is ready, possibly nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the cipher is not keyed.
    pub fn update(&mut self, input: &[u8]) -> CryptoResult<Blob> {
        self.state.ensure_ready("Cipher::update")?;
        let output = self.spi.update(input)?;
        self.state.update("Cipher::update")?;
        Ok(output)
    }

    /// Process the last chunk and flush.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::OperationFailed`] for unaligned input without
    /// padding, bad padding or a failed GCM tag check.
    pub fn do_final(&mut self, input: &[u8]) -> CryptoResult<Blob> {
        self.state.finish("Cipher::do_final")?;
        self.spi.do_final(input)
    }

    /// Algorithm name as given to [`Cipher::create`].
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

fn block_cipher(selector: &Selector) -> CryptoResult<Box<dyn CipherSpi>> {
    selector.forbid_digest()?;
    if let Some(mgf1) = selector.mgf1 {
        return Err(unexpected_token("Cipher", Token::Mgf1Digest(mgf1)));
    }
    let size = selector.key_size()?;
    let alg = BlockAlg::from_key_size(size).ok_or_else(|| {
        CryptoError::InvalidParams(format!("{size} is not a block cipher size"))
    })?;
    let mode = selector.mode.unwrap_or(CipherMode::Ecb);
    let padded = match selector.padding {
        None => mode.is_block_mode(),
        Some(Padding::NoPadding) => false,
        Some(padding @ (Padding::Pkcs5 | Padding::Pkcs7)) if !mode.is_block_mode() => {
            return Err(CryptoError::InvalidParams(format!(
                "{} mode takes no padding, got {}",
                mode.name(),
                Token::Padding(padding)
            )));
        },
        Some(Padding::Pkcs5 | Padding::Pkcs7) => true,
        Some(other) => return Err(unexpected_token("Cipher", Token::Padding(other))),
    };
    Ok(Box::new(BlockCipherBackend::new(alg, mode, padded)?))
}

fn rsa_cipher(selector: &Selector) -> CryptoResult<Box<dyn CipherSpi>> {
    if let Some(mode) = selector.mode {
        return Err(unexpected_token("Cipher", Token::Mode(mode)));
    }
    let padding = match selector.padding {
        Some(Padding::Pkcs1) => {
            selector.forbid_digest()?;
            if let Some(mgf1) = selector.mgf1 {
                return Err(unexpected_token("Cipher", Token::Mgf1Digest(mgf1)));
            }
            RsaCipherPadding::Pkcs1
        },
        Some(Padding::Pkcs1Oaep) => {
            let md = selector.digest()?;
            RsaCipherPadding::Oaep {
                md,
                mgf1: selector.mgf1.unwrap_or(md),
            }
        },
        Some(Padding::NoPadding) => {
            return Err(CryptoError::NotSupported("raw RSA without padding".into()));
        },
        Some(other) => return Err(unexpected_token("Cipher", Token::Padding(other))),
        None => {
            return Err(CryptoError::InvalidParams(
                "RSA cipher name needs PKCS1 or PKCS1_OAEP".into(),
            ));
        },
    };
    Ok(Box::new(RsaCipherBackend::new(padding)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym_key::SymKeyGenerator;

    fn aes_key(bytes: &[u8]) -> SymKey {
        let name = match bytes.len() {
            16 => "AES128",
            24 => "AES192",
            _ => "AES256",
        };
        SymKeyGenerator::create(name)
            .unwrap()
            .convert_sym_key(bytes)
            .unwrap()
    }

    #[test]
    fn test_ecb_nist_vector() {
        let key = aes_key(&hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap());
        let mut cipher = Cipher::create("AES128|ECB|NoPadding").unwrap();
        cipher.init(CryptoMode::Encrypt, (&key).into(), None).unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        assert_eq!(
            cipher.do_final(&plaintext).unwrap().to_hex(),
            "3ad77bb40d7a3660a89ecaf32466ef97"
        );
    }

    #[test]
    fn test_ctr_streams_in_update() {
        let key = aes_key(&[5u8; 32]);
        let iv = ParamsSpec::Iv(IvParamsSpec { iv: vec![9u8; 16] });
        let mut cipher = Cipher::create("AES256|CTR|NoPadding").unwrap();
        cipher.init(CryptoMode::Encrypt, (&key).into(), Some(&iv)).unwrap();
        let first = cipher.update(b"hello ").unwrap();
        assert_eq!(first.len(), 6);
        let rest = cipher.do_final(b"world").unwrap();

        let mut ciphertext = first.into_vec();
        ciphertext.extend_from_slice(rest.as_slice());
        cipher.init(CryptoMode::Decrypt, (&key).into(), Some(&iv)).unwrap();
        assert_eq!(cipher.do_final(&ciphertext).unwrap().as_slice(), b"hello world");

        let mut unpadded = Cipher::create("AES256|CTR").unwrap();
        unpadded.init(CryptoMode::Encrypt, (&key).into(), Some(&iv)).unwrap();
        assert_eq!(unpadded.do_final(b"hello world").unwrap().as_slice(), ciphertext.as_slice());
    }

    #[test]
    fn test_defaults_to_ecb_pkcs7() {
        let key = aes_key(&[1u8; 16]);
        let mut cipher = Cipher::create("AES128").unwrap();
        cipher.init(CryptoMode::Encrypt, (&key).into(), None).unwrap();
        assert_eq!(cipher.do_final(b"short").unwrap().len(), 16);
    }

    #[test]
    fn test_state_machine() {
        let key = aes_key(&[1u8; 16]);
        let mut cipher = Cipher::create("AES128|ECB|PKCS7").unwrap();
        assert!(matches!(
            cipher.update(b"x"),
            Err(CryptoError::InvalidParams(_))
        ));
        cipher.init(CryptoMode::Encrypt, (&key).into(), None).unwrap();
        cipher.do_final(b"x").unwrap();
        assert!(cipher.do_final(b"x").is_err());
    }

    #[test]
    fn test_unsupported_combinations() {
        for name in [
            "SM4_128|ECB|PKCS7",
            "AES128|OFB|NoPadding",
            "AES128|CCM|NoPadding",
            "3DES192|GCM|NoPadding",
            "RSA2048|NoPadding",
        ] {
            assert!(
                matches!(Cipher::create(name), Err(CryptoError::NotSupported(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in [
            "AES128|CBC|PKCS1",
            "AES128|CTR|PKCS7",
            "AES256|GCM|PKCS5",
            "AES128|SHA256",
            "RSA2048|CBC|PKCS1",
            "RSA2048",
            "RSA2048|PKCS1_OAEP",
            "HMAC|SHA256",
        ] {
            assert!(
                matches!(Cipher::create(name), Err(CryptoError::InvalidParams(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn test_wrong_key_kind() {
        let key = aes_key(&[1u8; 16]);
        let mut cipher = Cipher::create("RSA1024|PKCS1").unwrap();
        assert!(matches!(
            cipher.init(CryptoMode::Encrypt, (&key).into(), None),
            Err(CryptoError::InvalidParams(_))
        ));
    }
}

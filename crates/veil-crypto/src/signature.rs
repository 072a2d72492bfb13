//! Signing and verification.

use tracing::debug;
use veil_core::descriptor::unexpected_token;
use veil_core::{
    Blob, CryptoError, CryptoResult, DigestAlg, EcCurve, Family, KeySize, Padding, StreamState,
    Token, crypto_object,
};

use crate::asy_key::{PriKey, PubKey};
use crate::backend::curve25519::{Ed25519SignBackend, Ed25519VerifyBackend};
use crate::backend::dsa::{DsaSignBackend, DsaVerifyBackend};
use crate::backend::ecc::{EcdsaSignBackend, EcdsaVerifyBackend};
use crate::backend::rsa::{RsaSignBackend, RsaSignPadding, RsaVerifyBackend};
use crate::selector::{Accepts, Selector};
use crate::spi::{SignSpi, VerifySpi};

/// Tunable and readable parameters of a signature scheme. Only RSA-PSS has
/// any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignSpecItem {
    /// Message digest name.
    PssMdName,
    /// Mask generation function name, always `"MGF1"`.
    PssMgfName,
    /// Digest used by MGF1.
    PssMgf1MdName,
    /// Salt length in bytes.
    PssSaltLen,
    /// Trailer field, always 1.
    PssTrailerField,
}

/// A scheme resolved from an algorithm name, shared by [`Sign`] and
/// [`Verify`].
#[derive(Debug, Clone, Copy)]
enum Scheme {
    Rsa(DigestAlg, RsaSignPadding),
    Ecdsa(EcCurve, DigestAlg),
    Dsa(DigestAlg),
    Ed25519,
}

impl Scheme {
    fn resolve(name: &str, primitive: &'static str) -> CryptoResult<Self> {
        let accepts = Accepts {
            family: true,
            digest: true,
            mgf1: true,
            padding: true,
            ..Accepts::default()
        };
        let selector = Selector::parse(name, primitive, accepts)?;
        let family = selector.family()?;
        let scheme = match family {
            Family::Rsa => Self::Rsa(selector.digest()?, rsa_padding(&selector, primitive)?),
            Family::Ecc => {
                forbid_padding(&selector, primitive)?;
                let KeySize::Ecc(curve) = selector.key_size()? else {
                    return Err(CryptoError::InvalidParams("ECC name needs a curve".into()));
                };
                Self::Ecdsa(curve, selector.digest()?)
            },
            Family::Dsa => {
                forbid_padding(&selector, primitive)?;
                Self::Dsa(selector.digest()?)
            },
            Family::Ed25519 => {
                forbid_padding(&selector, primitive)?;
                selector.forbid_digest()?;
                Self::Ed25519
            },
            Family::Sm2 => {
                return Err(CryptoError::NotSupported("no SM2 signature backend".into()));
            },
            other => {
                return Err(CryptoError::InvalidParams(format!(
                    "{other} is not a signature algorithm"
                )));
            },
        };
        debug!(algorithm = name, primitive, %family, "resolved signature scheme");
        Ok(scheme)
    }

    fn signer(self) -> CryptoResult<Box<dyn SignSpi>> {
        Ok(match self {
            Self::Rsa(md, padding) => Box::new(RsaSignBackend::new(md, padding)?),
            Self::Ecdsa(curve, md) => Box::new(EcdsaSignBackend::new(curve, md)?),
            Self::Dsa(md) => Box::new(DsaSignBackend::new(md)),
            Self::Ed25519 => Box::new(Ed25519SignBackend::default()),
        })
    }

    fn verifier(self) -> CryptoResult<Box<dyn VerifySpi>> {
        Ok(match self {
            Self::Rsa(md, padding) => Box::new(RsaVerifyBackend::new(md, padding)?),
            Self::Ecdsa(curve, md) => Box::new(EcdsaVerifyBackend::new(curve, md)?),
            Self::Dsa(md) => Box::new(DsaVerifyBackend::new(md)),
            Self::Ed25519 => Box::new(Ed25519VerifyBackend::default()),
        })
    }
}

fn forbid_mgf1(selector: &Selector, primitive: &str) -> CryptoResult<()> {
    match selector.mgf1 {
        Some(mgf1) => Err(unexpected_token(primitive, Token::Mgf1Digest(mgf1))),
        None => Ok(()),
    }
}

fn forbid_padding(selector: &Selector, primitive: &str) -> CryptoResult<()> {
    if let Some(padding) = selector.padding {
        return Err(unexpected_token(primitive, Token::Padding(padding)));
    }
    forbid_mgf1(selector, primitive)
}

/// PSS defaults MGF1 to the message digest and the salt to the digest length.
fn rsa_padding(selector: &Selector, primitive: &str) -> CryptoResult<RsaSignPadding> {
    let md = selector.digest()?;
    match selector.padding {
        Some(Padding::Pkcs1) => {
            forbid_mgf1(selector, primitive)?;
            Ok(RsaSignPadding::Pkcs1)
        },
        Some(Padding::Pss) => Ok(RsaSignPadding::Pss {
            mgf1: selector.mgf1.unwrap_or(md),
            salt_len: md.output_len(),
        }),
        Some(Padding::NoPadding) => Err(CryptoError::NotSupported(
            "raw RSA signatures without padding".into(),
        )),
        Some(other) => Err(unexpected_token(primitive, Token::Padding(other))),
        None => Err(CryptoError::InvalidParams(
            "RSA signature name needs PKCS1 or PSS".into(),
        )),
    }
}

/// A streaming signer.
pub struct Sign {
    spi: Box<dyn SignSpi>,
    state: StreamState,
    algorithm: String,
}

crypto_object!(Sign, "Sign");

impl Sign {
    /// Create a signer from a name such as `"RSA2048|PSS|SHA256|MGF1_SHA256"`,
    /// `"ECC256|SHA256"`, `"DSA2048|SHA256"` or `"Ed25519"`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a malformed name or a
    /// missing digest, and [`CryptoError::NotSupported`] for SM2, unsupported
    /// curves, and PSS with an MGF1 digest other than the message digest.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let spi = Scheme::resolve(name, "Sign")?.signer()?;
        Ok(Self::from_spi(spi, name))
    }

    /// Wrap a caller-supplied backend. The signer still needs a key.
    #[must_use]
    pub fn from_spi(spi: Box<dyn SignSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            state: StreamState::Uninitialized,
            algorithm: algorithm.into(),
        }
    }

    /// Bind the private key and start a new message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a key of another family or
    /// curve, or a cleared key.
    pub fn init(&mut self, key: &PriKey) -> CryptoResult<()> {
        self.spi.init(key.spi()?)?;
        self.state.init();
        Ok(())
    }

    /// Absorb data.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] before `init`, and
    /// [`CryptoError::NotSupported`] for Ed25519, which signs in one call.
    pub fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.state.ensure_ready("Sign::update")?;
        self.spi.update(data)?;
        self.state.update("Sign::update")
    }

    /// Absorb `data` and sign the whole message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] before `init`, and
    /// [`CryptoError::OperationFailed`] if the backend cannot sign, e.g. an
    /// RSA key too small for the digest.
    pub fn sign(&mut self, data: &[u8]) -> CryptoResult<Blob> {
        self.state.finish("Sign::sign")?;
        self.spi.sign(data)
    }

    /// Set an integer scheme parameter, e.g. the PSS salt length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the scheme has no such
    /// settable parameter or the value is out of range.
    pub fn set_sign_spec_int(&mut self, item: SignSpecItem, value: i32) -> CryptoResult<()> {
        self.spi.set_spec_int(item, value)
    }

    /// Read an integer scheme parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the scheme has no such
    /// parameter.
    pub fn get_sign_spec_int(&self, item: SignSpecItem) -> CryptoResult<i32> {
        self.spi.spec_int(item)
    }

    /// Read a string scheme parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the scheme has no such
    /// parameter.
    pub fn get_sign_spec_string(&self, item: SignSpecItem) -> CryptoResult<String> {
        self.spi.spec_string(item)
    }

    /// Algorithm name as given to [`Sign::create`].
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

/// A streaming verifier.
pub struct Verify {
    spi: Box<dyn VerifySpi>,
    state: StreamState,
    algorithm: String,
}

crypto_object!(Verify, "Verify");

impl Verify {
    /// Create a verifier. Names are the same as for [`Sign::create`].
    ///
    /// # Errors
    ///
    /// As for [`Sign::create`].
    pub fn create(name: &str) -> CryptoResult<Self> {
        let spi = Scheme::resolve(name, "Verify")?.verifier()?;
        Ok(Self::from_spi(spi, name))
    }

    /// Wrap a caller-supplied backend. The verifier still needs a key.
    #[must_use]
    pub fn from_spi(spi: Box<dyn VerifySpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            state: StreamState::Uninitialized,
            algorithm: algorithm.into(),
        }
    }

    /// Bind the public key and start a new message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a key of another family or
    /// curve.
    pub fn init(&mut self, key: &PubKey) -> CryptoResult<()> {
        self.spi.init(key.spi())?;
        self.state.init();
        Ok(())
    }

    /// Absorb data.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] before `init`, and
    /// [`CryptoError::NotSupported`] for Ed25519.
    pub fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.state.ensure_ready("Verify::update")?;
        self.spi.update(data)?;
        self.state.update("Verify::update")
    }

    /// Absorb `data` and check `signature` over the whole message. A
    /// signature that does not verify is `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] before `init`.
    pub fn verify(&mut self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        self.state.finish("Verify::verify")?;
        self.spi.verify(data, signature)
    }

    /// Set an integer scheme parameter, e.g. the PSS salt length.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the scheme has no such
    /// settable parameter or the value is out of range.
    pub fn set_sign_spec_int(&mut self, item: SignSpecItem, value: i32) -> CryptoResult<()> {
        self.spi.set_spec_int(item, value)
    }

    /// Read an integer scheme parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the scheme has no such
    /// parameter.
    pub fn get_sign_spec_int(&self, item: SignSpecItem) -> CryptoResult<i32> {
        self.spi.spec_int(item)
    }

    /// Read a string scheme parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the scheme has no such
    /// parameter.
    pub fn get_sign_spec_string(&self, item: SignSpecItem) -> CryptoResult<String> {
        self.spi.spec_string(item)
    }

    /// Algorithm name as given to [`Verify::create`].
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

//! Folds a parsed algorithm name into the fields a facade dispatches on.

use tracing::debug;
use veil_core::descriptor::{self, resolve_key_size, unexpected_token};
use veil_core::{
    ALGORITHM_RULES, CipherMode, CryptoError, CryptoResult, DescriptorSink, DigestAlg, Family,
    HkdfMode, KeySize, Padding, Primes, Token,
};

/// Token kinds a primitive accepts besides its family.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accepts {
    pub(crate) family: bool,
    pub(crate) digest: bool,
    pub(crate) mgf1: bool,
    pub(crate) padding: bool,
    pub(crate) mode: bool,
    pub(crate) primes: bool,
    pub(crate) hkdf_mode: bool,
}

/// Resolved selector. Later tokens of a kind overwrite earlier ones.
#[derive(Debug, Clone)]
pub(crate) struct Selector {
    primitive: &'static str,
    accepts: Accepts,
    pub(crate) family: Option<Family>,
    pub(crate) size: Option<KeySize>,
    pub(crate) digest: Option<DigestAlg>,
    pub(crate) mgf1: Option<DigestAlg>,
    pub(crate) padding: Option<Padding>,
    pub(crate) mode: Option<CipherMode>,
    pub(crate) primes: Option<Primes>,
    pub(crate) hkdf_mode: Option<HkdfMode>,
}

impl Selector {
    fn new(primitive: &'static str, accepts: Accepts) -> Self {
        Self {
            primitive,
            accepts,
            family: None,
            size: None,
            digest: None,
            mgf1: None,
            padding: None,
            mode: None,
            primes: None,
            hkdf_mode: None,
        }
    }

    /// Parse `name` for `primitive`, rejecting token kinds it does not take.
    pub(crate) fn parse(name: &str, primitive: &'static str, accepts: Accepts) -> CryptoResult<Self> {
        let mut selector = Self::new(primitive, accepts);
        descriptor::parse(name, ALGORITHM_RULES, &mut selector)?;
        debug!(
            algorithm = name,
            primitive,
            family = ?selector.family,
            "resolved algorithm name"
        );
        Ok(selector)
    }

    /// The family, which every name must carry.
    pub(crate) fn family(&self) -> CryptoResult<Family> {
        self.family.ok_or_else(|| {
            CryptoError::InvalidParams(format!("{} name has no algorithm family", self.primitive))
        })
    }

    /// Explicit size, or the family default.
    pub(crate) fn key_size(&self) -> CryptoResult<KeySize> {
        match self.size {
            Some(size) => Ok(size),
            None => resolve_key_size(self.family()?),
        }
    }

    /// The message digest, which the caller requires.
    pub(crate) fn digest(&self) -> CryptoResult<DigestAlg> {
        self.digest.ok_or_else(|| {
            CryptoError::InvalidParams(format!("{} name needs a digest", self.primitive))
        })
    }

    /// Reject a digest the primitive does not use.
    pub(crate) fn forbid_digest(&self) -> CryptoResult<()> {
        match self.digest {
            Some(digest) => Err(unexpected_token(self.primitive, Token::Digest(digest))),
            None => Ok(()),
        }
    }

    fn check(&self, allowed: bool, token: Token) -> CryptoResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(unexpected_token(self.primitive, token))
        }
    }
}

impl DescriptorSink for Selector {
    fn accept(&mut self, token: Token) -> CryptoResult<()> {
        match token {
            Token::Family(family) => {
                self.check(self.accepts.family, token)?;
                if self.size.is_some_and(|size| size.family() != family) {
                    self.size = None;
                }
                self.family = Some(family);
            },
            Token::KeySize(size) => {
                self.check(self.accepts.family, token)?;
                self.family = Some(size.family());
                self.size = Some(size);
            },
            Token::Digest(digest) => {
                self.check(self.accepts.digest, token)?;
                self.digest = Some(digest);
            },
            Token::Mgf1Digest(digest) => {
                self.check(self.accepts.mgf1, token)?;
                self.mgf1 = Some(digest);
            },
            Token::Padding(padding) => {
                self.check(self.accepts.padding, token)?;
                self.padding = Some(padding);
            },
            Token::Mode(mode) => {
                self.check(self.accepts.mode, token)?;
                self.mode = Some(mode);
            },
            Token::Primes(primes) => {
                self.check(self.accepts.primes, token)?;
                self.primes = Some(primes);
            },
            Token::HkdfMode(mode) => {
                self.check(self.accepts.hkdf_mode, token)?;
                self.hkdf_mode = Some(mode);
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use veil_core::EcCurve;

    use super::*;

    const DIGEST_ONLY: Accepts = Accepts {
        family: false,
        digest: true,
        mgf1: false,
        padding: false,
        mode: false,
        primes: false,
        hkdf_mode: false,
    };

    #[test]
    fn test_last_write_wins() {
        let accepts = Accepts {
            family: true,
            digest: true,
            ..Accepts::default()
        };
        let selector = Selector::parse("ECC256|SHA1|ECC384|SHA512", "Sign", accepts).unwrap();
        assert_eq!(selector.size, Some(KeySize::Ecc(EcCurve::P384)));
        assert_eq!(selector.digest, Some(DigestAlg::Sha512));
    }

    #[test]
    fn test_family_token_drops_foreign_size() {
        let accepts = Accepts {
            family: true,
            ..Accepts::default()
        };
        let selector = Selector::parse("RSA1024|ECC", "AsyKeyGenerator", accepts).unwrap();
        assert_eq!(selector.family, Some(Family::Ecc));
        assert_eq!(selector.key_size().unwrap(), KeySize::Ecc(EcCurve::P256));
    }

    #[test]
    fn test_rejects_kind_not_accepted() {
        let err = Selector::parse("SHA256|CBC", "Md", DIGEST_ONLY).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParams(_)));
        assert!(Selector::parse("AES128", "Md", DIGEST_ONLY).is_err());
    }

    #[test]
    fn test_missing_family() {
        let selector = Selector::parse("SHA256", "Md", DIGEST_ONLY).unwrap();
        assert!(selector.family().is_err());
        assert_eq!(selector.digest().unwrap(), DigestAlg::Sha256);
    }
}

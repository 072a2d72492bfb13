//! Table-driven algorithm-name parser.
//!
//! An algorithm name such as `"RSA2048|PSS|SHA256|MGF1_SHA256"` is split on
//! [`DELIMITER`] and every token is classified, in order, against a table of
//! [`ClassifierRule`]s. Each classified [`Token`] is handed to a
//! [`DescriptorSink`], which folds it into the primitive's own parameter
//! struct. The parser knows nothing about primitives; a sink that receives a
//! token it has no use for rejects it.
//!
//! Matching is exact and case-sensitive. The first token that matches no
//! rule stops parsing with [`CryptoError::InvalidParams`]. When two tokens
//! set the same field the later one wins.

use std::fmt;

use tracing::trace;

use crate::algorithm::{
    CipherMode, DhGroup, DigestAlg, EcCurve, Family, HkdfMode, KeySize, Padding, Primes,
};
use crate::error::{CryptoError, CryptoResult};

/// Separator between tokens.
pub const DELIMITER: char = '|';

/// Names of this many bytes or more are rejected before parsing.
pub const MAX_ALGORITHM_NAME_LEN: usize = 128;

/// A classified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// A family named without a size.
    Family(Family),
    /// A family fused with its size.
    KeySize(KeySize),
    /// Message digest.
    Digest(DigestAlg),
    /// Digest used by MGF1.
    Mgf1Digest(DigestAlg),
    /// Padding scheme.
    Padding(Padding),
    /// Block cipher mode.
    Mode(CipherMode),
    /// RSA prime count.
    Primes(Primes),
    /// HKDF mode.
    HkdfMode(HkdfMode),
}

impl Token {
    /// Family the token names, if any.
    #[must_use]
    pub fn family(self) -> Option<Family> {
        match self {
            Self::Family(family) => Some(family),
            Self::KeySize(size) => Some(size.family()),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Family(family) => write!(f, "{family}"),
            Self::KeySize(size) => write!(f, "{size}"),
            Self::Digest(digest) => write!(f, "{digest}"),
            Self::Mgf1Digest(digest) => write!(f, "MGF1_{digest}"),
            Self::Padding(padding) => f.write_str(padding.name()),
            Self::Mode(mode) => f.write_str(mode.name()),
            Self::Primes(primes) => write!(f, "PRIMES_{}", primes.count()),
            Self::HkdfMode(mode) => write!(f, "{mode:?}"),
        }
    }
}

/// Binds one literal tag to the token it resolves to.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierRule {
    /// Exact, case-sensitive tag.
    pub tag: &'static str,
    /// Resolved token.
    pub token: Token,
}

const fn rule(tag: &'static str, token: Token) -> ClassifierRule {
    ClassifierRule { tag, token }
}

/// The full token vocabulary shared by every primitive.
pub const ALGORITHM_RULES: &[ClassifierRule] = &[
    // RSA
    rule("RSA", Token::Family(Family::Rsa)),
    rule("RSA512", Token::KeySize(KeySize::Rsa(512))),
    rule("RSA768", Token::KeySize(KeySize::Rsa(768))),
    rule("RSA1024", Token::KeySize(KeySize::Rsa(1024))),
    rule("RSA2048", Token::KeySize(KeySize::Rsa(2048))),
    rule("RSA3072", Token::KeySize(KeySize::Rsa(3072))),
    rule("RSA4096", Token::KeySize(KeySize::Rsa(4096))),
    rule("RSA8192", Token::KeySize(KeySize::Rsa(8192))),
    rule("PRIMES_2", Token::Primes(Primes::Two)),
    rule("PRIMES_3", Token::Primes(Primes::Three)),
    rule("PRIMES_4", Token::Primes(Primes::Four)),
    rule("PRIMES_5", Token::Primes(Primes::Five)),
    // ECC and SM2
    rule("ECC", Token::Family(Family::Ecc)),
    rule("ECC224", Token::KeySize(KeySize::Ecc(EcCurve::P224))),
    rule("ECC256", Token::KeySize(KeySize::Ecc(EcCurve::P256))),
    rule("ECC384", Token::KeySize(KeySize::Ecc(EcCurve::P384))),
    rule("ECC521", Token::KeySize(KeySize::Ecc(EcCurve::P521))),
    rule("SM2", Token::Family(Family::Sm2)),
    rule("SM2_256", Token::KeySize(KeySize::Sm2)),
    // DSA
    rule("DSA", Token::Family(Family::Dsa)),
    rule("DSA1024", Token::KeySize(KeySize::Dsa(1024))),
    rule("DSA2048", Token::KeySize(KeySize::Dsa(2048))),
    rule("DSA3072", Token::KeySize(KeySize::Dsa(3072))),
    // Curve25519
    rule("Ed25519", Token::KeySize(KeySize::Ed25519)),
    rule("X25519", Token::KeySize(KeySize::X25519)),
    // DH
    rule("DH", Token::Family(Family::Dh)),
    rule("DH_modp1536", Token::KeySize(KeySize::Dh(DhGroup::Modp1536))),
    rule("DH_modp2048", Token::KeySize(KeySize::Dh(DhGroup::Modp2048))),
    rule("DH_modp3072", Token::KeySize(KeySize::Dh(DhGroup::Modp3072))),
    rule("DH_modp4096", Token::KeySize(KeySize::Dh(DhGroup::Modp4096))),
    rule("DH_modp6144", Token::KeySize(KeySize::Dh(DhGroup::Modp6144))),
    rule("DH_modp8192", Token::KeySize(KeySize::Dh(DhGroup::Modp8192))),
    rule("DH_ffdhe2048", Token::KeySize(KeySize::Dh(DhGroup::Ffdhe2048))),
    rule("DH_ffdhe3072", Token::KeySize(KeySize::Dh(DhGroup::Ffdhe3072))),
    rule("DH_ffdhe4096", Token::KeySize(KeySize::Dh(DhGroup::Ffdhe4096))),
    // Symmetric
    rule("AES", Token::Family(Family::Aes)),
    rule("AES128", Token::KeySize(KeySize::Aes(128))),
    rule("AES192", Token::KeySize(KeySize::Aes(192))),
    rule("AES256", Token::KeySize(KeySize::Aes(256))),
    rule("SM4", Token::Family(Family::Sm4)),
    rule("SM4_128", Token::KeySize(KeySize::Sm4)),
    rule("DES", Token::Family(Family::Des)),
    rule("DES64", Token::KeySize(KeySize::Des)),
    rule("3DES", Token::Family(Family::TripleDes)),
    rule("3DES192", Token::KeySize(KeySize::TripleDes)),
    rule("HMAC", Token::Family(Family::Hmac)),
    // KDF
    rule("HKDF", Token::Family(Family::Hkdf)),
    rule("PBKDF2", Token::Family(Family::Pbkdf2)),
    rule("SCRYPT", Token::Family(Family::Scrypt)),
    rule("EXTRACT_AND_EXPAND", Token::HkdfMode(HkdfMode::ExtractAndExpand)),
    rule("EXTRACT_ONLY", Token::HkdfMode(HkdfMode::ExtractOnly)),
    rule("EXPAND_ONLY", Token::HkdfMode(HkdfMode::ExpandOnly)),
    // Digests
    rule("MD5", Token::Digest(DigestAlg::Md5)),
    rule("SHA1", Token::Digest(DigestAlg::Sha1)),
    rule("SHA224", Token::Digest(DigestAlg::Sha224)),
    rule("SHA256", Token::Digest(DigestAlg::Sha256)),
    rule("SHA384", Token::Digest(DigestAlg::Sha384)),
    rule("SHA512", Token::Digest(DigestAlg::Sha512)),
    rule("SM3", Token::Digest(DigestAlg::Sm3)),
    rule("MGF1_MD5", Token::Mgf1Digest(DigestAlg::Md5)),
    rule("MGF1_SHA1", Token::Mgf1Digest(DigestAlg::Sha1)),
    rule("MGF1_SHA224", Token::Mgf1Digest(DigestAlg::Sha224)),
    rule("MGF1_SHA256", Token::Mgf1Digest(DigestAlg::Sha256)),
    rule("MGF1_SHA384", Token::Mgf1Digest(DigestAlg::Sha384)),
    rule("MGF1_SHA512", Token::Mgf1Digest(DigestAlg::Sha512)),
    // Paddings
    rule("NoPadding", Token::Padding(Padding::NoPadding)),
    rule("PKCS5", Token::Padding(Padding::Pkcs5)),
    rule("PKCS7", Token::Padding(Padding::Pkcs7)),
    rule("PKCS1", Token::Padding(Padding::Pkcs1)),
    rule("PKCS1_OAEP", Token::Padding(Padding::Pkcs1Oaep)),
    rule("PSS", Token::Padding(Padding::Pss)),
    // Modes
    rule("ECB", Token::Mode(CipherMode::Ecb)),
    rule("CBC", Token::Mode(CipherMode::Cbc)),
    rule("CTR", Token::Mode(CipherMode::Ctr)),
    rule("OFB", Token::Mode(CipherMode::Ofb)),
    rule("CFB", Token::Mode(CipherMode::Cfb)),
    rule("CFB1", Token::Mode(CipherMode::Cfb1)),
    rule("CFB8", Token::Mode(CipherMode::Cfb8)),
    rule("CFB64", Token::Mode(CipherMode::Cfb64)),
    rule("CFB128", Token::Mode(CipherMode::Cfb128)),
    rule("GCM", Token::Mode(CipherMode::Gcm)),
    rule("CCM", Token::Mode(CipherMode::Ccm)),
];

/// Receives classified tokens, left to right.
pub trait DescriptorSink {
    /// Fold one token into the sink.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the token is meaningless for
    /// this sink.
    fn accept(&mut self, token: Token) -> CryptoResult<()>;
}

/// Classify a single token against `rules`, first match wins.
#[must_use]
pub fn classify(token: &str, rules: &[ClassifierRule]) -> Option<Token> {
    rules.iter().find(|r| r.tag == token).map(|r| r.token)
}

/// Check the name bound without allocating.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParams`] if `text` is empty or at least
/// [`MAX_ALGORITHM_NAME_LEN`] bytes long.
pub fn check_name(text: &str) -> CryptoResult<()> {
    if text.is_empty() {
        return Err(CryptoError::InvalidParams("algorithm name is empty".into()));
    }
    if text.len() >= MAX_ALGORITHM_NAME_LEN {
        return Err(CryptoError::InvalidParams(format!(
            "algorithm name is {} bytes, limit is {}",
            text.len(),
            MAX_ALGORITHM_NAME_LEN.saturating_sub(1)
        )));
    }
    Ok(())
}

/// Split `text`, classify each token against `rules`, and feed the results
/// to `sink`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParams`] for an empty or over-length name,
/// an empty token, an unrecognized token, or any error the sink raises.
pub fn parse<S>(text: &str, rules: &[ClassifierRule], sink: &mut S) -> CryptoResult<()>
where
    S: DescriptorSink + ?Sized,
{
    check_name(text)?;

    for raw in text.split(DELIMITER) {
        if raw.is_empty() {
            return Err(CryptoError::InvalidParams(format!(
                "empty token in algorithm name {text:?}"
            )));
        }
        let token = classify(raw, rules).ok_or_else(|| {
            CryptoError::InvalidParams(format!("unrecognized token {raw:?} in {text:?}"))
        })?;
        trace!(raw, ?token, "classified token");
        sink.accept(token)?;
    }

    Ok(())
}

/// The ordered, classified tokens of one algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlgorithmDescriptor {
    tokens: Vec<Token>,
}

impl AlgorithmDescriptor {
    /// Parse `text` against [`ALGORITHM_RULES`].
    ///
    /// # Errors
    ///
    /// See [`parse`].
    pub fn parse(text: &str) -> CryptoResult<Self> {
        let mut descriptor = Self::default();
        parse(text, ALGORITHM_RULES, &mut descriptor)?;
        Ok(descriptor)
    }

    /// Classified tokens, in input order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Replay the tokens into another sink.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by `sink`.
    pub fn fold_into<S: DescriptorSink + ?Sized>(&self, sink: &mut S) -> CryptoResult<()> {
        self.tokens.iter().try_for_each(|token| sink.accept(*token))
    }
}

impl DescriptorSink for AlgorithmDescriptor {
    fn accept(&mut self, token: Token) -> CryptoResult<()> {
        self.tokens.try_reserve(1)?;
        self.tokens.push(token);
        Ok(())
    }
}

/// Error for a token a primitive has no use for.
#[must_use]
pub fn unexpected_token(primitive: &str, token: Token) -> CryptoError {
    CryptoError::InvalidParams(format!("{primitive} does not accept token {token}"))
}

/// Resolve the key size implied by a family or fused token.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParams`] if the family has no default size.
pub fn resolve_key_size(family: Family) -> CryptoResult<KeySize> {
    family.default_key_size().ok_or_else(|| {
        CryptoError::InvalidParams(format!("{family} needs an explicit key size"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[derive(Default)]
    struct DigestOnly {
        digest: Option<DigestAlg>,
    }

    impl DescriptorSink for DigestOnly {
        fn accept(&mut self, token: Token) -> CryptoResult<()> {
            match token {
                Token::Digest(d) => {
                    self.digest = Some(d);
                    Ok(())
                },
                other => Err(unexpected_token("digest", other)),
            }
        }
    }

    #[test]
    fn test_parse_orders_tokens() {
        let d = AlgorithmDescriptor::parse("RSA2048|PSS|SHA256|MGF1_SHA256").unwrap();
        assert_eq!(
            d.tokens(),
            &[
                Token::KeySize(KeySize::Rsa(2048)),
                Token::Padding(Padding::Pss),
                Token::Digest(DigestAlg::Sha256),
                Token::Mgf1Digest(DigestAlg::Sha256),
            ]
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            AlgorithmDescriptor::parse(""),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_length_bound() {
        let at_limit = "A".repeat(MAX_ALGORITHM_NAME_LEN);
        assert!(matches!(
            check_name(&at_limit),
            Err(CryptoError::InvalidParams(_))
        ));
        let below = "A".repeat(MAX_ALGORITHM_NAME_LEN.saturating_sub(1));
        assert!(check_name(&below).is_ok());
    }

    #[test]
    fn test_case_sensitive() {
        assert!(matches!(
            AlgorithmDescriptor::parse("rsa2048"),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(AlgorithmDescriptor::parse("SHA256|").is_err());
        assert!(AlgorithmDescriptor::parse("|SHA256").is_err());
        assert!(AlgorithmDescriptor::parse("HMAC||SHA256").is_err());
    }

    #[test]
    fn test_stops_at_first_unknown_token() {
        struct Counter(usize);
        impl DescriptorSink for Counter {
            fn accept(&mut self, _: Token) -> CryptoResult<()> {
                self.0 = self.0.saturating_add(1);
                Ok(())
            }
        }
        let mut counter = Counter(0);
        let result = parse("HMAC|BOGUS|SHA256", ALGORITHM_RULES, &mut counter);
        assert!(matches!(result, Err(CryptoError::InvalidParams(_))));
        assert_eq!(counter.0, 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut sink = DigestOnly::default();
        parse("SHA1|SHA512", ALGORITHM_RULES, &mut sink).unwrap();
        assert_eq!(sink.digest, Some(DigestAlg::Sha512));
    }

    #[test]
    fn test_sink_rejects_foreign_token() {
        let mut sink = DigestOnly::default();
        let err = parse("SHA256|CBC", ALGORITHM_RULES, &mut sink).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParams(_)));
    }

    #[test]
    fn test_custom_rule_table() {
        const RULES: &[ClassifierRule] = &[rule("H", Token::Digest(DigestAlg::Sha256))];
        let mut sink = DigestOnly::default();
        parse("H", RULES, &mut sink).unwrap();
        assert_eq!(sink.digest, Some(DigestAlg::Sha256));
        assert!(parse("SHA256", RULES, &mut sink).is_err());
    }

    #[test]
    fn test_rule_tags_are_distinct() {
        let mut seen = HashSet::new();
        for rule in ALGORITHM_RULES {
            assert!(seen.insert(rule.tag), "duplicate tag {}", rule.tag);
            assert!(!rule.tag.contains(DELIMITER));
        }
    }

    #[test]
    fn test_resolve_key_size() {
        assert_eq!(resolve_key_size(Family::Rsa).unwrap(), KeySize::Rsa(2048));
        assert!(resolve_key_size(Family::Aes).is_err());
    }

    fn known_tag() -> impl Strategy<Value = &'static str> {
        prop::sample::select(ALGORITHM_RULES.iter().map(|r| r.tag).collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn test_parse_is_deterministic(tags in prop::collection::vec(known_tag(), 1..6)) {
            let name = tags.join("|");
            let first = AlgorithmDescriptor::parse(&name).unwrap();
            let second = AlgorithmDescriptor::parse(&name).unwrap();
            prop_assert_eq!(first.tokens().len(), tags.len());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn test_unknown_lowercase_tokens_rejected(word in "[a-z]{1,12}") {
            prop_assert!(AlgorithmDescriptor::parse(&word).is_err());
        }
    }
}

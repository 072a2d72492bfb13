//! End-to-end tests of the name-driven facades.
//!
//! Known-answer vectors come from the RFCs and NIST publications named on
//! each test; the rest check lifecycle and error-category behaviour through
//! the public API only.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use veil_core::{AsyKeySpecItem, CryptoObject, Handle};
use veil_crypto::prelude::*;
use veil_crypto::spi::{
    AsyKeyGeneratorSpi, ConvertedKeys, KeyPairSpi, MacSpi, MdSpi, PriKeySpi, PubKeySpi, SignSpi,
};

fn unhex(text: &str) -> Vec<u8> {
    hex::decode(text).expect("valid hex")
}

fn sym_key(name: &str, bytes: &[u8]) -> SymKey {
    SymKeyGenerator::create(name)
        .expect("generator")
        .convert_sym_key(bytes)
        .expect("key")
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

#[test]
fn test_malformed_names_are_invalid_params() {
    for name in ["rsa2048", "", "RSA2048||SHA256", "NOPE"] {
        let result = AsyKeyGenerator::create(name);
        assert!(
            matches!(result, Err(CryptoError::InvalidParams(_))),
            "{name:?}"
        );
        assert_eq!(ErrorCode::of(&result).as_i32(), -10001, "{name:?}");
    }
}

#[test]
fn test_error_codes_are_stable() {
    assert_eq!(ErrorCode::of(&Md::create("SHA256")).as_i32(), 0);
    assert_eq!(ErrorCode::of(&Cipher::create("SM4_128|ECB|PKCS7")).as_i32(), -10002);
}

// ---------------------------------------------------------------------------
// MAC
// ---------------------------------------------------------------------------

#[test]
fn test_hmac_rfc4231_case_1() {
    let key = sym_key("HMAC", &[0x0b; 20]);
    for (name, expected) in [
        (
            "HMAC|SHA256",
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7",
        ),
        (
            "HMAC|SHA512",
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854",
        ),
    ] {
        let mut mac = Mac::create(name).expect("mac");
        mac.init(&key).expect("init");
        mac.update(b"Hi There").expect("update");
        assert_eq!(mac.do_final().expect("final").to_hex(), expected, "{name}");
    }
}

// ---------------------------------------------------------------------------
// Symmetric ciphers
// ---------------------------------------------------------------------------

#[test]
fn test_aes_cbc_nist_sp800_38a() {
    let key = sym_key("AES128", &unhex("2b7e151628aed2a6abf7158809cf4f3c"));
    let iv = ParamsSpec::Iv(IvParamsSpec {
        iv: unhex("000102030405060708090a0b0c0d0e0f"),
    });
    let plaintext = unhex("6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51");

    let mut cipher = Cipher::create("AES128|CBC|NoPadding").expect("cipher");
    cipher
        .init(CryptoMode::Encrypt, (&key).into(), Some(&iv))
        .expect("init");
    let mut ciphertext = cipher.update(&plaintext[..16]).expect("update").into_vec();
    ciphertext.extend_from_slice(&cipher.do_final(&plaintext[16..]).expect("final"));
    assert_eq!(
        hex::encode(&ciphertext),
        "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2"
    );

    cipher
        .init(CryptoMode::Decrypt, (&key).into(), Some(&iv))
        .expect("init");
    assert_eq!(cipher.do_final(&ciphertext).expect("final").as_slice(), plaintext);
}

#[test]
fn test_unaligned_input_without_padding_fails() {
    let key = sym_key("AES128", &[7; 16]);
    let mut cipher = Cipher::create("AES128|ECB|NoPadding").expect("cipher");
    cipher
        .init(CryptoMode::Encrypt, (&key).into(), None)
        .expect("init");
    assert!(matches!(
        cipher.do_final(b"fifteen bytes!!"),
        Err(CryptoError::OperationFailed(_))
    ));
}

fn gcm_params(auth_tag: Vec<u8>) -> ParamsSpec {
    ParamsSpec::Gcm(GcmParamsSpec {
        iv: vec![3; 12],
        aad: b"header".to_vec(),
        auth_tag,
    })
}

#[test]
fn test_aes_gcm_detects_tampering() {
    let key = SymKeyGenerator::create("AES256")
        .expect("generator")
        .generate_sym_key()
        .expect("key");
    let mut cipher = Cipher::create("AES256|GCM|NoPadding").expect("cipher");
    cipher
        .init(CryptoMode::Encrypt, (&key).into(), Some(&gcm_params(Vec::new())))
        .expect("init");
    cipher.update(b"secret ").expect("update");
    let sealed = cipher.do_final(b"message").expect("final");
    let (ciphertext, tag) = sealed.split_at(sealed.len().saturating_sub(16));
    assert_eq!(tag.len(), 16);

    cipher
        .init(CryptoMode::Decrypt, (&key).into(), Some(&gcm_params(tag.to_vec())))
        .expect("init");
    assert_eq!(
        cipher.do_final(ciphertext).expect("open").as_slice(),
        b"secret message"
    );

    let mut forged = ciphertext.to_vec();
    forged[0] ^= 1;
    cipher
        .init(CryptoMode::Decrypt, (&key).into(), Some(&gcm_params(tag.to_vec())))
        .expect("init");
    assert!(matches!(
        cipher.do_final(&forged),
        Err(CryptoError::OperationFailed(_))
    ));
}

#[test]
fn test_triple_des_cbc_round_trip() {
    let key = SymKeyGenerator::create("3DES192")
        .expect("generator")
        .generate_sym_key()
        .expect("key");
    let iv = ParamsSpec::Iv(IvParamsSpec { iv: vec![0; 8] });
    let mut cipher = Cipher::create("3DES192|CBC|PKCS5").expect("cipher");
    cipher
        .init(CryptoMode::Encrypt, (&key).into(), Some(&iv))
        .expect("init");
    let ciphertext = cipher.do_final(b"legacy payload").expect("final");
    assert_eq!(ciphertext.len(), 16);

    cipher
        .init(CryptoMode::Decrypt, (&key).into(), Some(&iv))
        .expect("init");
    assert_eq!(
        cipher.do_final(&ciphertext).expect("final").as_slice(),
        b"legacy payload"
    );
}

// ---------------------------------------------------------------------------
// RSA
// ---------------------------------------------------------------------------

#[test]
fn test_rsa2048_key_shape() {
    let pair = AsyKeyGenerator::create("RSA2048|PRIMES_2")
        .expect("generator")
        .generate_key_pair()
        .expect("pair");
    let public = pair.public_key().expect("public");
    let n = public
        .get_asy_key_spec_big_integer(AsyKeySpecItem::RsaN)
        .expect("n");
    assert_eq!(n.len(), 256);
    assert_ne!(n.as_bytes()[0] & 0x80, 0);
    let e = public
        .get_asy_key_spec_big_integer(AsyKeySpecItem::RsaPk)
        .expect("e");
    assert_eq!(e.to_u64(), Some(65537));
    assert_eq!(public.algorithm(), "RSA");
}

#[test]
fn test_rsa_oaep_round_trip_and_der_reload() {
    let mut generator = AsyKeyGenerator::create("RSA1024").expect("generator");
    let pair = generator.generate_key_pair().expect("pair");
    let private_der = pair
        .private_key()
        .expect("private")
        .get_encoded()
        .expect("pkcs8");
    let reloaded = generator
        .convert_key(None, Some(private_der.as_slice()))
        .expect("convert");

    let name = "RSA1024|PKCS1_OAEP|SHA256|MGF1_SHA256";
    let mut cipher = Cipher::create(name).expect("cipher");
    cipher
        .init(CryptoMode::Encrypt, pair.public_key().expect("public").into(), None)
        .expect("init");
    cipher.update(b"wrapped ").expect("update");
    let ciphertext = cipher.do_final(b"key").expect("final");
    assert_eq!(ciphertext.len(), 128);

    cipher
        .init(
            CryptoMode::Decrypt,
            reloaded.private_key().expect("private").into(),
            None,
        )
        .expect("init");
    assert_eq!(
        cipher.do_final(&ciphertext).expect("final").as_slice(),
        b"wrapped key"
    );
}

#[test]
fn test_rsa_pkcs1_signature_rejects_other_message() {
    let pair = AsyKeyGenerator::create("RSA1024")
        .expect("generator")
        .generate_key_pair()
        .expect("pair");
    let mut signer = Sign::create("RSA1024|PKCS1|SHA256").expect("sign");
    signer.init(pair.private_key().expect("private")).expect("init");
    let signature = signer.sign(b"pay 10").expect("sign");
    assert_eq!(signature.len(), 128);

    let mut verifier = Verify::create("RSA1024|PKCS1|SHA256").expect("verify");
    verifier.init(pair.public_key().expect("public")).expect("init");
    assert!(!verifier.verify(b"pay 1000", &signature).expect("verify"));
}

// ---------------------------------------------------------------------------
// Key agreement
// ---------------------------------------------------------------------------

#[test]
fn test_x25519_low_order_peer_rejected() {
    let mut generator = AsyKeyGenerator::create("X25519").expect("generator");
    let pair = generator.generate_key_pair().expect("pair");
    let mut low_order = vec![
        0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
    ];
    low_order.extend_from_slice(&[0; 32]);
    let peer = generator
        .convert_key(Some(low_order.as_slice()), None)
        .expect("convert");

    let mut agreement = KeyAgreement::create("X25519").expect("agreement");
    assert!(matches!(
        agreement.generate_secret(
            pair.private_key().expect("private"),
            peer.public_key().expect("public")
        ),
        Err(CryptoError::OperationFailed(_))
    ));
}

// ---------------------------------------------------------------------------
// KDF
// ---------------------------------------------------------------------------

#[test]
fn test_scrypt_memory_limit_is_enforced() {
    let mut kdf = Kdf::create("SCRYPT").expect("kdf");
    let params = |max_mem| {
        KdfParamsSpec::Scrypt(ScryptParams {
            passphrase: b"pleaseletmein".to_vec(),
            salt: b"SodiumChloride".to_vec(),
            n: 16,
            r: 1,
            p: 1,
            max_mem,
            output_len: 64,
        })
    };
    assert!(matches!(
        kdf.generate_secret(&params(2047)),
        Err(CryptoError::InvalidParams(_))
    ));
    assert_eq!(kdf.generate_secret(&params(2048)).expect("derive").len(), 64);
}

// ---------------------------------------------------------------------------
// Object lifecycle
// ---------------------------------------------------------------------------

struct CountingDigest {
    absorbed: usize,
    drops: Arc<AtomicUsize>,
}

impl Drop for CountingDigest {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl MdSpi for CountingDigest {
    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.absorbed = self.absorbed.saturating_add(data.len());
        Ok(())
    }

    fn finalize(&mut self) -> CryptoResult<Blob> {
        let len = u8::try_from(self.absorbed).unwrap_or(u8::MAX);
        self.absorbed = 0;
        Ok(Blob::from(vec![len]))
    }

    fn reset(&mut self) {
        self.absorbed = 0;
    }

    fn output_len(&self) -> usize {
        1
    }
}

#[test]
fn test_plugged_backend_is_driven_and_dropped_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mut md = Md::from_spi(
        Box::new(CountingDigest {
            absorbed: 0,
            drops: Arc::clone(&drops),
        }),
        "COUNT",
    );
    md.update(b"four").expect("update");
    md.update(b"++").expect("update");
    assert_eq!(md.do_final().expect("final").as_slice(), &[6]);
    assert_eq!(md.algo_name(), "COUNT");

    let handle = Handle::new(md);
    assert_eq!(handle.class(), "Md");
    assert!(matches!(
        handle.downcast_ref::<Mac>(),
        Err(CryptoError::InvalidParams(_))
    ));
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    handle.destroy();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

/// Live-object ledger shared by the counted backends below.
#[derive(Default)]
struct Tally {
    allocated: AtomicUsize,
    dropped: AtomicUsize,
}

impl Tally {
    fn balanced(&self) -> bool {
        self.allocated.load(Ordering::SeqCst) == self.dropped.load(Ordering::SeqCst)
    }
}

struct Counted(Arc<Tally>);

impl Counted {
    fn new(tally: &Arc<Tally>) -> Self {
        tally.allocated.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(tally))
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.0.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountedPub(#[allow(dead_code)] Counted);

impl PubKeySpi for CountedPub {
    fn algorithm(&self) -> &'static str {
        "COUNTED"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        Ok(Blob::from(vec![1]))
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        Err(veil_crypto::spi::not_an_item(item))
    }
}

struct CountedPri(#[allow(dead_code)] Counted);

impl PriKeySpi for CountedPri {
    fn algorithm(&self) -> &'static str {
        "COUNTED"
    }

    fn encoded(&self) -> CryptoResult<Blob> {
        Ok(Blob::from(vec![2]))
    }

    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger> {
        Err(veil_crypto::spi::not_an_item(item))
    }
}

/// Builds a pair in steps and fails after `fail_after` of them.
struct StagedGenerator {
    fail_after: usize,
    tally: Arc<Tally>,
    _own: Counted,
}

impl StagedGenerator {
    fn step(&self, done: usize) -> CryptoResult<()> {
        if done == self.fail_after {
            return Err(CryptoError::OperationFailed(format!("failed after step {done}")));
        }
        Ok(())
    }
}

impl AsyKeyGeneratorSpi for StagedGenerator {
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi> {
        self.step(0)?;
        let public = CountedPub(Counted::new(&self.tally));
        self.step(1)?;
        let private = CountedPri(Counted::new(&self.tally));
        self.step(2)?;
        Ok(KeyPairSpi {
            public: Box::new(public),
            private: Box::new(private),
        })
    }

    fn convert_key(
        &self,
        _public: Option<&[u8]>,
        _private: Option<&[u8]>,
    ) -> CryptoResult<ConvertedKeys> {
        Err(CryptoError::NotSupported("counted keys do not decode".into()))
    }
}

#[test]
fn test_failed_generation_releases_every_step() {
    for fail_after in [0, 1, 2, usize::MAX] {
        let tally = Arc::new(Tally::default());
        let mut generator = AsyKeyGenerator::from_spi(
            Box::new(StagedGenerator {
                fail_after,
                tally: Arc::clone(&tally),
                _own: Counted::new(&tally),
            }),
            "COUNTED",
        );
        let result = generator.generate_key_pair();
        assert_eq!(result.is_ok(), fail_after == usize::MAX, "step {fail_after}");
        if fail_after != usize::MAX {
            assert!(matches!(result, Err(CryptoError::OperationFailed(_))));
        }
        drop(result);
        assert!(!tally.balanced(), "generator still alive at step {fail_after}");

        drop(generator);
        assert!(tally.balanced(), "leak after failing at step {fail_after}");
    }
}

struct RefusingMac(#[allow(dead_code)] Counted);

impl MacSpi for RefusingMac {
    fn init(&mut self, _key: &[u8]) -> CryptoResult<()> {
        Err(CryptoError::InvalidParams("key refused".into()))
    }

    fn update(&mut self, _data: &[u8]) -> CryptoResult<()> {
        Ok(())
    }

    fn finalize(&mut self) -> CryptoResult<Blob> {
        Ok(Blob::from(Vec::new()))
    }

    fn output_len(&self) -> usize {
        0
    }
}

struct RefusingSigner(#[allow(dead_code)] Counted);

impl SignSpi for RefusingSigner {
    fn init(&mut self, _key: &dyn PriKeySpi) -> CryptoResult<()> {
        Err(CryptoError::InvalidParams("key refused".into()))
    }

    fn update(&mut self, _data: &[u8]) -> CryptoResult<()> {
        Ok(())
    }

    fn sign(&mut self, _data: &[u8]) -> CryptoResult<Blob> {
        Ok(Blob::from(Vec::new()))
    }
}

#[test]
fn test_failed_init_leaves_object_unusable_and_released() {
    let tally = Arc::new(Tally::default());

    let mut mac = Mac::from_spi(Box::new(RefusingMac(Counted::new(&tally))), "COUNTED");
    assert!(mac.init(&sym_key("HMAC", b"key")).is_err());
    assert!(matches!(mac.update(b"data"), Err(CryptoError::InvalidParams(_))));
    assert!(matches!(mac.do_final(), Err(CryptoError::InvalidParams(_))));

    let pair = AsyKeyGenerator::create("Ed25519")
        .expect("generator")
        .generate_key_pair()
        .expect("pair");
    let mut signer = Sign::from_spi(Box::new(RefusingSigner(Counted::new(&tally))), "COUNTED");
    assert!(signer.init(pair.private_key().expect("private")).is_err());
    assert!(matches!(signer.sign(b"data"), Err(CryptoError::InvalidParams(_))));

    assert_eq!(tally.allocated.load(Ordering::SeqCst), 2);
    drop(mac);
    drop(signer);
    assert!(tally.balanced());
}

#[test]
fn test_class_tags_are_distinct() {
    let key = sym_key("AES128", &[0; 16]);
    let pair = AsyKeyGenerator::create("Ed25519")
        .expect("generator")
        .generate_key_pair()
        .expect("pair");
    let tags = [
        Md::create("SHA1").expect("md").class(),
        Mac::create("HMAC|SHA1").expect("mac").class(),
        Rand::create().expect("rand").class(),
        SymKeyGenerator::create("AES128").expect("gen").class(),
        key.class(),
        Cipher::create("AES128|ECB|PKCS7").expect("cipher").class(),
        AsyKeyGenerator::create("X25519").expect("gen").class(),
        pair.public_key().expect("public").class(),
        pair.private_key().expect("private").class(),
        pair.class(),
        Sign::create("Ed25519").expect("sign").class(),
        Verify::create("Ed25519").expect("verify").class(),
        KeyAgreement::create("X25519").expect("agreement").class(),
        Kdf::create("SCRYPT").expect("kdf").class(),
    ];
    let unique: std::collections::HashSet<_> = tags.iter().collect();
    assert_eq!(unique.len(), tags.len());
}

proptest! {
    #[test]
    fn test_digest_is_independent_of_chunking(data in proptest::collection::vec(any::<u8>(), 0..512), split in 0usize..512) {
        let split = split.min(data.len());
        let mut md = Md::create("SHA256").expect("md");
        md.update(&data[..split]).expect("update");
        md.update(&data[split..]).expect("update");
        let streamed = md.do_final().expect("final");
        prop_assert_eq!(streamed, veil_crypto::md::digest(veil_core::DigestAlg::Sha256, &data));
    }
}

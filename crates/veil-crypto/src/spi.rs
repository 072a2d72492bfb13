//! Backend service-provider interfaces.
//!
//! A facade never looks inside its backend; it only calls through one of
//! these traits. Registries pick the built-in RustCrypto implementations, and
//! every facade also has a `from_spi` constructor so another backend can be
//! plugged in.
//!
//! Asymmetric key SPIs extend [`Any`] so a backend can recover its own
//! concrete key type from a `&dyn PriKeySpi` it was handed. A key from a
//! different backend fails that downcast and is rejected as
//! [`CryptoError::InvalidParams`](veil_core::CryptoError::InvalidParams).

use std::any::Any;

use veil_core::{AsyKeySpecItem, BigInteger, Blob, CryptoError, CryptoResult};

use crate::cipher::{CryptoMode, ParamsSpec};
use crate::kdf::KdfParamsSpec;
use crate::signature::SignSpecItem;

/// Message digest backend.
pub trait MdSpi: Send {
    /// Absorb data.
    fn update(&mut self, data: &[u8]) -> CryptoResult<()>;
    /// Produce the digest and reset to the empty state.
    fn finalize(&mut self) -> CryptoResult<Blob>;
    /// Discard absorbed data.
    fn reset(&mut self);
    /// Digest length in bytes.
    fn output_len(&self) -> usize;
}

/// MAC backend.
pub trait MacSpi: Send {
    /// Key the MAC, discarding any previous state.
    fn init(&mut self, key: &[u8]) -> CryptoResult<()>;
    /// Absorb data.
    fn update(&mut self, data: &[u8]) -> CryptoResult<()>;
    /// Produce the tag. The MAC must be re-keyed before reuse.
    fn finalize(&mut self) -> CryptoResult<Blob>;
    /// Tag length in bytes.
    fn output_len(&self) -> usize;
}

/// Random generator backend.
pub trait RandSpi: Send {
    /// Fill a fresh buffer of `len` bytes.
    fn generate(&mut self, len: usize) -> CryptoResult<Blob>;
    /// Mix caller-supplied seed material into the generator.
    fn set_seed(&mut self, seed: &[u8]) -> CryptoResult<()>;
    /// Generator name.
    fn algo_name(&self) -> &'static str;
}

/// Symmetric key generator backend.
pub trait SymKeyGeneratorSpi: Send {
    /// Generate fresh key bytes.
    fn generate(&mut self) -> CryptoResult<Blob>;
    /// Check and copy caller-supplied key bytes.
    fn convert(&self, key: &[u8]) -> CryptoResult<Blob>;
}

/// Public half of an asymmetric key.
pub trait PubKeySpi: Any + Send {
    /// Family name, e.g. `"RSA"`.
    fn algorithm(&self) -> &'static str;
    /// SubjectPublicKeyInfo DER.
    fn encoded(&self) -> CryptoResult<Blob>;
    /// Read a big-integer component.
    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger>;
    /// Read an integer component.
    fn int_item(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        Err(not_an_item(item))
    }
    /// Read a string component.
    fn string_item(&self, item: AsyKeySpecItem) -> CryptoResult<String> {
        Err(not_an_item(item))
    }
}

/// Private half of an asymmetric key.
pub trait PriKeySpi: Any + Send {
    /// Family name, e.g. `"RSA"`.
    fn algorithm(&self) -> &'static str;
    /// PKCS#8 DER.
    fn encoded(&self) -> CryptoResult<Blob>;
    /// Read a big-integer component.
    fn big_integer(&self, item: AsyKeySpecItem) -> CryptoResult<BigInteger>;
    /// Read an integer component.
    fn int_item(&self, item: AsyKeySpecItem) -> CryptoResult<i64> {
        Err(not_an_item(item))
    }
    /// Read a string component.
    fn string_item(&self, item: AsyKeySpecItem) -> CryptoResult<String> {
        Err(not_an_item(item))
    }
}

/// Error for a spec item the key does not carry.
#[must_use]
pub fn not_an_item(item: AsyKeySpecItem) -> CryptoError {
    CryptoError::InvalidParams(format!("{item:?} is not a component of this key"))
}

/// Both halves produced by a generator.
pub struct KeyPairSpi {
    /// Public half.
    pub public: Box<dyn PubKeySpi>,
    /// Private half.
    pub private: Box<dyn PriKeySpi>,
}

/// Halves recovered from encoded keys.
pub struct ConvertedKeys {
    /// Public half, if one was supplied.
    pub public: Option<Box<dyn PubKeySpi>>,
    /// Private half, if one was supplied.
    pub private: Option<Box<dyn PriKeySpi>>,
}

/// Asymmetric key generator driven by an algorithm name.
pub trait AsyKeyGeneratorSpi: Send {
    /// Generate a fresh key pair.
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi>;
    /// Decode SubjectPublicKeyInfo and/or PKCS#8 DER.
    fn convert_key(&self, public: Option<&[u8]>, private: Option<&[u8]>)
    -> CryptoResult<ConvertedKeys>;
}

/// Asymmetric key generator driven by a key parameter spec.
pub trait AsyKeySpecGeneratorSpi: Send {
    /// Build or generate both halves.
    fn generate_key_pair(&mut self) -> CryptoResult<KeyPairSpi>;
    /// Build or generate the public half.
    fn generate_pub_key(&mut self) -> CryptoResult<Box<dyn PubKeySpi>>;
    /// Build or generate the private half.
    fn generate_pri_key(&mut self) -> CryptoResult<Box<dyn PriKeySpi>>;
}

/// Key material handed to a cipher.
#[derive(Clone, Copy)]
pub enum CipherKeyRef<'a> {
    /// Raw symmetric key.
    Symmetric(&'a [u8]),
    /// Public key.
    Public(&'a dyn PubKeySpi),
    /// Private key.
    Private(&'a dyn PriKeySpi),
}

/// Cipher backend.
pub trait CipherSpi: Send {
    /// Key the cipher for one direction.
    fn init(
        &mut self,
        mode: CryptoMode,
        key: CipherKeyRef<'_>,
        params: Option<&ParamsSpec>,
    ) -> CryptoResult<()>;
    /// Process a chunk, returning whatever output is ready.
    fn update(&mut self, input: &[u8]) -> CryptoResult<Blob>;
    /// Process the last chunk and flush.
    fn do_final(&mut self, input: &[u8]) -> CryptoResult<Blob>;
}

/// Signing backend.
pub trait SignSpi: Send {
    /// Bind the private key.
    fn init(&mut self, key: &dyn PriKeySpi) -> CryptoResult<()>;
    /// Absorb data.
    fn update(&mut self, data: &[u8]) -> CryptoResult<()>;
    /// Absorb `data` and sign everything absorbed since `init`.
    fn sign(&mut self, data: &[u8]) -> CryptoResult<Blob>;
    /// Set an integer parameter.
    fn set_spec_int(&mut self, item: SignSpecItem, value: i32) -> CryptoResult<()> {
        let _ = value;
        Err(unsupported_spec(item))
    }
    /// Read an integer parameter.
    fn spec_int(&self, item: SignSpecItem) -> CryptoResult<i32> {
        Err(unsupported_spec(item))
    }
    /// Read a string parameter.
    fn spec_string(&self, item: SignSpecItem) -> CryptoResult<String> {
        Err(unsupported_spec(item))
    }
}

/// Verification backend.
pub trait VerifySpi: Send {
    /// Bind the public key.
    fn init(&mut self, key: &dyn PubKeySpi) -> CryptoResult<()>;
    /// Absorb data.
    fn update(&mut self, data: &[u8]) -> CryptoResult<()>;
    /// Absorb `data` and check `signature` over everything absorbed.
    fn verify(&mut self, data: &[u8], signature: &[u8]) -> CryptoResult<bool>;
    /// Set an integer parameter.
    fn set_spec_int(&mut self, item: SignSpecItem, value: i32) -> CryptoResult<()> {
        let _ = value;
        Err(unsupported_spec(item))
    }
    /// Read an integer parameter.
    fn spec_int(&self, item: SignSpecItem) -> CryptoResult<i32> {
        Err(unsupported_spec(item))
    }
    /// Read a string parameter.
    fn spec_string(&self, item: SignSpecItem) -> CryptoResult<String> {
        Err(unsupported_spec(item))
    }
}

fn unsupported_spec(item: SignSpecItem) -> CryptoError {
    CryptoError::InvalidParams(format!("{item:?} does not apply to this signature scheme"))
}

/// Key agreement backend.
pub trait KeyAgreementSpi: Send {
    /// Derive the shared secret of `private` and the peer's `public`.
    fn generate_secret(
        &mut self,
        private: &dyn PriKeySpi,
        public: &dyn PubKeySpi,
    ) -> CryptoResult<Blob>;
}

/// Key derivation backend.
pub trait KdfSpi: Send {
    /// Derive key material.
    fn derive(&mut self, params: &KdfParamsSpec) -> CryptoResult<Blob>;
}

/// Recover a backend's concrete key type from a public key SPI.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParams`] if the key is of another type.
pub fn downcast_pub<T: PubKeySpi>(key: &dyn PubKeySpi) -> CryptoResult<&T> {
    let any: &dyn Any = key;
    any.downcast_ref::<T>().ok_or_else(|| {
        CryptoError::InvalidParams(format!("{} public key is not usable here", key.algorithm()))
    })
}

/// Recover a backend's concrete key type from a private key SPI.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParams`] if the key is of another type.
pub fn downcast_pri<T: PriKeySpi>(key: &dyn PriKeySpi) -> CryptoResult<&T> {
    let any: &dyn Any = key;
    any.downcast_ref::<T>().ok_or_else(|| {
        CryptoError::InvalidParams(format!("{} private key is not usable here", key.algorithm()))
    })
}

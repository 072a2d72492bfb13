//! Prelude module - commonly used types for convenient import.
//!
//! Use `use veil_crypto::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use veil_crypto::prelude::*;
//!
//! let mut md = Md::create("SM3").unwrap();
//! md.update(b"abc").unwrap();
//! assert_eq!(md.do_final().unwrap().len(), 32);
//! ```

// Errors and buffers
pub use crate::{Blob, CryptoError, CryptoResult, ErrorCode};

// Digests, MACs and randomness
pub use crate::mac::Mac;
pub use crate::md::Md;
pub use crate::random::Rand;

// Keys
pub use crate::asy_key::{AsyKeyGenerator, AsyKeyGeneratorBySpec, KeyPair, PriKey, PubKey};
pub use crate::dh_key_util::DhKeyUtil;
pub use crate::sym_key::{SymKey, SymKeyGenerator};

// Ciphers
pub use crate::cipher::{Cipher, CipherKey, CryptoMode, GcmParamsSpec, IvParamsSpec, ParamsSpec};

// Signatures and agreement
pub use crate::key_agreement::KeyAgreement;
pub use crate::signature::{Sign, SignSpecItem, Verify};

// Key derivation
pub use crate::kdf::{HkdfParams, Kdf, KdfParamsSpec, Pbkdf2Params, ScryptParams};

// Shared vocabulary
pub use veil_core::{AsyKeySpecItem, BigInteger, CryptoObject, Handle, KeyParamSpec};

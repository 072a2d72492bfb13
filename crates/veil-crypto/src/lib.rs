//! Veil Crypto - digest, MAC, cipher, signature, key agreement and KDF
//! facades over RustCrypto backends.
//!
//! This crate provides:
//! - Primitives created from algorithm names such as `"RSA2048|PSS|SHA256"`
//! - Asymmetric keys built from names, DER encodings or raw components
//! - A streaming lifecycle shared by every digest, MAC, cipher and signature
//! - Service-provider traits so another backend can stand in for the
//!   built-in one
//!
//! Unknown names are [`CryptoError::InvalidParams`]; well-formed names
//! without a backend are [`CryptoError::NotSupported`].
//!
//! # Example
//!
//! ```
//! use veil_crypto::prelude::*;
//!
//! let pair = AsyKeyGenerator::create("ECC256")
//!     .unwrap()
//!     .generate_key_pair()
//!     .unwrap();
//!
//! let mut signer = Sign::create("ECC256|SHA256").unwrap();
//! signer.init(pair.private_key().unwrap()).unwrap();
//! let signature = signer.sign(b"hello").unwrap();
//!
//! let mut verifier = Verify::create("ECC256|SHA256").unwrap();
//! verifier.init(pair.public_key().unwrap()).unwrap();
//! assert!(verifier.verify(b"hello", &signature).unwrap());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod asy_key;
pub mod catalog;
pub mod cipher;
pub mod dh_key_util;
pub mod kdf;
pub mod key_agreement;
pub mod mac;
pub mod md;
pub mod prelude;
pub mod random;
pub mod signature;
pub mod spi;
pub mod sym_key;

mod backend;
mod selector;

pub use veil_core::{Blob, CryptoError, CryptoResult, ErrorCode};

//! Veil Core - the backbone shared by every primitive of the Veil crypto
//! facade.
//!
//! This crate provides:
//! - A table-driven parser for algorithm names such as `"HMAC|SHA256"`
//! - Key parameter specs that describe asymmetric keys by raw components
//! - The object convention every created primitive follows
//! - A closed error taxonomy with stable numeric codes
//!
//! It performs no cryptography itself; `veil-crypto` builds the primitives
//! on top of it.
//!
//! # Example
//!
//! ```
//! use veil_core::{AlgorithmDescriptor, DigestAlg, KeySize, Padding, Token};
//!
//! let descriptor = AlgorithmDescriptor::parse("RSA2048|PKCS1|SHA256").unwrap();
//! assert_eq!(
//!     descriptor.tokens(),
//!     &[
//!         Token::KeySize(KeySize::Rsa(2048)),
//!         Token::Padding(Padding::Pkcs1),
//!         Token::Digest(DigestAlg::Sha256),
//!     ]
//! );
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod algorithm;
pub mod blob;
pub mod descriptor;
pub mod error;
pub mod object;
pub mod prelude;
pub mod spec;
pub mod state;

pub use algorithm::{CipherMode, DhGroup, DigestAlg, EcCurve, Family, HkdfMode, KeySize, Padding, Primes};
pub use blob::Blob;
pub use descriptor::{
    ALGORITHM_RULES, AlgorithmDescriptor, ClassifierRule, DELIMITER, DescriptorSink,
    MAX_ALGORITHM_NAME_LEN, Token,
};
pub use error::{CryptoError, CryptoResult, ErrorCode};
pub use object::{CryptoObject, Handle};
pub use spec::{AsyKeySpec, AsyKeySpecItem, BigInteger, KeyParamSpec, SpecKind};
pub use state::StreamState;

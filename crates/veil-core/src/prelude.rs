//! Prelude module - commonly used types for convenient import.
//!
//! Use `use veil_core::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use veil_core::prelude::*;
//!
//! let descriptor = AlgorithmDescriptor::parse("RSA2048|PKCS1|SHA256").unwrap();
//! assert_eq!(descriptor.tokens().len(), 3);
//! ```

// Errors
pub use crate::{CryptoError, CryptoResult, ErrorCode};

// Buffers and objects
pub use crate::{Blob, CryptoObject, Handle};

// Algorithm vocabulary
pub use crate::{CipherMode, DigestAlg, EcCurve, Family, HkdfMode, KeySize, Padding, Primes};

// Descriptor parsing
pub use crate::{AlgorithmDescriptor, DescriptorSink, Token};

// Key parameter specs
pub use crate::{AsyKeySpec, AsyKeySpecItem, BigInteger, KeyParamSpec, SpecKind};

// Streaming lifecycle
pub use crate::StreamState;

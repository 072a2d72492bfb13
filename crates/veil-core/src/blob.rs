//! Owned byte buffers used at every API boundary.
//!
//! Inputs cross the boundary borrowed (`&[u8]`); outputs are returned as a
//! [`Blob`] whose ownership moves to the caller. The bytes are wiped when the
//! blob is dropped, so key material never outlives its owner.

use std::fmt;
use std::ops::Deref;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// A length-carrying byte buffer that zeroizes on drop.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    /// Create an empty blob.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty blob able to hold `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AllocationFailure`] if the reservation fails.
    pub fn with_capacity(capacity: usize) -> CryptoResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| CryptoError::AllocationFailure {
                requested: capacity,
            })?;
        Ok(Self { data })
    }

    /// Copy borrowed bytes into a new owned blob.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AllocationFailure`] if the copy cannot be
    /// allocated.
    pub fn copy_from(bytes: &[u8]) -> CryptoResult<Self> {
        let mut blob = Self::with_capacity(bytes.len())?;
        blob.data.extend_from_slice(bytes);
        Ok(blob)
    }

    /// Append bytes, growing the buffer fallibly.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::AllocationFailure`] if the buffer cannot grow.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> CryptoResult<()> {
        self.data
            .try_reserve(bytes.len())
            .map_err(|_| CryptoError::AllocationFailure {
                requested: bytes.len(),
            })?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the contents out of the blob. The caller becomes responsible for
    /// wiping them.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// Lowercase hex rendering of the contents.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }

    /// Wipe the contents and release the buffer.
    pub fn clear(&mut self) {
        self.data.zeroize();
        self.data = Vec::new();
    }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.data.ct_eq(&other.data).into()
    }
}

impl Eq for Blob {}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob").field("len", &self.data.len()).finish()
    }
}

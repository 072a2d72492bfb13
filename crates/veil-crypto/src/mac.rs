//! Keyed message authentication codes.

use tracing::debug;
use veil_core::{Blob, CryptoError, CryptoResult, Family, StreamState, crypto_object};

use crate::backend::hmac::hmac_backend;
use crate::selector::{Accepts, Selector};
use crate::spi::MacSpi;
use crate::sym_key::SymKey;

/// A streaming HMAC.
///
/// Must be keyed with [`Mac::init`] before data is absorbed, and re-keyed
/// after every [`Mac::do_final`].
pub struct Mac {
    spi: Box<dyn MacSpi>,
    state: StreamState,
    algorithm: String,
}

crypto_object!(Mac, "Mac");

impl Mac {
    /// Create a MAC from a name of the form `"HMAC|<digest>"`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a malformed name, a family
    /// other than HMAC, or a missing digest.
    pub fn create(name: &str) -> CryptoResult<Self> {
        let accepts = Accepts {
            family: true,
            digest: true,
            ..Accepts::default()
        };
        let selector = Selector::parse(name, "Mac", accepts)?;
        let family = selector.family()?;
        if family != Family::Hmac {
            return Err(CryptoError::InvalidParams(format!(
                "{family} is not a MAC algorithm"
            )));
        }
        let digest = selector.digest()?;
        debug!(algorithm = name, %digest, "created MAC");
        Ok(Self::from_spi(hmac_backend(digest), name))
    }

    /// Wrap a caller-supplied backend. The MAC still needs a key.
    #[must_use]
    pub fn from_spi(spi: Box<dyn MacSpi>, algorithm: impl Into<String>) -> Self {
        Self {
            spi,
            state: StreamState::Uninitialized,
            algorithm: algorithm.into(),
        }
    }

    /// Key the MAC and start a new message.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the key.
    pub fn init(&mut self, key: &SymKey) -> CryptoResult<()> {
        self.spi.init(key.bytes())?;
        self.state.init();
        Ok(())
    }

    /// Absorb data.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the MAC is not keyed.
    pub fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.state.ensure_ready("Mac::update")?;
        self.spi.update(data)?;
        self.state.update("Mac::update")
    }

    /// Finish the message and return the tag.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] if the MAC is not keyed.
    pub fn do_final(&mut self) -> CryptoResult<Blob> {
        self.state.finish("Mac::do_final")?;
        self.spi.finalize()
    }

    /// Tag length in bytes.
    #[must_use]
    pub fn mac_length(&self) -> usize {
        self.spi.output_len()
    }

    /// Algorithm name, e.g. `"HMAC|SHA256"`.
    #[must_use]
    pub fn algo_name(&self) -> &str {
        &self.algorithm
    }
}

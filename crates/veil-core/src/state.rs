//! Lifecycle shared by every streaming primitive.
//!
//! `Uninitialized -> Initialized -> (Updated)* -> Finalized`. `init` may be
//! called from any state and restarts the object. Calls out of order are a
//! usage error reported as [`CryptoError::InvalidParams`].

use crate::error::{CryptoError, CryptoResult};

/// Position of a streaming object in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamState {
    /// Created, `init` not yet called.
    #[default]
    Uninitialized,
    /// Ready for data.
    Initialized,
    /// Has absorbed data since the last `init`.
    Updated,
    /// Produced its final output; needs `init` before reuse.
    Finalized,
}

impl StreamState {
    /// Move to `Initialized` from any state.
    pub fn init(&mut self) {
        *self = Self::Initialized;
    }

    /// Check an `update` is legal and record it.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] unless initialized.
    pub fn update(&mut self, operation: &str) -> CryptoResult<()> {
        self.ensure_ready(operation)?;
        *self = Self::Updated;
        Ok(())
    }

    /// Check a finishing call is legal and record it.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] unless initialized.
    pub fn finish(&mut self, operation: &str) -> CryptoResult<()> {
        self.ensure_ready(operation)?;
        *self = Self::Finalized;
        Ok(())
    }

    /// Check the object is `Initialized` or `Updated` without moving it.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] otherwise.
    pub fn ensure_ready(self, operation: &str) -> CryptoResult<()> {
        match self {
            Self::Initialized | Self::Updated => Ok(()),
            Self::Uninitialized => Err(CryptoError::InvalidParams(format!(
                "{operation} called before init"
            ))),
            Self::Finalized => Err(CryptoError::InvalidParams(format!(
                "{operation} called after final output without a new init"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = StreamState::default();
        state.init();
        state.update("update").unwrap();
        state.update("update").unwrap();
        state.finish("doFinal").unwrap();
        assert_eq!(state, StreamState::Finalized);
    }

    #[test]
    fn test_final_without_init() {
        let mut state = StreamState::default();
        assert!(matches!(
            state.finish("doFinal"),
            Err(CryptoError::InvalidParams(_))
        ));
        assert_eq!(state, StreamState::Uninitialized);
    }

    #[test]
    fn test_update_after_final() {
        let mut state = StreamState::Initialized;
        state.finish("doFinal").unwrap();
        assert!(state.update("update").is_err());
        assert!(state.finish("doFinal").is_err());
    }

    #[test]
    fn test_second_init_restarts() {
        let mut state = StreamState::Initialized;
        state.update("update").unwrap();
        state.init();
        assert_eq!(state, StreamState::Initialized);
        state.finish("doFinal").unwrap();
        state.init();
        assert!(state.update("update").is_ok());
    }
}

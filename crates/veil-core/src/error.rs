//! Error taxonomy shared by every primitive.
//!
//! Callers branch on the category, so the four failure kinds stay distinct
//! all the way up: malformed input, unimplemented combination, exhausted
//! memory, and a failed cryptographic operation.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// Errors returned by every facade and backend operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Malformed input, out-of-order call, or a handle of the wrong type.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Well-formed request for a combination that is not implemented.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// An output buffer could not be allocated.
    #[error("allocation of {requested} bytes failed")]
    AllocationFailure {
        /// Number of bytes that were requested.
        requested: usize,
    },

    /// The backend rejected or failed the cryptographic operation.
    #[error("crypto operation failed: {0}")]
    OperationFailed(String),
}

impl CryptoError {
    /// Stable numeric code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidParams(_) => ErrorCode::InvalidParams,
            Self::NotSupported(_) => ErrorCode::NotSupported,
            Self::AllocationFailure { .. } => ErrorCode::AllocationFailure,
            Self::OperationFailed(_) => ErrorCode::OperationFailure,
        }
    }

    /// Wrap a backend error as an operation failure.
    pub fn backend(err: impl fmt::Display) -> Self {
        Self::OperationFailed(err.to_string())
    }
}

impl From<TryReserveError> for CryptoError {
    fn from(_: TryReserveError) -> Self {
        Self::AllocationFailure { requested: 0 }
    }
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Stable result codes exposed to callers that cannot consume
/// [`CryptoError`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// The call succeeded.
    Success = 0,
    /// Malformed input or usage sequence.
    InvalidParams = -10001,
    /// Unimplemented combination.
    NotSupported = -10002,
    /// Out of memory.
    AllocationFailure = -20001,
    /// Backend cryptographic failure.
    OperationFailure = -30001,
}

impl ErrorCode {
    /// Numeric value of the code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Code for the outcome of a fallible call.
    #[must_use]
    pub fn of<T>(result: &CryptoResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => e.code(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "SUCCESS",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::NotSupported => "NOT_SUPPORT",
            Self::AllocationFailure => "ERR_MALLOC",
            Self::OperationFailure => "ERR_CRYPTO_OPERATION",
        };
        write!(f, "{name} ({})", self.as_i32())
    }
}

//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer is shorter than the fixed frame being decoded.
    #[error("insufficient data: need at least {needed} bytes but got {actual}")]
    InsufficientData {
        /// Number of bytes the frame requires.
        needed: usize,
        /// Number of bytes supplied.
        actual: usize,
    },

    /// A packet carried a different type identifier than the one requested.
    #[error("unexpected packet type: expected {expected:#018x}, got {actual:#018x}")]
    UnexpectedPacketType {
        /// Type identifier the caller asked for.
        expected: u64,
        /// Type identifier found on the packet.
        actual: u64,
    },

    /// Failed to decode bytes for a reason other than length.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },
}

impl CodecError {
    /// Create an insufficient data error.
    pub fn insufficient_data(needed: usize, actual: usize) -> Self {
        Self::InsufficientData { needed, actual }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }
}

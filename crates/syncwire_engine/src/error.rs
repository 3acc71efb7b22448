//! Error types for the sync engine.

use crate::states::StateId;
use syncwire_codec::CodecError;
use syncwire_protocol::Flow;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a protocol run.
///
/// Every variant is fatal for the run that produced it. The engine never
/// retries; a caller that wants another attempt starts a fresh run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The transport failed to send or receive.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport gave up waiting for the peer.
    #[error("operation timed out")]
    Timeout,

    /// The peer closed its side of the transport.
    #[error("transport disconnected")]
    Disconnected,

    /// A control packet could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A batch arrived without a control packet.
    #[error("protocol error: received an empty packet batch")]
    EmptyBatch,

    /// The received phase does not match the phase expected by the current state.
    #[error("protocol error: expected message {expected}, received {received}")]
    UnexpectedMessage {
        /// Message code the state was waiting for.
        expected: u16,
        /// Message code actually received.
        received: u16,
    },

    /// A packet that must acknowledge the step did not.
    #[error("protocol error: message {message_code} was not acknowledged")]
    MissingAcknowledgement {
        /// Message code of the unacknowledged packet.
        message_code: u16,
    },

    /// A start-flow packet announced an unusable flow.
    #[error("protocol error: invalid flow code {0}")]
    InvalidFlow(u32),

    /// A state was entered with a flow it cannot serve.
    #[error("protocol error: state {state} cannot run with flow {flow}")]
    InvalidState {
        /// State being executed.
        state: StateId,
        /// Flow held by the runtime context.
        flow: Flow,
    },

    /// The data stream ran past the configured bound.
    #[error("protocol error: data stream exceeded {limit} packets")]
    DataStreamLimitExceeded {
        /// Configured maximum.
        limit: u32,
    },

    /// The peer rejected the step with a non-zero error code.
    #[error("remote rejected message {message_code} with error code {error_code}")]
    RemoteRejected {
        /// Message code of the rejecting packet.
        message_code: u16,
        /// Error code set by the peer.
        error_code: u16,
    },

    /// The local host handler rejected the step with a non-zero error code.
    #[error("host handler rejected message {message_code} with error code {error_code}")]
    HandlerRejected {
        /// Message code being handled.
        message_code: u16,
        /// Error code set by the handler.
        error_code: u16,
    },

    /// The host handler failed.
    #[error("host handler error: {0}")]
    Handler(String),

    /// The engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a host handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Returns true if the transport failed.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::Timeout | SyncError::Disconnected
        )
    }

    /// Returns true if the peer broke the protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            SyncError::EmptyBatch
                | SyncError::UnexpectedMessage { .. }
                | SyncError::MissingAcknowledgement { .. }
                | SyncError::InvalidFlow(_)
                | SyncError::InvalidState { .. }
                | SyncError::DataStreamLimitExceeded { .. }
        )
    }

    /// Returns true if the peer rejected the run.
    pub fn is_remote_rejection(&self) -> bool {
        matches!(self, SyncError::RemoteRejected { .. })
    }
}

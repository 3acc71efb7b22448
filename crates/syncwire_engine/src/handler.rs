//! Host handler contract.
//!
//! The host handler is the application's hook into the protocol. It is
//! called once for every control packet the engine sends or receives
//! (except action-response), and decides the status value, the error code
//! and the payload packets riding along.

use crate::error::SyncResult;
use crate::states::StateId;
use syncwire_codec::Packet;
use syncwire_protocol::{Flow, Role, StatePacket, StatusValue};

/// Snapshot handed to the host handler on each call.
///
/// Built fresh for every call so the handler can branch on the phase
/// without keeping state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerContext {
    flow: Flow,
    state: StateId,
}

impl HandlerContext {
    /// Creates a handler context.
    pub fn new(flow: Flow, state: StateId) -> Self {
        Self { flow, state }
    }

    /// Returns the flow of the run.
    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Returns the state issuing the call.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// Returns the role this participant plays in the current state.
    pub fn role(&self) -> Option<Role> {
        self.state.role(self.flow)
    }
}

/// What the host handler hands back to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandlerReturn {
    /// Reserved. Logged by the engine, never consumed by a transition.
    pub retry: bool,
    /// Status value to stamp on an outgoing control packet.
    pub status: StatusValue,
    /// Payload packets to send after an outgoing control packet.
    pub packets: Vec<Packet>,
    /// Non-zero rejects the step.
    pub error_code: u16,
}

impl HandlerReturn {
    /// Creates a return value with the given status.
    pub fn new(status: StatusValue) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// An acknowledgement with no payload.
    pub fn acknowledged() -> Self {
        Self::new(StatusValue::acknowledged())
    }

    /// A rejection carrying `error_code`.
    pub fn rejected(error_code: u16) -> Self {
        Self::new(StatusValue::rejected()).with_error_code(error_code)
    }

    /// Sets the payload packets.
    pub fn with_packets(mut self, packets: Vec<Packet>) -> Self {
        self.packets = packets;
        self
    }

    /// Sets the error code.
    pub fn with_error_code(mut self, error_code: u16) -> Self {
        self.error_code = error_code;
        self
    }

    /// Sets the retry flag.
    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }
}

/// Application callback invoked around every control packet.
pub trait HostHandler: Send + Sync {
    /// Handles one control packet.
    ///
    /// `packets` holds the payload packets received with `packet`; it is
    /// empty when `packet` is about to be sent.
    fn handle(
        &self,
        context: &HandlerContext,
        packet: &StatePacket,
        packets: Vec<Packet>,
    ) -> SyncResult<HandlerReturn>;
}

/// A [`HostHandler`] backed by a closure. Build one with [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Wraps a closure as a [`HostHandler`].
///
/// ```
/// use syncwire_engine::{handler_fn, HandlerReturn};
///
/// let handler = handler_fn(|_ctx, _packet, _packets| Ok(HandlerReturn::acknowledged()));
/// # let _ = handler;
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&HandlerContext, &StatePacket, Vec<Packet>) -> SyncResult<HandlerReturn> + Send + Sync,
{
    FnHandler { f }
}

impl<F> HostHandler for FnHandler<F>
where
    F: Fn(&HandlerContext, &StatePacket, Vec<Packet>) -> SyncResult<HandlerReturn> + Send + Sync,
{
    fn handle(
        &self,
        context: &HandlerContext,
        packet: &StatePacket,
        packets: Vec<Packet>,
    ) -> SyncResult<HandlerReturn> {
        (self.f)(context, packet, packets)
    }
}

//! Immutable runtime context threaded through every transition.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::handler::{HandlerContext, HostHandler};
use crate::states::StateId;
use crate::transport::Transport;
use std::fmt;
use syncwire_protocol::Flow;

/// Everything a state function can see.
///
/// The context is a small `Copy` value. It is never mutated: each `with_*`
/// method returns an updated copy, so any intermediate context can be kept
/// and inspected after the fact.
#[derive(Clone, Copy)]
pub struct RuntimeContext<'a> {
    transport: &'a dyn Transport,
    handler: &'a dyn HostHandler,
    flow: Flow,
    initial_state: StateId,
    current_state: StateId,
    data_stream_packets: u32,
    max_data_stream_packets: u32,
    is_final: bool,
}

impl<'a> RuntimeContext<'a> {
    /// Creates a context with an unknown flow, positioned at `initial_state`.
    pub fn new(
        transport: &'a dyn Transport,
        handler: &'a dyn HostHandler,
        initial_state: StateId,
        config: &EngineConfig,
    ) -> Self {
        Self {
            transport,
            handler,
            flow: Flow::Unknown,
            initial_state,
            current_state: initial_state,
            data_stream_packets: 0,
            max_data_stream_packets: config.max_data_stream_packets,
            is_final: false,
        }
    }

    /// Returns a copy carrying `flow`.
    pub fn with_flow(self, flow: Flow) -> Self {
        Self { flow, ..self }
    }

    /// Returns a copy that has adopted `flow` from the peer.
    ///
    /// Fails if a different flow was already adopted.
    pub fn adopt_flow(self, flow: Flow) -> SyncResult<Self> {
        if !flow.is_known() {
            return Err(SyncError::InvalidFlow(flow.code()));
        }
        if self.flow.is_known() && self.flow != flow {
            return Err(SyncError::InvalidState {
                state: self.current_state,
                flow: self.flow,
            });
        }
        Ok(self.with_flow(flow))
    }

    /// Returns a copy positioned at `state`.
    pub fn with_state(self, state: StateId) -> Self {
        Self {
            current_state: state,
            ..self
        }
    }

    /// Returns a copy marked terminal.
    pub fn with_final(self) -> Self {
        Self {
            is_final: true,
            ..self
        }
    }

    /// Returns a copy that has counted one more data stream packet.
    pub fn with_data_stream_packet(self) -> Self {
        Self {
            data_stream_packets: self.data_stream_packets.saturating_add(1),
            ..self
        }
    }

    /// Returns the flow of the run.
    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Returns the state the run started in.
    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }

    /// Returns the state being executed.
    pub fn current_state(&self) -> StateId {
        self.current_state
    }

    /// Returns true once the run has reached its terminal state.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Returns the number of data stream packets sent or received so far.
    pub fn data_stream_packets(&self) -> u32 {
        self.data_stream_packets
    }

    /// Returns the configured data stream bound.
    pub fn max_data_stream_packets(&self) -> u32 {
        self.max_data_stream_packets
    }

    /// Builds the snapshot passed to the host handler.
    pub fn handler_context(&self) -> HandlerContext {
        HandlerContext::new(self.flow, self.current_state)
    }

    pub(crate) fn transport(&self) -> &'a dyn Transport {
        self.transport
    }

    pub(crate) fn handler(&self) -> &'a dyn HostHandler {
        self.handler
    }
}

impl fmt::Debug for RuntimeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("flow", &self.flow)
            .field("initial_state", &self.initial_state)
            .field("current_state", &self.current_state)
            .field("data_stream_packets", &self.data_stream_packets)
            .field("max_data_stream_packets", &self.max_data_stream_packets)
            .field("is_final", &self.is_final)
            .finish_non_exhaustive()
    }
}

/// Outcome of one state function.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    /// Context to hand to the next state.
    pub context: RuntimeContext<'a>,
    /// State to run next; `None` ends the run.
    pub next: Option<StateId>,
}

impl<'a> Transition<'a> {
    /// Continues with `next`.
    pub fn to(context: RuntimeContext<'a>, next: StateId) -> Self {
        Self {
            context,
            next: Some(next),
        }
    }

    /// Ends the run normally.
    pub fn finish(context: RuntimeContext<'a>) -> Self {
        Self {
            context: context.with_final(),
            next: None,
        }
    }
}

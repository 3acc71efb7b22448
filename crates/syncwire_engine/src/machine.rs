//! The state machine driver.

use crate::config::EngineConfig;
use crate::error::SyncResult;
use crate::handler::HostHandler;
use crate::runtime::{RuntimeContext, Transition};
use crate::states::StateId;
use crate::transport::Transport;
use syncwire_protocol::Flow;
use tracing::{debug, warn};

/// Drives the protocol graph for one participant.
///
/// The machine borrows its transport and host handler; both outlive it and
/// are owned by the caller. One machine may execute any number of runs,
/// each one starting from a fresh [`RuntimeContext`].
pub struct StateMachine<'a> {
    config: EngineConfig,
    initial_state: StateId,
    handler: &'a dyn HostHandler,
    transport: &'a dyn Transport,
}

impl<'a> StateMachine<'a> {
    /// Creates a machine that enters the graph through [`StateId::Initial`].
    pub fn new(handler: &'a dyn HostHandler, transport: &'a dyn Transport) -> Self {
        Self {
            config: EngineConfig::default(),
            initial_state: StateId::Initial,
            handler,
            transport,
        }
    }

    /// Sets the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the entry state.
    pub fn with_initial_state(mut self, state: StateId) -> Self {
        self.initial_state = state;
        self
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the entry state.
    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }

    /// Runs the protocol to completion.
    ///
    /// Pass the flow to initiate with, or [`Flow::Unknown`] to respond to
    /// whatever the peer announces. The first error aborts the run and is
    /// returned unchanged.
    pub fn run(&self, flow: Flow) -> SyncResult<()> {
        self.run_observed(flow, |_, _| {})
    }

    /// Runs the protocol, calling `observer` after every completed step
    /// with the resulting context and the state that produced it.
    pub fn run_observed<F>(&self, flow: Flow, mut observer: F) -> SyncResult<()>
    where
        F: FnMut(&RuntimeContext<'a>, StateId),
    {
        self.config.validate()?;

        let mut context =
            RuntimeContext::new(self.transport, self.handler, self.initial_state, &self.config)
                .with_flow(flow);
        let mut state = Some(self.initial_state);

        debug!(flow = %flow, initial = %self.initial_state, "starting run");
        while let Some(current) = state {
            debug!(state = %current, flow = %context.flow(), "entering state");
            let step = current.transition()(context.with_state(current));
            let Transition {
                context: next_context,
                next,
            } = step.map_err(|err| {
                warn!(state = %current, flow = %context.flow(), error = %err, "run aborted");
                err
            })?;

            observer(&next_context, current);
            context = next_context;
            if context.is_final() {
                break;
            }
            state = next;
        }
        debug!(flow = %context.flow(), "run finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::handler::{handler_fn, HandlerReturn};
    use crate::transport::InMemoryTransport;
    use std::thread;
    use syncwire_codec::Packet;
    use syncwire_protocol::StatusValue;

    #[test]
    fn invalid_config_fails_before_any_io() {
        let (transport, _peer) = InMemoryTransport::pair();
        let handler = handler_fn(|_, _, _| Ok(HandlerReturn::acknowledged()));
        let machine = StateMachine::new(&handler, &transport)
            .with_config(EngineConfig::new().with_max_data_stream_packets(0));
        assert!(matches!(
            machine.run(Flow::Pull),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn final_initial_state_ends_immediately() {
        let (transport, _peer) = InMemoryTransport::pair();
        let handler = handler_fn(|_, _, _| Ok(HandlerReturn::acknowledged()));
        let machine = StateMachine::new(&handler, &transport).with_initial_state(StateId::Final);
        assert_eq!(machine.initial_state(), StateId::Final);

        let mut visited = Vec::new();
        machine
            .run_observed(Flow::Push, |ctx, state| visited.push((state, ctx.is_final())))
            .unwrap();
        assert_eq!(visited, vec![(StateId::Final, true)]);
    }

    #[test]
    fn transport_errors_are_returned_unchanged() {
        let (transport, peer) = InMemoryTransport::pair();
        drop(peer);
        let handler = handler_fn(|_, _, _| Ok(HandlerReturn::acknowledged()));
        let machine = StateMachine::new(&handler, &transport);
        assert!(matches!(machine.run(Flow::Pull), Err(SyncError::Disconnected)));
    }

    #[test]
    fn handler_errors_are_returned_unchanged() {
        let (transport, _peer) = InMemoryTransport::pair();
        let handler = handler_fn(|_, _, _| Err(SyncError::handler("no objects")));
        let machine = StateMachine::new(&handler, &transport);
        let err = machine.run(Flow::Push).unwrap_err();
        assert_eq!(err.to_string(), "host handler error: no objects");
    }

    #[test]
    fn two_machines_complete_a_pull() {
        let (initiator_end, responder_end) = InMemoryTransport::pair();

        let responder = thread::spawn(move || {
            let handler = handler_fn(|ctx, packet, _| {
                let status = match packet.message() {
                    Some(syncwire_protocol::MessageCode::ExchangeDataStream) => {
                        StatusValue::completed_stream()
                    }
                    _ => StatusValue::acknowledged(),
                };
                assert!(ctx.flow().is_known());
                Ok(HandlerReturn::new(status))
            });
            StateMachine::new(&handler, &responder_end).run(Flow::Unknown)
        });

        let handler = handler_fn(|_, _, packets: Vec<Packet>| {
            Ok(HandlerReturn::acknowledged().with_packets(packets))
        });
        let mut states = Vec::new();
        StateMachine::new(&handler, &initiator_end)
            .run_observed(Flow::Pull, |ctx, state| {
                assert_eq!(ctx.flow(), Flow::Pull);
                states.push(state);
            })
            .unwrap();
        responder.join().unwrap().unwrap();

        assert_eq!(
            states,
            vec![
                StateId::Initial,
                StateId::StartFlow,
                StateId::RequestObjects,
                StateId::SubscriberNegotiation,
                StateId::SubscriberDataStream,
                StateId::Final,
            ]
        );
    }
}

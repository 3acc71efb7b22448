//! The protocol state graph.
//!
//! Both participants run the same table. The initiator enters through
//! [`StateId::StartFlow`], the responder through [`StateId::ProcessStartFlow`];
//! from then on every branch reads the single adopted [`Flow`].
//!
//! ```text
//!                 pull                                  push
//! initiator:  StartFlow → RequestObjects → SubNeg → SubStream      StartFlow → NotifyObjects → PubNeg → PubStream
//! responder:  ProcessStartFlow → ProcessRequestObjects → PubNeg    ProcessStartFlow → ProcessNotifyObjects → SubNeg
//!                                           → PubStream                                   → SubStream
//! ```

use crate::error::{SyncError, SyncResult};
use crate::operations::{
    handle_received, receive_and_handle, receive_state_packet, send_state_packet,
};
use crate::runtime::{RuntimeContext, Transition};
use std::fmt;
use syncwire_protocol::{Flow, MessageCode, Role};
use tracing::debug;

/// A state function: consumes a context, returns the next transition.
pub type StateFn = for<'a> fn(RuntimeContext<'a>) -> SyncResult<Transition<'a>>;

/// Identifier of every state in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    /// Picks the entry state from the installed flow.
    Initial,
    /// Initiator announces the flow and waits for acknowledgement.
    StartFlow,
    /// Responder adopts the announced flow and acknowledges it.
    ProcessStartFlow,
    /// Pull initiator asks for the current objects state.
    RequestObjects,
    /// Pull responder answers the objects state request.
    ProcessRequestObjects,
    /// Push initiator notifies its current object states.
    NotifyObjects,
    /// Push responder answers the notification.
    ProcessNotifyObjects,
    /// Subscriber opens negotiation and requires acknowledgement.
    SubscriberNegotiation,
    /// Publisher answers negotiation.
    PublisherNegotiation,
    /// Subscriber consumes the data stream.
    SubscriberDataStream,
    /// Publisher produces the data stream.
    PublisherDataStream,
    /// Terminal state.
    Final,
}

impl StateId {
    /// All states in table order.
    pub const ALL: [StateId; 12] = [
        StateId::Initial,
        StateId::StartFlow,
        StateId::ProcessStartFlow,
        StateId::RequestObjects,
        StateId::ProcessRequestObjects,
        StateId::NotifyObjects,
        StateId::ProcessNotifyObjects,
        StateId::SubscriberNegotiation,
        StateId::PublisherNegotiation,
        StateId::SubscriberDataStream,
        StateId::PublisherDataStream,
        StateId::Final,
    ];

    /// Returns the function implementing this state.
    pub fn transition(self) -> StateFn {
        match self {
            StateId::Initial => initial,
            StateId::StartFlow => start_flow,
            StateId::ProcessStartFlow => process_start_flow,
            StateId::RequestObjects => request_objects,
            StateId::ProcessRequestObjects => process_request_objects,
            StateId::NotifyObjects => notify_objects,
            StateId::ProcessNotifyObjects => process_notify_objects,
            StateId::SubscriberNegotiation => subscriber_negotiation,
            StateId::PublisherNegotiation => publisher_negotiation,
            StateId::SubscriberDataStream => subscriber_data_stream,
            StateId::PublisherDataStream => publisher_data_stream,
            StateId::Final => final_state,
        }
    }

    /// Returns true for the terminal state.
    pub fn is_final(self) -> bool {
        self == StateId::Final
    }

    /// Returns the role a participant plays while in this state.
    pub fn role(self, flow: Flow) -> Option<Role> {
        match self {
            StateId::StartFlow => flow.role(true),
            StateId::ProcessStartFlow => flow.role(false),
            StateId::RequestObjects
            | StateId::ProcessNotifyObjects
            | StateId::SubscriberNegotiation
            | StateId::SubscriberDataStream => Some(Role::Subscriber),
            StateId::ProcessRequestObjects
            | StateId::NotifyObjects
            | StateId::PublisherNegotiation
            | StateId::PublisherDataStream => Some(Role::Publisher),
            StateId::Initial | StateId::Final => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            StateId::Initial => "initial",
            StateId::StartFlow => "start-flow",
            StateId::ProcessStartFlow => "process-start-flow",
            StateId::RequestObjects => "request-objects",
            StateId::ProcessRequestObjects => "process-request-objects",
            StateId::NotifyObjects => "notify-objects",
            StateId::ProcessNotifyObjects => "process-notify-objects",
            StateId::SubscriberNegotiation => "subscriber-negotiation",
            StateId::PublisherNegotiation => "publisher-negotiation",
            StateId::SubscriberDataStream => "subscriber-data-stream",
            StateId::PublisherDataStream => "publisher-data-stream",
            StateId::Final => "final",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn invalid_state(context: &RuntimeContext<'_>) -> SyncError {
    SyncError::InvalidState {
        state: context.current_state(),
        flow: context.flow(),
    }
}

fn initial(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    let next = if context.flow().is_known() {
        StateId::StartFlow
    } else {
        StateId::ProcessStartFlow
    };
    debug!(flow = %context.flow(), next = %next, "selected entry state");
    Ok(Transition::to(context, next))
}

fn start_flow(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    if !context.flow().is_known() {
        return Err(invalid_state(&context));
    }
    send_state_packet(&context, MessageCode::StartFlow)?;
    let response = receive_and_handle(&context, MessageCode::ActionResponse)?;
    if !response.has_ack() {
        return Err(SyncError::MissingAcknowledgement {
            message_code: response.message_code,
        });
    }
    match context.flow() {
        Flow::Pull => Ok(Transition::to(context, StateId::RequestObjects)),
        Flow::Push => Ok(Transition::to(context, StateId::NotifyObjects)),
        Flow::Unknown => Err(invalid_state(&context)),
    }
}

fn process_start_flow(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    let (packet, payload) = receive_state_packet(&context, MessageCode::StartFlow)?;
    let flow = packet
        .flow()
        .map_err(|invalid| SyncError::InvalidFlow(invalid.0))?;
    let context = context.adopt_flow(flow)?;
    debug!(flow = %flow, "adopted flow");

    handle_received(&context, &packet, payload)?;
    send_state_packet(&context, MessageCode::ActionResponse)?;
    match context.flow() {
        Flow::Pull => Ok(Transition::to(context, StateId::ProcessRequestObjects)),
        Flow::Push => Ok(Transition::to(context, StateId::ProcessNotifyObjects)),
        Flow::Unknown => Err(invalid_state(&context)),
    }
}

fn request_objects(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    send_state_packet(&context, MessageCode::RequestCurrentObjectsState)?;
    receive_and_handle(&context, MessageCode::RespondCurrentState)?;
    Ok(Transition::to(context, StateId::SubscriberNegotiation))
}

fn process_request_objects(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    receive_and_handle(&context, MessageCode::RequestCurrentObjectsState)?;
    send_state_packet(&context, MessageCode::RespondCurrentState)?;
    Ok(Transition::to(context, StateId::PublisherNegotiation))
}

fn notify_objects(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    send_state_packet(&context, MessageCode::NotifyCurrentObjectStates)?;
    receive_and_handle(&context, MessageCode::RespondCurrentState)?;
    Ok(Transition::to(context, StateId::PublisherNegotiation))
}

fn process_notify_objects(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    receive_and_handle(&context, MessageCode::NotifyCurrentObjectStates)?;
    send_state_packet(&context, MessageCode::RespondCurrentState)?;
    Ok(Transition::to(context, StateId::SubscriberNegotiation))
}

fn subscriber_negotiation(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    send_state_packet(&context, MessageCode::NegotiationRequest)?;
    let response = receive_and_handle(&context, MessageCode::RespondNegotiationRequest)?;
    if !response.has_ack() {
        return Err(SyncError::MissingAcknowledgement {
            message_code: response.message_code,
        });
    }
    Ok(Transition::to(context, StateId::SubscriberDataStream))
}

fn publisher_negotiation(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    receive_and_handle(&context, MessageCode::NegotiationRequest)?;
    send_state_packet(&context, MessageCode::RespondNegotiationRequest)?;
    Ok(Transition::to(context, StateId::PublisherDataStream))
}

fn check_stream_bound(context: &RuntimeContext<'_>) -> SyncResult<()> {
    if context.data_stream_packets() >= context.max_data_stream_packets() {
        return Err(SyncError::DataStreamLimitExceeded {
            limit: context.max_data_stream_packets(),
        });
    }
    Ok(())
}

fn subscriber_data_stream(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    check_stream_bound(&context)?;
    let packet = receive_and_handle(&context, MessageCode::ExchangeDataStream)?;
    let context = context.with_data_stream_packet();
    if packet.has_active_data_stream() {
        Ok(Transition::to(context, StateId::SubscriberDataStream))
    } else {
        debug!(packets = context.data_stream_packets(), "data stream consumed");
        Ok(Transition::to(context, StateId::Final))
    }
}

fn publisher_data_stream(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    check_stream_bound(&context)?;
    let packet = send_state_packet(&context, MessageCode::ExchangeDataStream)?;
    let context = context.with_data_stream_packet();
    if packet.has_active_data_stream() {
        Ok(Transition::to(context, StateId::PublisherDataStream))
    } else {
        debug!(packets = context.data_stream_packets(), "data stream produced");
        Ok(Transition::to(context, StateId::Final))
    }
}

fn final_state(context: RuntimeContext<'_>) -> SyncResult<Transition<'_>> {
    Ok(Transition::finish(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::handler::{handler_fn, HandlerReturn};
    use crate::transport::{InMemoryStream, Transport};
    use syncwire_codec::{Packet, PacketType};
    use syncwire_protocol::{StatePacket, StatusValue};

    /// Transport double: records sends, replays queued batches.
    #[derive(Default)]
    struct LoopDouble {
        sent: InMemoryStream,
        incoming: InMemoryStream,
    }

    impl LoopDouble {
        fn queue(&self, packet: StatePacket) {
            self.incoming.push(vec![packet.to_packet()]).unwrap();
        }
    }

    impl Transport for LoopDouble {
        fn transmit(&self, packets: Vec<Packet>) -> SyncResult<()> {
            self.sent.push(packets)
        }

        fn receive(&self) -> SyncResult<Vec<Packet>> {
            if self.incoming.is_empty() {
                return Err(SyncError::Disconnected);
            }
            self.incoming.pop()
        }
    }

    fn run_state(
        transport: &LoopDouble,
        state: StateId,
        flow: Flow,
        reply: HandlerReturn,
    ) -> SyncResult<(Flow, Option<StateId>)> {
        let handler = handler_fn(move |_, _, _| Ok(reply.clone()));
        let config = EngineConfig::new();
        let context = RuntimeContext::new(transport, &handler, state, &config).with_flow(flow);
        let transition = state.transition()(context)?;
        Ok((transition.context.flow(), transition.next))
    }

    #[test]
    fn table_covers_every_state() {
        for state in StateId::ALL {
            let _ = state.transition();
            assert!(!state.to_string().is_empty());
        }
        assert!(StateId::Final.is_final());
        assert!(!StateId::Initial.is_final());
    }

    #[test]
    fn roles_by_state() {
        assert_eq!(StateId::RequestObjects.role(Flow::Pull), Some(Role::Subscriber));
        assert_eq!(StateId::NotifyObjects.role(Flow::Push), Some(Role::Publisher));
        assert_eq!(StateId::ProcessStartFlow.role(Flow::Pull), Some(Role::Publisher));
        assert_eq!(StateId::ProcessStartFlow.role(Flow::Unknown), None);
        assert_eq!(StateId::Final.role(Flow::Pull), None);
    }

    #[test]
    fn initial_dispatches_on_flow() {
        let transport = LoopDouble::default();
        let ack = HandlerReturn::acknowledged();
        assert_eq!(
            run_state(&transport, StateId::Initial, Flow::Pull, ack.clone()).unwrap().1,
            Some(StateId::StartFlow)
        );
        assert_eq!(
            run_state(&transport, StateId::Initial, Flow::Unknown, ack).unwrap().1,
            Some(StateId::ProcessStartFlow)
        );
    }

    #[test]
    fn start_flow_branches_on_flow() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::action_response());
        let (_, next) =
            run_state(&transport, StateId::StartFlow, Flow::Pull, HandlerReturn::default()).unwrap();
        assert_eq!(next, Some(StateId::RequestObjects));

        let sent = StatePacket::from_packet(&transport.sent.pop().unwrap()[0]).unwrap();
        assert_eq!(sent.message(), Some(MessageCode::StartFlow));
        assert_eq!(sent.flow(), Ok(Flow::Pull));

        transport.queue(StatePacket::action_response());
        let (_, next) =
            run_state(&transport, StateId::StartFlow, Flow::Push, HandlerReturn::default()).unwrap();
        assert_eq!(next, Some(StateId::NotifyObjects));
    }

    #[test]
    fn start_flow_requires_acknowledgement() {
        let transport = LoopDouble::default();
        transport.queue(
            StatePacket::new(MessageCode::ActionResponse, StatusValue::rejected()),
        );
        let err = run_state(&transport, StateId::StartFlow, Flow::Pull, HandlerReturn::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::MissingAcknowledgement { message_code: 101 }
        ));
    }

    #[test]
    fn start_flow_rejects_unknown_flow() {
        let transport = LoopDouble::default();
        let err = run_state(&transport, StateId::StartFlow, Flow::Unknown, HandlerReturn::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidState { .. }));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn process_start_flow_adopts_flow() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::start_flow(Flow::Push));
        let (flow, next) = run_state(
            &transport,
            StateId::ProcessStartFlow,
            Flow::Unknown,
            HandlerReturn::default(),
        )
        .unwrap();
        assert_eq!(flow, Flow::Push);
        assert_eq!(next, Some(StateId::ProcessNotifyObjects));

        let reply = StatePacket::from_packet(&transport.sent.pop().unwrap()[0]).unwrap();
        assert_eq!(reply, StatePacket::action_response());
    }

    #[test]
    fn process_start_flow_rejects_invalid_flow() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::new(
            MessageCode::StartFlow,
            StatusValue::from_halves(0, 42),
        ));
        let err = run_state(
            &transport,
            StateId::ProcessStartFlow,
            Flow::Unknown,
            HandlerReturn::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::InvalidFlow(42)));
    }

    #[test]
    fn unexpected_message_is_a_protocol_violation() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::new(
            MessageCode::NegotiationRequest,
            StatusValue::UNKNOWN,
        ));
        let err = run_state(
            &transport,
            StateId::ProcessRequestObjects,
            Flow::Pull,
            HandlerReturn::acknowledged(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SyncError::UnexpectedMessage {
                expected: 112,
                received: 141
            }
        ));
    }

    #[test]
    fn process_notify_objects_answers_and_moves_to_subscriber() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::new(
            MessageCode::NotifyCurrentObjectStates,
            StatusValue::UNKNOWN,
        ));
        let (_, next) = run_state(
            &transport,
            StateId::ProcessNotifyObjects,
            Flow::Push,
            HandlerReturn::acknowledged(),
        )
        .unwrap();
        assert_eq!(next, Some(StateId::SubscriberNegotiation));
        let reply = StatePacket::from_packet(&transport.sent.pop().unwrap()[0]).unwrap();
        assert_eq!(reply.message(), Some(MessageCode::RespondCurrentState));
    }

    #[test]
    fn responder_attaches_handler_payload() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::new(
            MessageCode::RequestCurrentObjectsState,
            StatusValue::UNKNOWN,
        ));
        let object = Packet::new(PacketType::new(20, 1), vec![1u8, 2, 3]);
        let (_, next) = run_state(
            &transport,
            StateId::ProcessRequestObjects,
            Flow::Pull,
            HandlerReturn::acknowledged().with_packets(vec![object.clone()]),
        )
        .unwrap();
        assert_eq!(next, Some(StateId::PublisherNegotiation));

        let batch = transport.sent.pop().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], object);
    }

    #[test]
    fn subscriber_negotiation_rejected_remotely() {
        let transport = LoopDouble::default();
        transport.queue(
            StatePacket::new(MessageCode::RespondNegotiationRequest, StatusValue::acknowledged())
                .with_error_code(5),
        );
        let err = run_state(
            &transport,
            StateId::SubscriberNegotiation,
            Flow::Pull,
            HandlerReturn::acknowledged(),
        )
        .unwrap_err();
        assert!(err.is_remote_rejection());
    }

    #[test]
    fn publisher_negotiation_can_reject() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::new(
            MessageCode::NegotiationRequest,
            StatusValue::UNKNOWN,
        ));
        let handler = handler_fn(|_, packet, _| match packet.message() {
            Some(MessageCode::RespondNegotiationRequest) => Ok(HandlerReturn::rejected(9)),
            _ => Ok(HandlerReturn::acknowledged()),
        });
        let config = EngineConfig::new();
        let context =
            RuntimeContext::new(&transport, &handler, StateId::PublisherNegotiation, &config)
                .with_flow(Flow::Pull);

        let err = StateId::PublisherNegotiation.transition()(context).unwrap_err();
        assert!(matches!(
            err,
            SyncError::HandlerRejected {
                message_code: 142,
                error_code: 9
            }
        ));
        // The rejection still reaches the peer.
        let sent = StatePacket::from_packet(&transport.sent.pop().unwrap()[0]).unwrap();
        assert_eq!(sent.error_code, 9);
        assert!(!sent.has_ack());
    }

    #[test]
    fn handler_can_reject_incoming_packet() {
        let transport = LoopDouble::default();
        transport.queue(StatePacket::new(
            MessageCode::NegotiationRequest,
            StatusValue::UNKNOWN,
        ));
        let err = run_state(
            &transport,
            StateId::PublisherNegotiation,
            Flow::Pull,
            HandlerReturn::rejected(2),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SyncError::HandlerRejected {
                message_code: 141,
                error_code: 2
            }
        ));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn publisher_stream_loops_while_active() {
        let transport = LoopDouble::default();
        let (_, next) = run_state(
            &transport,
            StateId::PublisherDataStream,
            Flow::Pull,
            HandlerReturn::new(StatusValue::active_stream()),
        )
        .unwrap();
        assert_eq!(next, Some(StateId::PublisherDataStream));

        let (_, next) = run_state(
            &transport,
            StateId::PublisherDataStream,
            Flow::Pull,
            HandlerReturn::new(StatusValue::completed_stream()),
        )
        .unwrap();
        assert_eq!(next, Some(StateId::Final));
    }

    #[test]
    fn stream_bound_is_enforced() {
        let transport = LoopDouble::default();
        let handler = handler_fn(|_, _, _| Ok(HandlerReturn::new(StatusValue::active_stream())));
        let config = EngineConfig::new().with_max_data_stream_packets(1);
        let context = RuntimeContext::new(&transport, &handler, StateId::PublisherDataStream, &config)
            .with_flow(Flow::Pull);

        let first = StateId::PublisherDataStream.transition()(context).unwrap();
        assert_eq!(first.context.data_stream_packets(), 1);
        let err = StateId::PublisherDataStream.transition()(first.context).unwrap_err();
        assert!(matches!(err, SyncError::DataStreamLimitExceeded { limit: 1 }));
    }

    #[test]
    fn final_state_is_terminal() {
        let transport = LoopDouble::default();
        let handler = handler_fn(|_, _, _| Ok(HandlerReturn::default()));
        let config = EngineConfig::new();
        let context = RuntimeContext::new(&transport, &handler, StateId::Final, &config);
        let transition = StateId::Final.transition()(context).unwrap();
        assert!(transition.context.is_final());
        assert_eq!(transition.next, None);
    }
}

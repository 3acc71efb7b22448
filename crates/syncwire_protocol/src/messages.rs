//! Message codes for each protocol phase.

use std::fmt;

/// Phase code carried in the first two bytes of a control packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageCode {
    /// Initiator announces the flow of the run.
    StartFlow = 100,
    /// Generic acknowledgement of an action.
    ActionResponse = 101,
    /// Publisher notifies the state of its current objects.
    NotifyCurrentObjectStates = 111,
    /// Subscriber asks for the state of the current objects.
    RequestCurrentObjectsState = 112,
    /// Answer to a notify or request of the current state.
    RespondCurrentState = 113,
    /// Subscriber opens negotiation.
    NegotiationRequest = 141,
    /// Publisher answers the negotiation.
    RespondNegotiationRequest = 142,
    /// One chunk of the data stream.
    ExchangeDataStream = 170,
}

impl MessageCode {
    /// All known message codes in protocol order.
    pub const ALL: [MessageCode; 8] = [
        MessageCode::StartFlow,
        MessageCode::ActionResponse,
        MessageCode::NotifyCurrentObjectStates,
        MessageCode::RequestCurrentObjectsState,
        MessageCode::RespondCurrentState,
        MessageCode::NegotiationRequest,
        MessageCode::RespondNegotiationRequest,
        MessageCode::ExchangeDataStream,
    ];

    /// Returns the wire value.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Looks up a message code from its wire value.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }
}

impl From<MessageCode> for u16 {
    fn from(value: MessageCode) -> Self {
        value.code()
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageCode::StartFlow => "start-flow",
            MessageCode::ActionResponse => "action-response",
            MessageCode::NotifyCurrentObjectStates => "notify-current-object-states",
            MessageCode::RequestCurrentObjectsState => "request-current-objects-state",
            MessageCode::RespondCurrentState => "respond-current-state",
            MessageCode::NegotiationRequest => "negotiation-request",
            MessageCode::RespondNegotiationRequest => "respond-negotiation-request",
            MessageCode::ExchangeDataStream => "exchange-data-stream",
        };
        write!(f, "{name}({})", self.code())
    }
}

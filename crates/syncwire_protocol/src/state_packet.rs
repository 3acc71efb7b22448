//! The fixed-width control packet.
//!
//! ```text
//! ┌──────────────┬──────────────────┬────────────┐
//! │ Message code │ Status value     │ Error code │
//! │ 2 bytes      │ 8 bytes          │ 2 bytes    │
//! │ uint16 BE    │ uint64 BE        │ uint16 BE  │
//! └──────────────┴──────────────────┴────────────┘
//! ```
//!
//! There is no padding and no version tag.

use crate::flow::{Flow, InvalidFlowCode};
use crate::messages::MessageCode;
use crate::status::{StatusFlag, StatusValue};
use syncwire_codec::{CodecError, CodecResult, Decode, Encode, Packet, PacketType, Typed};

/// Encoded size of a control packet in bytes.
pub const STATE_PACKET_SIZE: usize = 12;

/// Type identifier of packets carrying a [`StatePacket`].
pub const STATE_PACKET_TYPE: PacketType = PacketType::new(10, 0);

/// Signaling envelope sent at every protocol step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatePacket {
    /// Phase code, normally one of [`MessageCode`].
    pub message_code: u16,
    /// Packed status value, see [`StatusValue`].
    pub message_value: u64,
    /// Zero on success; anything else is a rejection by the sender.
    pub error_code: u16,
}

impl StatePacket {
    /// Creates a control packet with no error.
    pub fn new(message: MessageCode, status: StatusValue) -> Self {
        Self {
            message_code: message.code(),
            message_value: status.to_u64(),
            error_code: 0,
        }
    }

    /// Creates the start-flow packet announcing `flow`.
    pub fn start_flow(flow: Flow) -> Self {
        Self::new(
            MessageCode::StartFlow,
            StatusValue::from_halves(StatusFlag::Unknown.code(), flow.code()),
        )
    }

    /// Creates an acknowledging action-response packet.
    pub fn action_response() -> Self {
        Self::new(MessageCode::ActionResponse, StatusValue::acknowledged())
    }

    /// Returns a copy with the status value replaced.
    pub fn with_status(self, status: StatusValue) -> Self {
        Self {
            message_value: status.to_u64(),
            ..self
        }
    }

    /// Returns a copy with the error code replaced.
    pub fn with_error_code(self, error_code: u16) -> Self {
        Self { error_code, ..self }
    }

    /// Returns the phase as a [`MessageCode`], if it is a known one.
    pub fn message(&self) -> Option<MessageCode> {
        MessageCode::from_code(self.message_code)
    }

    /// Returns the unpacked status value.
    pub fn status(&self) -> StatusValue {
        StatusValue::from_u64(self.message_value)
    }

    /// Returns true if the sender rejected the step.
    pub fn has_error(&self) -> bool {
        self.error_code != 0
    }

    /// Returns true if the packet acknowledges the step.
    ///
    /// Always false when the error code is set.
    pub fn has_ack(&self) -> bool {
        !self.has_error() && self.status().high == StatusFlag::Acknowledged.code()
    }

    /// Returns true if more data stream packets follow.
    ///
    /// Always false when the error code is set.
    pub fn has_active_data_stream(&self) -> bool {
        !self.has_error() && self.status().low == StatusFlag::ActiveDataStream.code()
    }

    /// Returns true if this packet closes the data stream.
    ///
    /// Always false when the error code is set.
    pub fn has_completed_data_stream(&self) -> bool {
        !self.has_error() && self.status().low == StatusFlag::CompletedDataStream.code()
    }

    /// Reads the flow announced by a start-flow packet.
    pub fn flow(&self) -> Result<Flow, InvalidFlowCode> {
        Flow::try_from(self.status().low)
    }

    /// Encodes into a fixed-size buffer.
    pub fn to_bytes(&self) -> [u8; STATE_PACKET_SIZE] {
        let mut buf = [0u8; STATE_PACKET_SIZE];
        buf[0..2].copy_from_slice(&self.message_code.to_be_bytes());
        buf[2..10].copy_from_slice(&self.message_value.to_be_bytes());
        buf[10..12].copy_from_slice(&self.error_code.to_be_bytes());
        buf
    }

    /// Decodes from the first [`STATE_PACKET_SIZE`] bytes of `data`.
    ///
    /// Trailing bytes are ignored.
    pub fn from_bytes(data: &[u8]) -> CodecResult<Self> {
        let Some(frame) = data.get(..STATE_PACKET_SIZE) else {
            return Err(CodecError::insufficient_data(STATE_PACKET_SIZE, data.len()));
        };
        let mut code = [0u8; 2];
        let mut value = [0u8; 8];
        let mut error = [0u8; 2];
        code.copy_from_slice(&frame[0..2]);
        value.copy_from_slice(&frame[2..10]);
        error.copy_from_slice(&frame[10..12]);
        Ok(Self {
            message_code: u16::from_be_bytes(code),
            message_value: u64::from_be_bytes(value),
            error_code: u16::from_be_bytes(error),
        })
    }

    /// Wraps the encoded packet in a transport [`Packet`].
    pub fn to_packet(&self) -> Packet {
        Packet::new(STATE_PACKET_TYPE, self.to_bytes().to_vec())
    }

    /// Unwraps a transport [`Packet`], checking its type identifier.
    pub fn from_packet(packet: &Packet) -> CodecResult<Self> {
        packet.decode_as::<Self>()
    }
}

impl Typed for StatePacket {
    const PACKET_TYPE: PacketType = STATE_PACKET_TYPE;
}

impl Encode for StatePacket {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        Ok(self.to_bytes().to_vec())
    }
}

impl Decode for StatePacket {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_big_endian_fields() {
        let packet = StatePacket {
            message_code: 0x0102,
            message_value: 0x0304_0506_0708_090A,
            error_code: 0x0B0C,
        };
        assert_eq!(
            packet.to_bytes(),
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C]
        );
    }

    #[test]
    fn short_buffer_is_insufficient_data() {
        let err = StatePacket::from_bytes(&[0u8; 10]).unwrap_err();
        assert_eq!(err, CodecError::insufficient_data(12, 10));
        assert!(StatePacket::from_bytes(&[]).is_err());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = StatePacket::action_response().to_bytes().to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFF]);
        assert_eq!(
            StatePacket::from_bytes(&bytes).unwrap(),
            StatePacket::action_response()
        );
    }

    #[test]
    fn start_flow_carries_flow() {
        let packet = StatePacket::start_flow(Flow::Pull);
        assert_eq!(packet.message(), Some(MessageCode::StartFlow));
        assert_eq!(packet.flow(), Ok(Flow::Pull));

        let bogus = packet.with_status(StatusValue::from_halves(0, 9));
        assert_eq!(bogus.flow(), Err(InvalidFlowCode(9)));
    }

    #[test]
    fn predicates_read_their_half() {
        let ack = StatePacket::action_response();
        assert!(ack.has_ack());
        assert!(!ack.has_active_data_stream());

        let active = StatePacket::new(MessageCode::ExchangeDataStream, StatusValue::active_stream());
        assert!(active.has_active_data_stream());
        assert!(!active.has_completed_data_stream());

        let done = active.with_status(StatusValue::completed_stream());
        assert!(done.has_completed_data_stream());
        assert!(!done.has_active_data_stream());

        // Stream flag in the acknowledgement half does not count.
        let swapped = active.with_status(StatusValue::from_halves(3, 2));
        assert!(!swapped.has_active_data_stream());
        assert!(!swapped.has_ack());
    }

    #[test]
    fn error_code_masks_status_flags() {
        let rejected = StatePacket::new(
            MessageCode::RespondNegotiationRequest,
            StatusValue::active_stream(),
        )
        .with_error_code(7);
        assert!(rejected.has_error());
        assert!(!rejected.has_ack());
        assert!(!rejected.has_active_data_stream());
        assert!(!rejected.has_completed_data_stream());
    }

    #[test]
    fn packet_wrapping() {
        let packet = StatePacket::start_flow(Flow::Push);
        let wrapped = packet.to_packet();
        assert_eq!(wrapped.packet_type(), STATE_PACKET_TYPE);
        assert_eq!(wrapped.len(), STATE_PACKET_SIZE);
        assert_eq!(StatePacket::from_packet(&wrapped).unwrap(), packet);

        let foreign = Packet::new(PacketType::new(11, 0), packet.to_bytes().to_vec());
        assert!(matches!(
            StatePacket::from_packet(&foreign),
            Err(CodecError::UnexpectedPacketType { .. })
        ));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(code in any::<u16>(), value in any::<u64>(), error in any::<u16>()) {
            let packet = StatePacket { message_code: code, message_value: value, error_code: error };
            let bytes = packet.encode().unwrap();
            prop_assert_eq!(bytes.len(), STATE_PACKET_SIZE);
            prop_assert_eq!(StatePacket::decode(&bytes).unwrap(), packet);
        }

        #[test]
        fn any_short_buffer_fails(bytes in prop::collection::vec(any::<u8>(), 0..STATE_PACKET_SIZE)) {
            let is_insufficient = matches!(
                StatePacket::decode(&bytes),
                Err(CodecError::InsufficientData { .. })
            );
            prop_assert!(is_insufficient);
        }
    }
}

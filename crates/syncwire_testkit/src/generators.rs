//! Property-based test generators using proptest.
//!
//! Provides strategies for generating control packets, flows and payloads.

use proptest::prelude::*;
use syncwire_codec::{Packet, PacketType};
use syncwire_protocol::{Flow, MessageCode, StatePacket, StatusFlag, StatusValue};

/// Strategy for any control packet, including unknown codes and non-zero errors.
pub fn state_packet_strategy() -> impl Strategy<Value = StatePacket> {
    (any::<u16>(), any::<u64>(), any::<u16>()).prop_map(|(code, value, error)| StatePacket {
        message_code: code,
        message_value: value,
        error_code: error,
    })
}

/// Strategy for control packets built only from known codes and flags.
pub fn protocol_packet_strategy() -> impl Strategy<Value = StatePacket> {
    (
        message_code_strategy(),
        status_value_strategy(),
        prop_oneof![3 => Just(0u16), 1 => 1u16..],
    )
        .prop_map(|(message, status, error)| {
            StatePacket::new(message, status).with_error_code(error)
        })
}

/// Strategy for a known message code.
pub fn message_code_strategy() -> impl Strategy<Value = MessageCode> {
    prop::sample::select(MessageCode::ALL.to_vec())
}

/// Strategy for a known status flag.
pub fn status_flag_strategy() -> impl Strategy<Value = StatusFlag> {
    prop::sample::select(vec![
        StatusFlag::Unknown,
        StatusFlag::Rejected,
        StatusFlag::Acknowledged,
        StatusFlag::ActiveDataStream,
        StatusFlag::CompletedDataStream,
    ])
}

/// Strategy for a status value made of two known flags.
pub fn status_value_strategy() -> impl Strategy<Value = StatusValue> {
    (status_flag_strategy(), status_flag_strategy())
        .prop_map(|(ack, stream)| StatusValue::new(ack, stream))
}

/// Strategy for a flow a participant can initiate with.
pub fn known_flow_strategy() -> impl Strategy<Value = Flow> {
    prop_oneof![Just(Flow::Push), Just(Flow::Pull)]
}

/// Strategy for an opaque payload packet.
pub fn payload_packet_strategy() -> impl Strategy<Value = Packet> {
    (
        20u32..30,
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..256),
    )
        .prop_map(|(category, subtype, data)| Packet::new(PacketType::new(category, subtype), data))
}

/// Strategy for the chunks a publisher streams.
pub fn stream_chunks_strategy(max_chunks: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 0..=max_chunks)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

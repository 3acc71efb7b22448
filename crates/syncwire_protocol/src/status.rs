//! Status flags packed into the 64-bit status value of a control packet.
//!
//! Layout:
//!
//! ```text
//! ┌─────────────────────────┬─────────────────────────┐
//! │ high 32 bits            │ low 32 bits             │
//! │ acknowledgement kind    │ data stream kind        │
//! └─────────────────────────┴─────────────────────────┘
//! ```
//!
//! The start-flow packet reuses the low half for the [`Flow`](crate::Flow) code.

use std::fmt;
use syncwire_codec::{pack_u32_pair, unpack_u32_pair};

/// One 32-bit status signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum StatusFlag {
    /// No signal.
    #[default]
    Unknown = 0,
    /// The action was rejected.
    Rejected = 1,
    /// The action was acknowledged.
    Acknowledged = 2,
    /// More data stream packets follow.
    ActiveDataStream = 3,
    /// This is the last data stream packet.
    CompletedDataStream = 4,
}

impl StatusFlag {
    /// Returns the wire value.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks up a flag from its wire value.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(StatusFlag::Unknown),
            1 => Some(StatusFlag::Rejected),
            2 => Some(StatusFlag::Acknowledged),
            3 => Some(StatusFlag::ActiveDataStream),
            4 => Some(StatusFlag::CompletedDataStream),
            _ => None,
        }
    }
}

/// The two status halves of a control packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusValue {
    /// Raw high half (acknowledgement kind).
    pub high: u32,
    /// Raw low half (data stream kind, or flow code on start-flow).
    pub low: u32,
}

impl StatusValue {
    /// Both halves unknown.
    pub const UNKNOWN: StatusValue = StatusValue { high: 0, low: 0 };

    /// Builds a status value from two flags.
    pub const fn new(ack: StatusFlag, stream: StatusFlag) -> Self {
        Self {
            high: ack.code(),
            low: stream.code(),
        }
    }

    /// Builds a status value from raw halves.
    pub const fn from_halves(high: u32, low: u32) -> Self {
        Self { high, low }
    }

    /// An acknowledgement with no stream signal.
    pub const fn acknowledged() -> Self {
        Self::new(StatusFlag::Acknowledged, StatusFlag::Unknown)
    }

    /// A rejection with no stream signal.
    pub const fn rejected() -> Self {
        Self::new(StatusFlag::Rejected, StatusFlag::Unknown)
    }

    /// An acknowledged data stream packet with more to follow.
    pub const fn active_stream() -> Self {
        Self::new(StatusFlag::Acknowledged, StatusFlag::ActiveDataStream)
    }

    /// An acknowledged data stream packet that closes the stream.
    pub const fn completed_stream() -> Self {
        Self::new(StatusFlag::Acknowledged, StatusFlag::CompletedDataStream)
    }

    /// Packs both halves into the wire value.
    pub const fn to_u64(self) -> u64 {
        pack_u32_pair(self.high, self.low)
    }

    /// Unpacks a wire value.
    pub const fn from_u64(value: u64) -> Self {
        let (high, low) = unpack_u32_pair(value);
        Self { high, low }
    }

    /// Returns the high half as a flag, if it is a known one.
    pub fn ack_flag(self) -> Option<StatusFlag> {
        StatusFlag::from_code(self.high)
    }

    /// Returns the low half as a flag, if it is a known one.
    pub fn stream_flag(self) -> Option<StatusFlag> {
        StatusFlag::from_code(self.low)
    }
}

impl From<u64> for StatusValue {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<StatusValue> for u64 {
    fn from(value: StatusValue) -> Self {
        value.to_u64()
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.high, self.low)
    }
}

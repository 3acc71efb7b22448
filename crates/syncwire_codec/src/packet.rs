//! Opaque packets and 64-bit type identifiers.

use crate::error::{CodecError, CodecResult};
use crate::{Decode, Encode};
use bytes::Bytes;

/// Packs two 32-bit halves into one 64-bit value, `high` in the upper bits.
#[inline]
pub const fn pack_u32_pair(high: u32, low: u32) -> u64 {
    ((high as u64) << 32) | (low as u64)
}

/// Splits a 64-bit value into its `(high, low)` 32-bit halves.
#[inline]
pub const fn unpack_u32_pair(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, (value & 0xFFFF_FFFF) as u32)
}

/// Identifies a packet kind as a `(category, subtype)` pair.
///
/// On the wire the pair travels as a single `u64` built with [`pack_u32_pair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketType {
    /// Broad packet family (control packets, application payloads, ...).
    pub category: u32,
    /// Kind within the category.
    pub subtype: u32,
}

impl PacketType {
    /// Creates a packet type.
    pub const fn new(category: u32, subtype: u32) -> Self {
        Self { category, subtype }
    }

    /// Returns the packed 64-bit identifier.
    pub const fn to_u64(self) -> u64 {
        pack_u32_pair(self.category, self.subtype)
    }

    /// Rebuilds a packet type from its packed identifier.
    pub const fn from_u64(value: u64) -> Self {
        let (category, subtype) = unpack_u32_pair(value);
        Self { category, subtype }
    }
}

impl From<PacketType> for u64 {
    fn from(value: PacketType) -> Self {
        value.to_u64()
    }
}

/// Implemented by types that travel inside a [`Packet`] with a fixed type id.
pub trait Typed {
    /// The type identifier stamped on packets carrying this value.
    const PACKET_TYPE: PacketType;
}

/// An opaque payload tagged with a 64-bit type identifier.
///
/// The engine never looks inside the payload of anything but control
/// packets; everything else is produced and consumed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    packet_type: u64,
    data: Bytes,
}

impl Packet {
    /// Creates a packet from a type and raw bytes.
    pub fn new(packet_type: PacketType, data: impl Into<Bytes>) -> Self {
        Self {
            packet_type: packet_type.to_u64(),
            data: data.into(),
        }
    }

    /// Creates a packet from an already packed type identifier.
    pub fn with_raw_type(packet_type: u64, data: impl Into<Bytes>) -> Self {
        Self {
            packet_type,
            data: data.into(),
        }
    }

    /// Encodes `value` and wraps it with its type identifier.
    pub fn from_encodable<T: Encode + Typed>(value: &T) -> CodecResult<Self> {
        Ok(Self::new(T::PACKET_TYPE, value.encode()?))
    }

    /// Decodes the payload as `T`, checking the type identifier first.
    pub fn decode_as<T: Decode + Typed>(&self) -> CodecResult<T> {
        let expected = T::PACKET_TYPE.to_u64();
        if self.packet_type != expected {
            return Err(CodecError::UnexpectedPacketType {
                expected,
                actual: self.packet_type,
            });
        }
        T::decode(&self.data)
    }

    /// Returns the packed type identifier.
    pub fn raw_type(&self) -> u64 {
        self.packet_type
    }

    /// Returns the unpacked type identifier.
    pub fn packet_type(&self) -> PacketType {
        PacketType::from_u64(self.packet_type)
    }

    /// Returns `true` if this packet carries values of type `T`.
    pub fn is<T: Typed>(&self) -> bool {
        self.packet_type == T::PACKET_TYPE.to_u64()
    }

    /// Returns the payload bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the packet and returns the payload.
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

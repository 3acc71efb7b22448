//! # Syncwire Codec
//!
//! Packet envelope and binary codec primitives for syncwire.
//!
//! This crate provides:
//! - [`Packet`], an opaque payload tagged with a 64-bit type identifier
//! - [`pack_u32_pair`] / [`unpack_u32_pair`] for building wide values from two halves
//! - [`Encode`] / [`Decode`] traits implemented by every fixed-layout frame
//!
//! ## Usage
//!
//! ```
//! use syncwire_codec::{pack_u32_pair, unpack_u32_pair, Packet, PacketType};
//!
//! let id = pack_u32_pair(10, 0);
//! assert_eq!(unpack_u32_pair(id), (10, 0));
//!
//! let packet = Packet::new(PacketType::new(20, 1), vec![1u8, 2, 3]);
//! assert_eq!(packet.packet_type().category, 20);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod packet;

pub use error::{CodecError, CodecResult};
pub use packet::{pack_u32_pair, unpack_u32_pair, Packet, PacketType, Typed};

/// Trait for types that can be encoded to bytes.
pub trait Encode {
    /// Encode this value to bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from bytes.
pub trait Decode: Sized {
    /// Decode this value from bytes.
    ///
    /// Implementations must not produce a partially populated value on failure.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

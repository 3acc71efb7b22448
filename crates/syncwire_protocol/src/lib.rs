//! # Syncwire Protocol
//!
//! Control packet layout and protocol vocabulary for syncwire.
//!
//! This crate provides:
//! - [`StatePacket`], the fixed 12-byte control packet
//! - [`MessageCode`] for every phase of the handshake
//! - [`StatusFlag`] / [`StatusValue`] for the packed 64-bit status field
//! - [`Flow`] and [`Role`] for synchronization direction
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod flow;
mod messages;
mod state_packet;
mod status;

pub use flow::{Flow, InvalidFlowCode, Role};
pub use messages::MessageCode;
pub use state_packet::{StatePacket, STATE_PACKET_SIZE, STATE_PACKET_TYPE};
pub use status::{StatusFlag, StatusValue};

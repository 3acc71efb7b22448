//! # Syncwire Engine
//!
//! State machine runtime and handshake graph for the syncwire protocol.
//!
//! This crate provides:
//! - [`StateMachine`], the driver executing transitions until a terminal state
//! - [`RuntimeContext`], the immutable context threaded through every step
//! - [`StateId`], the protocol state graph as a lookup table
//! - [`HostHandler`] and [`Transport`], the two collaborators supplied by the caller
//! - [`InMemoryTransport`] and [`InspectedTransport`] for in-process use
//!
//! ## Architecture
//!
//! Two participants each run their own machine over a shared transport:
//! 1. The initiator runs with a known [`Flow`](syncwire_protocol::Flow) and
//!    announces it in the start-flow packet
//! 2. The responder runs with `Flow::Unknown` and adopts the announced flow
//! 3. Both sides walk the same table: object request/notify, negotiation,
//!    then the data stream, until they reach [`StateId::Final`]
//!
//! ## Key Invariants
//!
//! - A run is single-threaded, half-duplex and single-shot
//! - The adopted flow never changes for the rest of a run
//! - Every control packet sent or received goes through the host handler once
//!   (action-response excepted)
//! - The first error aborts the run; nothing is retried

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod handler;
mod machine;
mod operations;
mod runtime;
mod states;
mod transport;

pub use config::{EngineConfig, DEFAULT_MAX_DATA_STREAM_PACKETS};
pub use error::{SyncError, SyncResult};
pub use handler::{handler_fn, FnHandler, HandlerContext, HandlerReturn, HostHandler};
pub use machine::StateMachine;
pub use runtime::{RuntimeContext, Transition};
pub use states::{StateFn, StateId};
pub use transport::{
    InMemoryStream, InMemoryTransport, InspectedTransport, PacketInspector, Transport,
};

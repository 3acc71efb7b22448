//! Host handler and transport doubles.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use syncwire_codec::{Packet, PacketType};
use syncwire_engine::{
    HandlerContext, HandlerReturn, HostHandler, StateId, SyncError, SyncResult, Transport,
};
use syncwire_protocol::{MessageCode, Role, StatePacket, StatusValue};

/// Type identifier of the object packets streamed by [`RecordingHandler`].
pub const OBJECT_PACKET_TYPE: PacketType = PacketType::new(20, 0);

/// One call into a [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerCall {
    /// Context the engine passed.
    pub context: HandlerContext,
    /// Control packet the engine passed.
    pub packet: StatePacket,
    /// Number of payload packets that came with it.
    pub payload: usize,
}

/// A host handler that acknowledges everything and records every call.
///
/// As publisher it streams its configured chunks, one object packet per
/// exchange-data-stream packet. As subscriber it keeps every payload packet
/// it receives.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    chunks: Vec<Vec<u8>>,
    reject: Option<(MessageCode, u16)>,
    calls: Mutex<Vec<HandlerCall>>,
    received: Mutex<Vec<Packet>>,
}

impl RecordingHandler {
    /// Creates a handler that publishes an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler that publishes `chunks`.
    pub fn with_stream(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    /// Rejects every call carrying `message` with `error_code`.
    pub fn rejecting(mut self, message: MessageCode, error_code: u16) -> Self {
        self.reject = Some((message, error_code));
        self
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().clone()
    }

    /// Returns the states that called the handler, in order.
    pub fn states(&self) -> Vec<StateId> {
        self.calls.lock().iter().map(|c| c.context.state()).collect()
    }

    /// Returns true if any call carried `message`.
    pub fn saw(&self, message: MessageCode) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|c| c.packet.message() == Some(message))
    }

    /// Returns the payload packets received so far.
    pub fn received(&self) -> Vec<Packet> {
        self.received.lock().clone()
    }

    fn next_chunk(&self, index: usize) -> HandlerReturn {
        let remaining = self.chunks.len().saturating_sub(index + 1);
        let status = if remaining > 0 {
            StatusValue::active_stream()
        } else {
            StatusValue::completed_stream()
        };
        let packets = self
            .chunks
            .get(index)
            .map(|chunk| vec![Packet::new(OBJECT_PACKET_TYPE, chunk.clone())])
            .unwrap_or_default();
        HandlerReturn::new(status).with_packets(packets)
    }
}

impl HostHandler for RecordingHandler {
    fn handle(
        &self,
        context: &HandlerContext,
        packet: &StatePacket,
        packets: Vec<Packet>,
    ) -> SyncResult<HandlerReturn> {
        let published = {
            let mut calls = self.calls.lock();
            let published = calls
                .iter()
                .filter(|c| {
                    c.context.state() == StateId::PublisherDataStream
                        && c.packet.message() == Some(MessageCode::ExchangeDataStream)
                })
                .count();
            calls.push(HandlerCall {
                context: *context,
                packet: *packet,
                payload: packets.len(),
            });
            published
        };
        self.received.lock().extend(packets);

        if let Some((message, error_code)) = self.reject {
            if packet.message() == Some(message) {
                return Ok(HandlerReturn::rejected(error_code));
            }
        }

        match (packet.message(), context.role()) {
            (Some(MessageCode::ExchangeDataStream), Some(Role::Publisher)) => {
                Ok(self.next_chunk(published))
            }
            _ => Ok(HandlerReturn::acknowledged()),
        }
    }
}

/// A transport that replays pre-loaded batches and records what is sent.
///
/// `receive` fails with [`SyncError::Disconnected`] once the script is
/// exhausted, so a run that reads too far ends instead of blocking.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    incoming: Mutex<VecDeque<Vec<Packet>>>,
    sent: Mutex<Vec<Vec<Packet>>>,
    receive_calls: AtomicUsize,
}

impl ScriptedTransport {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a batch holding only `packet`.
    pub fn push_control(&self, packet: StatePacket) {
        self.push_batch(vec![packet.to_packet()]);
    }

    /// Queues `packet` followed by `payload`.
    pub fn push_control_with(&self, packet: StatePacket, payload: Vec<Packet>) {
        let mut batch = vec![packet.to_packet()];
        batch.extend(payload);
        self.push_batch(batch);
    }

    /// Queues a raw batch.
    pub fn push_batch(&self, batch: Vec<Packet>) {
        self.incoming.lock().push_back(batch);
    }

    /// Returns how many times `receive` was called.
    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    /// Returns every batch transmitted so far.
    pub fn sent(&self) -> Vec<Vec<Packet>> {
        self.sent.lock().clone()
    }

    /// Returns the control packets transmitted so far.
    pub fn sent_control_packets(&self) -> SyncResult<Vec<StatePacket>> {
        self.sent
            .lock()
            .iter()
            .map(|batch| {
                let head = batch.first().ok_or(SyncError::EmptyBatch)?;
                Ok(StatePacket::from_packet(head)?)
            })
            .collect()
    }

    /// Returns the number of batches not yet received.
    pub fn pending(&self) -> usize {
        self.incoming.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn transmit(&self, packets: Vec<Packet>) -> SyncResult<()> {
        self.sent.lock().push(packets);
        Ok(())
    }

    fn receive(&self) -> SyncResult<Vec<Packet>> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        self.incoming
            .lock()
            .pop_front()
            .ok_or(SyncError::Disconnected)
    }
}

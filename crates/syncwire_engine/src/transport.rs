//! Transport contract and in-process implementations.

use crate::error::{SyncError, SyncResult};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use syncwire_codec::Packet;

/// Moves packet batches between the two participants.
///
/// A batch is one control packet optionally followed by payload packets.
/// Implementations must deliver batches in order, exactly once, and as a
/// unit. `receive` may block until the peer transmits.
pub trait Transport: Send + Sync {
    /// Sends a batch as a single ordered unit.
    fn transmit(&self, packets: Vec<Packet>) -> SyncResult<()>;

    /// Blocks until the next batch from the peer is available.
    fn receive(&self) -> SyncResult<Vec<Packet>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn transmit(&self, packets: Vec<Packet>) -> SyncResult<()> {
        (**self).transmit(packets)
    }

    fn receive(&self) -> SyncResult<Vec<Packet>> {
        (**self).receive()
    }
}

#[derive(Debug, Default)]
struct StreamState {
    batches: VecDeque<Vec<Packet>>,
    closed: bool,
}

/// A one-way, blocking, in-memory queue of packet batches.
#[derive(Debug, Default)]
pub struct InMemoryStream {
    state: Mutex<StreamState>,
    ready: Condvar,
    timeout: Option<Duration>,
}

impl InMemoryStream {
    /// Creates a stream whose reads block without limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream whose reads fail with [`SyncError::Timeout`] after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Appends a batch and wakes a waiting reader.
    pub fn push(&self, packets: Vec<Packet>) -> SyncResult<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(SyncError::Disconnected);
        }
        state.batches.push_back(packets);
        self.ready.notify_one();
        Ok(())
    }

    /// Takes the oldest batch, waiting for one if the queue is empty.
    ///
    /// Batches queued before [`close`](Self::close) are still delivered.
    pub fn pop(&self) -> SyncResult<Vec<Packet>> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();
        let mut timed_out = false;
        loop {
            if let Some(batch) = state.batches.pop_front() {
                return Ok(batch);
            }
            if state.closed {
                return Err(SyncError::Disconnected);
            }
            if timed_out {
                return Err(SyncError::Timeout);
            }
            match deadline {
                Some(deadline) => {
                    timed_out = self.ready.wait_until(&mut state, deadline).timed_out();
                }
                None => self.ready.wait(&mut state),
            }
        }
    }

    /// Marks the stream closed and wakes all readers.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Returns the number of queued batches.
    pub fn len(&self) -> usize {
        self.state.lock().batches.len()
    }

    /// Returns true if no batch is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One end of an in-memory duplex channel.
///
/// Dropping an endpoint closes both directions so a peer blocked in
/// `receive` sees [`SyncError::Disconnected`] instead of hanging.
#[derive(Debug)]
pub struct InMemoryTransport {
    outbound: Arc<InMemoryStream>,
    inbound: Arc<InMemoryStream>,
}

impl InMemoryTransport {
    /// Creates two connected endpoints.
    pub fn pair() -> (Self, Self) {
        Self::connect(InMemoryStream::new(), InMemoryStream::new())
    }

    /// Creates two connected endpoints whose reads time out.
    pub fn pair_with_timeout(timeout: Duration) -> (Self, Self) {
        Self::connect(
            InMemoryStream::with_timeout(timeout),
            InMemoryStream::with_timeout(timeout),
        )
    }

    fn connect(a_to_b: InMemoryStream, b_to_a: InMemoryStream) -> (Self, Self) {
        let a_to_b = Arc::new(a_to_b);
        let b_to_a = Arc::new(b_to_a);
        let a = Self {
            outbound: Arc::clone(&a_to_b),
            inbound: Arc::clone(&b_to_a),
        };
        let b = Self {
            outbound: b_to_a,
            inbound: a_to_b,
        };
        (a, b)
    }

    /// Closes both directions.
    pub fn close(&self) {
        self.outbound.close();
        self.inbound.close();
    }
}

impl Transport for InMemoryTransport {
    fn transmit(&self, packets: Vec<Packet>) -> SyncResult<()> {
        self.outbound.push(packets)
    }

    fn receive(&self) -> SyncResult<Vec<Packet>> {
        self.inbound.pop()
    }
}

impl Drop for InMemoryTransport {
    fn drop(&mut self) {
        self.close();
    }
}

type PacketCallback = Box<dyn Fn(&Packet) + Send + Sync>;

/// Callbacks fired for every packet crossing an [`InspectedTransport`].
pub struct PacketInspector {
    on_sent: PacketCallback,
    on_received: PacketCallback,
}

impl PacketInspector {
    /// Creates an inspector from two callbacks.
    pub fn new<S, R>(on_sent: S, on_received: R) -> Self
    where
        S: Fn(&Packet) + Send + Sync + 'static,
        R: Fn(&Packet) + Send + Sync + 'static,
    {
        Self {
            on_sent: Box::new(on_sent),
            on_received: Box::new(on_received),
        }
    }
}

/// Wraps a transport and reports every packet to a [`PacketInspector`].
pub struct InspectedTransport<T> {
    inner: T,
    inspector: PacketInspector,
}

impl<T: Transport> InspectedTransport<T> {
    /// Wraps `inner`.
    pub fn new(inner: T, inspector: PacketInspector) -> Self {
        Self { inner, inspector }
    }

    /// Returns the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for InspectedTransport<T> {
    fn transmit(&self, packets: Vec<Packet>) -> SyncResult<()> {
        packets.iter().for_each(|p| (self.inspector.on_sent)(p));
        self.inner.transmit(packets)
    }

    fn receive(&self) -> SyncResult<Vec<Packet>> {
        let packets = self.inner.receive()?;
        packets.iter().for_each(|p| (self.inspector.on_received)(p));
        Ok(packets)
    }
}

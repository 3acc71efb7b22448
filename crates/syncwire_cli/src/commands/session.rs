//! Session command implementation.

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use syncwire_codec::{Packet, PacketType};
use syncwire_engine::{
    EngineConfig, HandlerContext, HandlerReturn, HostHandler, InMemoryTransport, StateMachine,
    SyncResult,
};
use syncwire_protocol::{Flow, MessageCode, Role, StatePacket, StatusValue};
use tracing::{debug, info, warn};

/// Packet type of the demo objects.
const DEMO_OBJECT_TYPE: PacketType = PacketType::new(20, 0);

/// Read timeout of the loopback transport.
const LOOPBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Options of the session command.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Flow announced by the initiator.
    pub flow: Flow,
    /// Number of object packets the publisher streams.
    pub chunks: usize,
    /// Size of each object packet.
    pub chunk_size: usize,
    /// Optional bound on exchange-data-stream packets.
    pub max_stream_packets: Option<u32>,
    /// Error code the publisher answers negotiation with.
    pub reject: Option<u16>,
}

#[derive(Debug, Default)]
struct Tally {
    calls: usize,
    streamed: usize,
    received_packets: usize,
    received_bytes: usize,
}

/// Host handler used by both participants.
///
/// Publishes `chunks` synthetic objects when it plays the publisher, counts
/// what it receives when it plays the subscriber.
struct DemoHandler {
    name: &'static str,
    chunks: usize,
    chunk_size: usize,
    reject: Option<u16>,
    tally: Mutex<Tally>,
}

impl DemoHandler {
    fn new(name: &'static str, options: &SessionOptions) -> Self {
        Self {
            name,
            chunks: options.chunks,
            chunk_size: options.chunk_size,
            reject: options.reject,
            tally: Mutex::new(Tally::default()),
        }
    }

    fn next_object(&self, tally: &mut Tally) -> HandlerReturn {
        let index = tally.streamed;
        tally.streamed += 1;
        if index >= self.chunks {
            return HandlerReturn::new(StatusValue::completed_stream());
        }
        let status = if index + 1 < self.chunks {
            StatusValue::active_stream()
        } else {
            StatusValue::completed_stream()
        };
        let data: Vec<u8> = (0..self.chunk_size).map(|i| (index + i) as u8).collect();
        HandlerReturn::new(status).with_packets(vec![Packet::new(DEMO_OBJECT_TYPE, data)])
    }
}

impl HostHandler for DemoHandler {
    fn handle(
        &self,
        context: &HandlerContext,
        packet: &StatePacket,
        packets: Vec<Packet>,
    ) -> SyncResult<HandlerReturn> {
        let mut tally = self.tally.lock();
        tally.calls += 1;
        tally.received_packets += packets.len();
        tally.received_bytes += packets.iter().map(Packet::len).sum::<usize>();

        debug!(
            participant = self.name,
            state = %context.state(),
            message_code = packet.message_code,
            payload = packets.len(),
            "host handler called"
        );

        let message = packet.message();
        if let (Some(code), Some(MessageCode::RespondNegotiationRequest)) = (self.reject, message)
        {
            warn!(participant = self.name, error_code = code, "rejecting negotiation");
            return Ok(HandlerReturn::rejected(code));
        }
        match (message, context.role()) {
            (Some(MessageCode::ExchangeDataStream), Some(Role::Publisher)) => {
                Ok(self.next_object(&mut tally))
            }
            _ => Ok(HandlerReturn::acknowledged()),
        }
    }
}

/// Runs the session command.
pub fn run(options: &SessionOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = EngineConfig::default();
    if let Some(limit) = options.max_stream_packets {
        config = config.with_max_data_stream_packets(limit);
    }
    config.validate()?;

    let initiator = DemoHandler::new("initiator", options);
    let responder = DemoHandler::new("responder", options);
    let (left, right) = InMemoryTransport::pair_with_timeout(LOOPBACK_TIMEOUT);

    info!(flow = %options.flow, chunks = options.chunks, "starting loopback session");
    let started = Instant::now();
    let (initiator_result, responder_result) = thread::scope(|scope| {
        let responder_config = config.clone();
        let responder_run = scope.spawn(|| {
            let result = StateMachine::new(&responder, &right)
                .with_config(responder_config)
                .run(Flow::Unknown);
            right.close();
            result
        });
        let initiator_result = StateMachine::new(&initiator, &left)
            .with_config(config)
            .run(options.flow);
        left.close();
        let responder_result = responder_run.join();
        (initiator_result, responder_result)
    });
    let elapsed = started.elapsed();

    let responder_result = responder_result.map_err(|_| "responder thread panicked")?;
    report("initiator", &initiator, &initiator_result);
    report("responder", &responder, &responder_result);
    println!("Elapsed: {elapsed:?}");

    initiator_result?;
    responder_result?;
    Ok(())
}

fn report(name: &str, handler: &DemoHandler, result: &SyncResult<()>) {
    let tally = handler.tally.lock();
    match result {
        Ok(()) => println!("{name}: completed"),
        Err(err) => println!("{name}: failed: {err}"),
    }
    println!("  handler calls:     {}", tally.calls);
    println!("  objects published: {}", tally.streamed.min(handler.chunks));
    println!(
        "  objects received:  {} ({} bytes)",
        tally.received_packets, tally.received_bytes
    );
}

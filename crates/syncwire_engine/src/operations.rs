//! Send and receive steps shared by every state.

use crate::error::{SyncError, SyncResult};
use crate::runtime::RuntimeContext;
use syncwire_codec::Packet;
use syncwire_protocol::{MessageCode, StatePacket, StatusValue};
use tracing::{debug, trace, warn};

/// Builds a control packet, lets the host handler complete it, and transmits it
/// with the handler's payload packets.
///
/// Returns the packet as sent. A non-zero error code set by the handler is
/// still transmitted so the peer learns about the rejection, then the local
/// run aborts.
pub(crate) fn send_state_packet(
    context: &RuntimeContext<'_>,
    message: MessageCode,
) -> SyncResult<StatePacket> {
    let mut packet = match message {
        MessageCode::StartFlow => StatePacket::start_flow(context.flow()),
        MessageCode::ActionResponse => StatePacket::action_response(),
        _ => StatePacket::new(message, StatusValue::UNKNOWN),
    };
    let mut payload = Vec::new();

    if message != MessageCode::ActionResponse {
        let handled = context
            .handler()
            .handle(&context.handler_context(), &packet, Vec::new())?;
        if handled.retry {
            trace!(message = %message, "host handler requested retry, ignored");
        }
        // The flow announced by start-flow belongs to the engine.
        if message != MessageCode::StartFlow {
            packet = packet.with_status(handled.status);
        }
        packet = packet.with_error_code(handled.error_code);
        payload = handled.packets;
    }

    debug!(
        state = %context.current_state(),
        message = %message,
        status = %packet.status(),
        error_code = packet.error_code,
        payload = payload.len(),
        "sending control packet"
    );

    let mut batch = Vec::with_capacity(payload.len() + 1);
    batch.push(packet.to_packet());
    batch.extend(payload);
    context.transport().transmit(batch)?;

    if packet.has_error() {
        warn!(
            state = %context.current_state(),
            message = %message,
            error_code = packet.error_code,
            "host handler rejected outgoing packet"
        );
        return Err(SyncError::HandlerRejected {
            message_code: message.code(),
            error_code: packet.error_code,
        });
    }
    Ok(packet)
}

/// Receives the next batch and validates its control packet against `expected`.
///
/// Returns the control packet as received together with the payload packets
/// that followed it. The host handler is not called.
pub(crate) fn receive_state_packet(
    context: &RuntimeContext<'_>,
    expected: MessageCode,
) -> SyncResult<(StatePacket, Vec<Packet>)> {
    let mut batch = context.transport().receive()?.into_iter();
    let head = batch.next().ok_or(SyncError::EmptyBatch)?;
    let packet = StatePacket::from_packet(&head)?;
    let payload: Vec<Packet> = batch.collect();

    debug!(
        state = %context.current_state(),
        message_code = packet.message_code,
        status = %packet.status(),
        error_code = packet.error_code,
        payload = payload.len(),
        "received control packet"
    );

    if packet.has_error() {
        warn!(
            state = %context.current_state(),
            message_code = packet.message_code,
            error_code = packet.error_code,
            "remote rejected"
        );
        return Err(SyncError::RemoteRejected {
            message_code: packet.message_code,
            error_code: packet.error_code,
        });
    }
    if packet.message_code != expected.code() {
        return Err(SyncError::UnexpectedMessage {
            expected: expected.code(),
            received: packet.message_code,
        });
    }
    Ok((packet, payload))
}

/// Passes a received control packet and its payload to the host handler.
///
/// Action-response packets skip the handler.
pub(crate) fn handle_received(
    context: &RuntimeContext<'_>,
    packet: &StatePacket,
    payload: Vec<Packet>,
) -> SyncResult<()> {
    if packet.message_code == MessageCode::ActionResponse.code() {
        return Ok(());
    }
    let handled = context
        .handler()
        .handle(&context.handler_context(), packet, payload)?;
    if handled.retry {
        trace!(message_code = packet.message_code, "host handler requested retry, ignored");
    }
    if !handled.packets.is_empty() {
        trace!(
            dropped = handled.packets.len(),
            "host handler returned packets for a received message"
        );
    }
    if handled.error_code != 0 {
        warn!(
            state = %context.current_state(),
            message_code = packet.message_code,
            error_code = handled.error_code,
            "host handler rejected incoming packet"
        );
        return Err(SyncError::HandlerRejected {
            message_code: packet.message_code,
            error_code: handled.error_code,
        });
    }
    Ok(())
}

/// Receives, validates and handles the next control packet.
pub(crate) fn receive_and_handle(
    context: &RuntimeContext<'_>,
    expected: MessageCode,
) -> SyncResult<StatePacket> {
    let (packet, payload) = receive_state_packet(context, expected)?;
    handle_received(context, &packet, payload)?;
    Ok(packet)
}

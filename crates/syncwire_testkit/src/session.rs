//! Two-participant session harness.
//!
//! Runs an initiator and a responder against each other over an in-memory
//! transport pair, each on its own thread, and reports both outcomes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use syncwire_engine::{
    EngineConfig, HostHandler, InMemoryTransport, InspectedTransport, PacketInspector,
    StateMachine, SyncError, SyncResult,
};
use syncwire_protocol::Flow;

/// Read timeout applied to both endpoints of a session.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a [`run_session`] call.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Result of the initiator's run.
    pub initiator: SyncResult<()>,
    /// Result of the responder's run.
    pub responder: SyncResult<()>,
    /// Packets sent by the initiator, control and payload.
    pub initiator_sent: usize,
    /// Packets sent by the responder, control and payload.
    pub responder_sent: usize,
}

impl SessionOutcome {
    /// Returns true if both runs finished without error.
    pub fn is_ok(&self) -> bool {
        self.initiator.is_ok() && self.responder.is_ok()
    }
}

/// Runs one session with the default engine configuration.
pub fn run_session(
    flow: Flow,
    initiator: &dyn HostHandler,
    responder: &dyn HostHandler,
) -> SessionOutcome {
    run_session_with(flow, EngineConfig::default(), initiator, responder)
}

/// Runs one session with `config` applied to both participants.
///
/// The initiator announces `flow`; the responder starts with
/// [`Flow::Unknown`] and adopts it.
pub fn run_session_with(
    flow: Flow,
    config: EngineConfig,
    initiator: &dyn HostHandler,
    responder: &dyn HostHandler,
) -> SessionOutcome {
    let (left, right) = InMemoryTransport::pair_with_timeout(SESSION_TIMEOUT);
    let initiator_sent = Arc::new(AtomicUsize::new(0));
    let responder_sent = Arc::new(AtomicUsize::new(0));
    let left = counted(left, Arc::clone(&initiator_sent));
    let right = counted(right, Arc::clone(&responder_sent));

    let (initiator_result, responder_result) = thread::scope(|scope| {
        let responder_config = config.clone();
        let responder_thread = scope.spawn(move || {
            let result = StateMachine::new(responder, &right)
                .with_config(responder_config)
                .run(Flow::Unknown);
            right.inner().close();
            result
        });
        let initiator_result = StateMachine::new(initiator, &left)
            .with_config(config)
            .run(flow);
        left.inner().close();
        let responder_result = responder_thread
            .join()
            .unwrap_or_else(|_| Err(SyncError::handler("responder thread panicked")));
        (initiator_result, responder_result)
    });

    SessionOutcome {
        initiator: initiator_result,
        responder: responder_result,
        initiator_sent: initiator_sent.load(Ordering::SeqCst),
        responder_sent: responder_sent.load(Ordering::SeqCst),
    }
}

fn counted(
    transport: InMemoryTransport,
    sent: Arc<AtomicUsize>,
) -> InspectedTransport<InMemoryTransport> {
    InspectedTransport::new(
        transport,
        PacketInspector::new(
            move |_| {
                sent.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::RecordingHandler;
    use syncwire_protocol::MessageCode;

    #[test]
    fn pull_session_completes() {
        let initiator = RecordingHandler::new();
        let responder = RecordingHandler::with_stream(vec![b"a".to_vec(), b"b".to_vec()]);

        let outcome = run_session(Flow::Pull, &initiator, &responder);
        assert!(outcome.is_ok(), "{outcome:?}");
        assert_eq!(initiator.received().len(), 2);
        assert!(responder.saw(MessageCode::StartFlow));
    }

    #[test]
    fn rejected_session_reports_both_sides() {
        let initiator = RecordingHandler::new();
        let responder =
            RecordingHandler::new().rejecting(MessageCode::RespondNegotiationRequest, 3);

        let outcome = run_session(Flow::Pull, &initiator, &responder);
        assert!(matches!(
            outcome.initiator,
            Err(SyncError::RemoteRejected { error_code: 3, .. })
        ));
        assert!(matches!(
            outcome.responder,
            Err(SyncError::HandlerRejected { error_code: 3, .. })
        ));
    }
}

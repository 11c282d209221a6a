
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::Level;

use parley_client::{
    SessionDriver, SessionEvent, SessionHandle, SessionNegotiator, SessionState, TransportEvent,
};
use parley_core::SignalMessage;

use crate::utils::{MockDevices, MockTransport};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A negotiator over scripted seams, plus the hooks tests assert with.
pub fn create_negotiator() -> (
    SessionNegotiator,
    MockTransport,
    MockDevices,
    UnboundedReceiver<SignalMessage>,
) {
    create_negotiator_with(MockDevices::new())
}

pub fn create_negotiator_with(
    devices: MockDevices,
) -> (
    SessionNegotiator,
    MockTransport,
    MockDevices,
    UnboundedReceiver<SignalMessage>,
) {
    let transport = MockTransport::new();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let negotiator = SessionNegotiator::new(
        Box::new(transport.clone()),
        Box::new(devices.clone()),
        outbound_tx,
    );

    (negotiator, transport, devices, outbound_rx)
}

/// A fully driven session over scripted seams.
pub struct TestSession {
    pub handle: SessionHandle,
    pub events: UnboundedReceiver<SessionEvent>,
    pub transport: MockTransport,
    pub devices: MockDevices,
    pub inbound_tx: mpsc::UnboundedSender<SignalMessage>,
    pub transport_tx: mpsc::Sender<TransportEvent>,
    pub outbound_rx: UnboundedReceiver<SignalMessage>,
}

pub fn spawn_session() -> TestSession {
    let transport = MockTransport::new();
    let devices = MockDevices::new();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (transport_tx, transport_rx) = mpsc::channel(64);

    let negotiator = SessionNegotiator::new(
        Box::new(transport.clone()),
        Box::new(devices.clone()),
        outbound_tx,
    );
    let (driver, handle, events) = SessionDriver::new(negotiator, inbound_rx, transport_rx);

    tokio::spawn(driver.run());

    TestSession {
        handle,
        events,
        transport,
        devices,
        inbound_tx,
        transport_tx,
        outbound_rx,
    }
}

/// Wait for the next UI event, failing after a timeout.
pub async fn next_event(events: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_millis(2000), events.recv())
        .await
        .expect("Timed out waiting for session event")
        .expect("Event stream closed")
}

/// Poll the handle until it reports `state` or the timeout elapses.
pub async fn wait_for_state(handle: &SessionHandle, state: SessionState) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(2000);
    loop {
        if handle.state() == state {
            return true;
        }
        if tokio::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub fn drain_outbound(rx: &mut UnboundedReceiver<SignalMessage>) -> Vec<SignalMessage> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

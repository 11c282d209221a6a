use parley_client::{SessionEvent, SessionState, TransportEvent, TransportState};

use crate::integration::{init_tracing, next_event, spawn_session, wait_for_state};

#[tokio::test]
async fn test_transport_failure_reported() {
    init_tracing();

    let mut session = spawn_session();

    session
        .transport_tx
        .send(TransportEvent::StateChanged(TransportState::Failed))
        .await
        .expect("Transport events should be open");

    assert!(
        wait_for_state(&session.handle, SessionState::Failed).await,
        "A transport failure surfaces as the failed state"
    );
    assert!(matches!(
        next_event(&mut session.events).await,
        SessionEvent::StateChanged(SessionState::Failed)
    ));

    // Failed is terminal and distinguishable from a clean close; nothing
    // reconnects behind the UI's back.
    session
        .transport_tx
        .send(TransportEvent::StateChanged(TransportState::Connected))
        .await
        .expect("Transport events should be open");
    assert!(!wait_for_state(&session.handle, SessionState::Connected).await);
    assert_eq!(session.handle.state(), SessionState::Failed);
}

use parley_client::{MediaConstraints, SessionState, TransportState};
use parley_core::{SessionDescription, SignalMessage};

use crate::integration::{create_negotiator, init_tracing};
use crate::utils::TransportCall;

#[tokio::test]
async fn test_end_session_idempotent() {
    init_tracing();

    let (mut negotiator, transport, _devices, _outbound_rx) = create_negotiator();

    let stream = negotiator
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("Media should be granted");
    negotiator.produce_offer().await.expect("Offer should be produced");

    negotiator.end_session().await;
    assert_eq!(negotiator.state(), SessionState::Closed);
    assert!(
        stream.tracks().all(|track| !track.is_live()),
        "Every local track is stopped on teardown"
    );
    assert_eq!(transport.count(|call| matches!(call, TransportCall::Close)), 1);

    // The second call performs no observable action.
    negotiator.end_session().await;
    assert_eq!(transport.count(|call| matches!(call, TransportCall::Close)), 1);
    assert_eq!(negotiator.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_late_results_cannot_resurrect_a_closed_session() {
    init_tracing();

    let (mut negotiator, transport, _devices, _outbound_rx) = create_negotiator();

    negotiator
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("Media should be granted");
    negotiator.produce_offer().await.expect("Offer should be produced");
    negotiator.end_session().await;

    // An answer resolving after teardown must not touch the transport.
    let answer = SessionDescription::answer("v=0 late-answer");
    negotiator
        .consume_remote_message(SignalMessage::Answer {
            data: serde_json::to_value(&answer).unwrap(),
        })
        .await
        .expect("Late messages are dropped, not errors");
    assert_eq!(
        transport.count(|call| matches!(call, TransportCall::SetRemote(_))),
        0
    );

    negotiator.apply_transport_state(TransportState::Connected);
    assert_eq!(negotiator.state(), SessionState::Closed);
}

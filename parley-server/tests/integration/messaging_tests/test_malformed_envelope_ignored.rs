use parley_core::{SessionDescription, SignalMessage};

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_malformed_envelope_ignored() {
    init_tracing();

    let (addr, _state) = spawn_relay().await;

    let mut peer1 = TestPeer::connect(addr, "abc")
        .await
        .expect("Failed to connect peer 1");
    peer1.recv().await.expect("Peer 1 room-joined");

    let mut peer2 = TestPeer::connect(addr, "abc")
        .await
        .expect("Failed to connect peer 2");
    peer2.recv().await.expect("Peer 2 room-joined");
    peer1.recv().await.expect("Peer 1 participant-joined");

    // Neither frame is forwardable, and neither may close the connection.
    peer1.send_raw("{not json").await.expect("Send failed");
    peer1
        .send_raw(r#"{"type":"hangup"}"#)
        .await
        .expect("Send failed");

    let desc = SessionDescription::offer("v=0\r\n");
    peer1
        .send(&SignalMessage::Offer {
            data: serde_json::to_value(&desc).expect("Description should serialize"),
        })
        .await
        .expect("Connection should still be open");

    let relayed = peer2.recv().await.expect("Valid offer should still arrive");
    assert!(
        matches!(relayed, SignalMessage::Offer { .. }),
        "Malformed frames must be skipped, not relayed: {relayed:?}"
    );
}

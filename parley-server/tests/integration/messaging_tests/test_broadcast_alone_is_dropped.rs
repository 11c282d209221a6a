use parley_core::{SessionDescription, SignalMessage};

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_broadcast_alone_is_dropped() {
    init_tracing();

    let (addr, state) = spawn_relay().await;

    let mut peer = TestPeer::connect(addr, "abc")
        .await
        .expect("Failed to connect");
    peer.recv().await.expect("No room-joined frame");

    // The sender may not yet know it is alone; the relay drops the frame
    // without an error and without closing anything.
    let desc = SessionDescription::offer("v=0\r\n");
    peer.send(&SignalMessage::Offer {
        data: serde_json::to_value(&desc).expect("Description should serialize"),
    })
    .await
    .expect("Send failed");

    peer.expect_silence(300)
        .await
        .expect("Nothing should come back");

    assert_eq!(state.registry.connection_count(), 1, "Connection must survive");
}

use parley_core::{SessionDescription, SignalMessage};

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_offer_relayed_to_other_peer() {
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

    let desc = SessionDescription::offer("v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\n");
    let offer = SignalMessage::Offer {
        data: serde_json::to_value(&desc).expect("Description should serialize"),
    };
    peer1.send(&offer).await.expect("Failed to send offer");

    let relayed = peer2.recv().await.expect("Offer not relayed");
    let SignalMessage::Offer { data } = relayed else {
        panic!("Expected offer, got {relayed:?}");
    };
    let relayed_desc: SessionDescription =
        serde_json::from_value(data).expect("Payload should parse");
    assert_eq!(relayed_desc.sdp, desc.sdp, "Payload must pass through untouched");

    peer1
        .expect_silence(300)
        .await
        .expect("Offer must not echo back to its sender");
}

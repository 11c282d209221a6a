use parley_core::SignalMessage;

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_join_receives_room_joined() {
    init_tracing();

    let (addr, state) = spawn_relay().await;

    let mut peer = TestPeer::connect(addr, "abc")
        .await
        .expect("Failed to connect");

    let msg = peer.recv().await.expect("No room-joined frame");
    match msg {
        SignalMessage::RoomJoined {
            room_id,
            participants,
        } => {
            assert_eq!(room_id.as_str(), "abc");
            assert_eq!(participants, 1);
        }
        other => panic!("Expected room-joined, got {other:?}"),
    }

    assert_eq!(state.registry.room_count(), 1);
    assert_eq!(state.registry.connection_count(), 1);

    peer.close().await.expect("Failed to close peer");
}

use parley_client::SessionState;

use crate::integration::{init_tracing, spawn_session, wait_for_state};
use crate::utils::TransportCall;

#[tokio::test]
async fn test_channel_close_ends_session() {
    init_tracing();

    let session = spawn_session();

    // The signaling channel going away ends the session; there is no
    // reconnection.
    drop(session.inbound_tx);

    assert!(
        wait_for_state(&session.handle, SessionState::Closed).await,
        "A dropped signaling channel must close the session"
    );
    assert_eq!(
        session
            .transport
            .count(|call| matches!(call, TransportCall::Close)),
        1
    );
}

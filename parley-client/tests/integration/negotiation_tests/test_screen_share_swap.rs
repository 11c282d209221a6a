use parley_client::{MediaConstraints, NegotiationError};

use crate::integration::{create_negotiator, drain_outbound, init_tracing};
use crate::utils::TransportCall;

#[tokio::test]
async fn test_screen_share_swaps_track_in_place() {
    init_tracing();

    let (mut negotiator, transport, _devices, mut outbound_rx) = create_negotiator();

    let stream = negotiator
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("Media should be granted");
    let camera_id = stream.video.as_ref().expect("Video track present").id().to_owned();
    drain_outbound(&mut outbound_rx);

    let _ended = negotiator
        .start_screen_share()
        .await
        .expect("Screen share should start");
    assert!(negotiator.is_screen_sharing());

    negotiator
        .stop_screen_share()
        .await
        .expect("Screen share should stop");
    assert!(!negotiator.is_screen_sharing());

    let replaces: Vec<_> = transport
        .calls()
        .into_iter()
        .filter(|call| matches!(call, TransportCall::ReplaceVideo { .. }))
        .collect();
    match &replaces[..] {
        [
            TransportCall::ReplaceVideo { display: true, .. },
            TransportCall::ReplaceVideo {
                display: false,
                track_id,
            },
        ] => {
            assert_eq!(track_id, &camera_id, "The camera track comes back");
        }
        other => panic!("Expected display swap then camera swap, got {other:?}"),
    }

    assert!(
        drain_outbound(&mut outbound_rx).is_empty(),
        "Track substitution must not trigger an offer/answer cycle"
    );
}

#[tokio::test]
async fn test_stop_without_share_is_a_noop() {
    init_tracing();

    let (mut negotiator, transport, _devices, _outbound_rx) = create_negotiator();

    negotiator
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("Media should be granted");

    negotiator
        .stop_screen_share()
        .await
        .expect("Stopping when not sharing is a no-op");
    assert_eq!(
        transport.count(|call| matches!(call, TransportCall::ReplaceVideo { .. })),
        0
    );
}

#[tokio::test]
async fn test_double_start_is_refused() {
    init_tracing();

    let (mut negotiator, _transport, _devices, _outbound_rx) = create_negotiator();

    negotiator
        .acquire_local_media(&MediaConstraints::default())
        .await
        .expect("Media should be granted");

    let _ended = negotiator
        .start_screen_share()
        .await
        .expect("First share should start");
    let second = negotiator.start_screen_share().await;
    assert!(matches!(second, Err(NegotiationError::AlreadySharing)));
}

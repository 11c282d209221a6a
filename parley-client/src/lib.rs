pub mod channel;
pub mod media;
pub mod negotiator;
pub mod transport;

pub use channel::SignalingChannel;
pub use media::{
    DisplayCapture, MediaConstraints, MediaDevices, MediaError, MediaStream, MediaTrack,
    TrackKind, VideoSource,
};
pub use negotiator::{
    NegotiationError, SessionCommand, SessionDriver, SessionEvent, SessionHandle,
    SessionNegotiator, SessionState,
};
pub use transport::{PeerTransport, RtcTransport, TransportEvent, TransportState};

use anyhow::Result;
use parley_core::{IceServerConfig, RoomId};
use tokio::sync::mpsc;

/// Wire up a complete session: signaling channel, native transport,
/// negotiator, and the driving loop (spawned). The UI talks through the
/// returned handle and event stream; dropping the handle ends the session.
pub async fn start_session(
    server_url: &str,
    room: &RoomId,
    ice_servers: Vec<IceServerConfig>,
    devices: Box<dyn MediaDevices>,
) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>)> {
    let (channel, inbound) = SignalingChannel::connect(server_url, room).await?;

    let (transport_tx, transport_rx) = mpsc::channel(256);
    let transport = RtcTransport::new(ice_servers, transport_tx).await?;

    let negotiator =
        SessionNegotiator::new(Box::new(transport), devices, channel.sender());
    let (driver, handle, events) = SessionDriver::new(negotiator, inbound, transport_rx);

    tokio::spawn(driver.run());

    Ok((handle, events))
}

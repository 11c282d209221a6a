mod peer_transport;
mod rtc;

pub use peer_transport::{PeerTransport, TransportEvent, TransportState};
pub use rtc::RtcTransport;

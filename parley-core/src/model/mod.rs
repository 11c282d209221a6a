mod peer;
mod room;
mod sdp;
mod signaling;

pub use peer::PeerId;
pub use room::RoomId;
pub use sdp::{CandidateInit, SdpType, SessionDescription};
pub use signaling::{IceServerConfig, SignalMessage};

pub mod model;

pub use model::{
    CandidateInit, IceServerConfig, PeerId, RoomId, SdpType, SessionDescription, SignalMessage,
};

use anyhow::Result;
use async_trait::async_trait;

use parley_core::{CandidateInit, SessionDescription};

use crate::media::{MediaTrack, TrackKind};

/// Connection states reported by the underlying peer transport, mirroring
/// the native peer-connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Everything a transport pushes back at the session: state changes, locally
/// gathered candidates, and remote track arrival.
#[derive(Debug)]
pub enum TransportEvent {
    StateChanged(TransportState),
    CandidateGathered(CandidateInit),
    RemoteTrackAdded(TrackKind),
}

/// One peer-to-peer media transport. Implementations push [`TransportEvent`]s
/// into the channel handed to them at construction, so the session machine
/// stays testable against a scripted implementation.
#[async_trait]
pub trait PeerTransport: Send {
    /// Attach a local track to the outgoing side.
    async fn add_track(&mut self, track: &MediaTrack) -> Result<()>;

    /// Create an offer and set it as the local description.
    async fn create_offer(&mut self) -> Result<SessionDescription>;

    /// Create an answer to the current remote offer and set it as the local
    /// description.
    async fn create_answer(&mut self) -> Result<SessionDescription>;

    async fn set_remote_description(&mut self, desc: SessionDescription) -> Result<()>;

    /// Add a remote candidate. Safe at any point: candidates arriving before
    /// descriptions settle are buffered below this seam, not dropped.
    async fn add_ice_candidate(&mut self, candidate: CandidateInit) -> Result<()>;

    /// Swap the outgoing video track in place on the established transport,
    /// avoiding a renegotiation round-trip.
    async fn replace_video_track(&mut self, track: &MediaTrack) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

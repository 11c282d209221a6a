use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use parley_core::{CandidateInit, SessionDescription, SignalMessage};

use crate::media::{MediaConstraints, MediaDevices, MediaError, MediaStream, MediaTrack, TrackKind};
use crate::negotiator::SessionState;
use crate::transport::{PeerTransport, TransportState};

/// A refused or failed negotiation step. The session state is left
/// consistent in every case.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("Local media has not been attached")]
    MediaNotAttached,

    #[error("An offer is already awaiting its answer")]
    OfferOutstanding,

    #[error("Screen sharing is already active")]
    AlreadySharing,

    #[error("Session already ended")]
    SessionEnded,

    #[error("Malformed signaling payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Transport failure: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Drives one peer-to-peer media session from offer to teardown.
///
/// The machine is deliberately free of any real transport: it talks to a
/// [`PeerTransport`] and a [`MediaDevices`] seam and emits outbound
/// [`SignalMessage`]s on a queue, so every transition is testable with
/// scripted implementations.
pub struct SessionNegotiator {
    transport: Box<dyn PeerTransport>,
    devices: Box<dyn MediaDevices>,
    outbound: mpsc::UnboundedSender<SignalMessage>,
    state: SessionState,
    local_media: Option<MediaStream>,
    screen_track: Option<MediaTrack>,
    remote_tracks: Vec<TrackKind>,
    offer_outstanding: bool,
}

impl SessionNegotiator {
    pub fn new(
        transport: Box<dyn PeerTransport>,
        devices: Box<dyn MediaDevices>,
        outbound: mpsc::UnboundedSender<SignalMessage>,
    ) -> Self {
        Self {
            transport,
            devices,
            outbound,
            state: SessionState::New,
            local_media: None,
            screen_track: None,
            remote_tracks: Vec::new(),
            offer_outstanding: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_media(&self) -> Option<&MediaStream> {
        self.local_media.as_ref()
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen_track.is_some()
    }

    pub fn remote_tracks(&self) -> &[TrackKind] {
        &self.remote_tracks
    }

    /// Request camera + microphone and attach the tracks to the transport.
    /// Acquisition failure is the caller's to handle; there is no retry here.
    pub async fn acquire_local_media(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, NegotiationError> {
        if self.state.is_terminal() {
            return Err(NegotiationError::SessionEnded);
        }

        let stream = self.devices.acquire_user_media(constraints).await?;
        for track in stream.tracks() {
            self.transport
                .add_track(track)
                .await
                .map_err(NegotiationError::Transport)?;
        }

        self.local_media = Some(stream.clone());
        Ok(stream)
    }

    /// Create the session offer and emit it on the signaling queue.
    ///
    /// At most one offer may be outstanding per session; callers must wait
    /// for the answer before producing another.
    pub async fn produce_offer(&mut self) -> Result<(), NegotiationError> {
        if self.state.is_terminal() {
            return Err(NegotiationError::SessionEnded);
        }
        if self.local_media.is_none() {
            return Err(NegotiationError::MediaNotAttached);
        }
        if self.offer_outstanding {
            return Err(NegotiationError::OfferOutstanding);
        }

        let offer = self
            .transport
            .create_offer()
            .await
            .map_err(NegotiationError::Transport)?;
        let data = serde_json::to_value(&offer)?;
        self.emit(SignalMessage::Offer { data });

        self.offer_outstanding = true;
        if self.state == SessionState::New {
            self.set_state(SessionState::Connecting);
        }
        Ok(())
    }

    /// Dispatch one inbound signaling message by tag. Server room
    /// notifications are not the negotiator's concern and pass through
    /// untouched.
    pub async fn consume_remote_message(
        &mut self,
        msg: SignalMessage,
    ) -> Result<(), NegotiationError> {
        if self.state == SessionState::Closed {
            debug!("Session ended, dropping inbound message");
            return Ok(());
        }

        match msg {
            SignalMessage::Offer { data } => {
                let desc: SessionDescription = serde_json::from_value(data)?;
                self.transport
                    .set_remote_description(desc)
                    .await
                    .map_err(NegotiationError::Transport)?;

                let answer = self
                    .transport
                    .create_answer()
                    .await
                    .map_err(NegotiationError::Transport)?;
                let data = serde_json::to_value(&answer)?;
                self.emit(SignalMessage::Answer { data });

                if self.state == SessionState::New {
                    self.set_state(SessionState::Connecting);
                }
            }

            SignalMessage::Answer { data } => {
                if !self.offer_outstanding {
                    warn!("Stray answer with no outstanding offer, ignoring");
                    return Ok(());
                }
                let desc: SessionDescription = serde_json::from_value(data)?;
                self.transport
                    .set_remote_description(desc)
                    .await
                    .map_err(NegotiationError::Transport)?;
                self.offer_outstanding = false;
            }

            SignalMessage::IceCandidate { data } => {
                let candidate: CandidateInit = serde_json::from_value(data)?;
                // Candidates may arrive before descriptions settle; the
                // transport buffers them rather than dropping.
                if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                    warn!("Failed to add ICE candidate: {e:?}");
                }
            }

            SignalMessage::RoomJoined { .. }
            | SignalMessage::ParticipantJoined { .. }
            | SignalMessage::ParticipantLeft { .. } => {}
        }

        Ok(())
    }

    /// Emit a locally gathered candidate to the peer.
    pub fn announce_candidate(&self, candidate: CandidateInit) {
        if self.state == SessionState::Closed {
            return;
        }
        match serde_json::to_value(&candidate) {
            Ok(data) => self.emit(SignalMessage::IceCandidate { data }),
            Err(e) => error!("Failed to serialize candidate: {e}"),
        }
    }

    /// Flip the microphone in place; no renegotiation. Returns the new flag.
    pub fn toggle_audio(&mut self) -> Result<bool, NegotiationError> {
        let track = self
            .local_media
            .as_ref()
            .and_then(|media| media.audio.as_ref())
            .ok_or(NegotiationError::MediaNotAttached)?;
        Ok(track.toggle())
    }

    /// Flip the camera in place; no renegotiation. Returns the new flag.
    pub fn toggle_video(&mut self) -> Result<bool, NegotiationError> {
        let track = self
            .local_media
            .as_ref()
            .and_then(|media| media.video.as_ref())
            .ok_or(NegotiationError::MediaNotAttached)?;
        Ok(track.toggle())
    }

    /// Capture the display and swap it for the outgoing camera track in
    /// place, avoiding an offer/answer cycle. Returns the capture's `ended`
    /// signal so the caller can fall back to the camera when sharing stops
    /// externally.
    pub async fn start_screen_share(
        &mut self,
    ) -> Result<oneshot::Receiver<()>, NegotiationError> {
        if self.state.is_terminal() {
            return Err(NegotiationError::SessionEnded);
        }
        if self.local_media.is_none() {
            return Err(NegotiationError::MediaNotAttached);
        }
        if self.screen_track.is_some() {
            return Err(NegotiationError::AlreadySharing);
        }

        let capture = self.devices.acquire_display_media().await?;
        self.transport
            .replace_video_track(&capture.track)
            .await
            .map_err(NegotiationError::Transport)?;

        info!("Screen sharing started");
        self.screen_track = Some(capture.track);
        Ok(capture.ended)
    }

    /// Stop sharing and swap the camera track back in. A no-op when not
    /// sharing, so an external capture end and an explicit stop can race
    /// safely.
    pub async fn stop_screen_share(&mut self) -> Result<(), NegotiationError> {
        let Some(screen) = self.screen_track.take() else {
            return Ok(());
        };
        screen.stop();

        if self.state == SessionState::Closed {
            return Ok(());
        }

        let camera = self
            .local_media
            .as_ref()
            .and_then(|media| media.video.clone())
            .ok_or(NegotiationError::MediaNotAttached)?;
        self.transport
            .replace_video_track(&camera)
            .await
            .map_err(NegotiationError::Transport)?;

        info!("Screen sharing stopped, camera restored");
        Ok(())
    }

    /// Normalize a transport state report into the session state. Terminal
    /// states are sticky: a session that failed stays failed until torn
    /// down, and nothing moves a closed session.
    pub fn apply_transport_state(&mut self, transport_state: TransportState) {
        if self.state.is_terminal() {
            return;
        }

        let next = match transport_state {
            // The transport's initial state never moves an active session
            // backwards.
            TransportState::New => return,
            TransportState::Connecting => SessionState::Connecting,
            TransportState::Connected => SessionState::Connected,
            TransportState::Disconnected => SessionState::Disconnected,
            TransportState::Failed => SessionState::Failed,
            TransportState::Closed => SessionState::Closed,
        };

        if next != self.state {
            self.set_state(next);
        }
    }

    /// Record a remote track arrival; the remote stream exists once the
    /// first track shows up.
    pub fn record_remote_track(&mut self, kind: TrackKind) {
        if self.state == SessionState::Closed {
            return;
        }
        if !self.remote_tracks.contains(&kind) {
            self.remote_tracks.push(kind);
        }
    }

    /// Tear the session down: stop every local track, close the transport,
    /// mark the state closed. Idempotent; a second call does nothing.
    pub async fn end_session(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        if let Some(stream) = &self.local_media {
            stream.stop_all();
        }
        if let Some(screen) = self.screen_track.take() {
            screen.stop();
        }

        if let Err(e) = self.transport.close().await {
            warn!("Transport close failed: {e:?}");
        }

        self.offer_outstanding = false;
        self.set_state(SessionState::Closed);
    }

    fn set_state(&mut self, next: SessionState) {
        info!("Session state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn emit(&self, msg: SignalMessage) {
        // Mirrors the channel's best-effort policy: a torn-down channel
        // swallows the frame.
        let _ = self.outbound.send(msg);
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use parley_core::{CandidateInit, IceServerConfig, SdpType, SessionDescription};

use crate::media::{MediaTrack, TrackKind, VideoSource};
use crate::transport::{PeerTransport, TransportEvent, TransportState};

/// [`PeerTransport`] over the native `webrtc` stack.
pub struct RtcTransport {
    peer_connection: Arc<RTCPeerConnection>,
    video_sender: Option<Arc<RTCRtpSender>>,
}

impl RtcTransport {
    /// Create the peer connection and wire its callbacks into `event_tx`.
    pub async fn new(
        ice_servers: Vec<IceServerConfig>,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    debug!("Peer connection state changed: {state:?}");
                    let _ = tx.send(TransportEvent::StateChanged(map_state(state))).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let Ok(json) = candidate.to_json() else {
                    return;
                };
                let candidate = CandidateInit {
                    candidate: json.candidate,
                    sdp_mid: json.sdp_mid,
                    sdp_m_line_index: json.sdp_mline_index,
                };
                let _ = tx.send(TransportEvent::CandidateGathered(candidate)).await;
            })
        }));

        let track_tx = event_tx.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                let _ = tx.send(TransportEvent::RemoteTrackAdded(kind)).await;
            })
        }));

        Ok(Self {
            peer_connection,
            video_sender: None,
        })
    }
}

fn map_state(state: RTCPeerConnectionState) -> TransportState {
    match state {
        RTCPeerConnectionState::Connecting => TransportState::Connecting,
        RTCPeerConnectionState::Connected => TransportState::Connected,
        RTCPeerConnectionState::Disconnected => TransportState::Disconnected,
        RTCPeerConnectionState::Failed => TransportState::Failed,
        RTCPeerConnectionState::Closed => TransportState::Closed,
        _ => TransportState::New,
    }
}

/// Build the outgoing sample track for a [`MediaTrack`] handle. The stream
/// id tells the far side whether frames come from the camera or the screen.
fn sample_track(track: &MediaTrack) -> Arc<TrackLocalStaticSample> {
    let capability = match track.kind() {
        TrackKind::Audio => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            ..Default::default()
        },
        TrackKind::Video => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            ..Default::default()
        },
    };
    let stream_id = match track.source() {
        Some(VideoSource::Display) => "screen",
        _ => "webcam",
    };

    Arc::new(TrackLocalStaticSample::new(
        capability,
        track.id().to_owned(),
        stream_id.to_owned(),
    ))
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn add_track(&mut self, track: &MediaTrack) -> Result<()> {
        let local: Arc<dyn TrackLocal + Send + Sync> = sample_track(track);
        let sender = self
            .peer_connection
            .add_track(local)
            .await
            .context("Failed to add track")?;

        if track.kind() == TrackKind::Video {
            self.video_sender = Some(sender);
        }
        Ok(())
    }

    async fn create_offer(&mut self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to set local description")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&mut self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local description")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&mut self, desc: SessionDescription) -> Result<()> {
        let desc = match desc.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&mut self, candidate: CandidateInit) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn replace_video_track(&mut self, track: &MediaTrack) -> Result<()> {
        let sender = self
            .video_sender
            .as_ref()
            .context("No outgoing video track to replace")?;
        let local: Arc<dyn TrackLocal + Send + Sync> = sample_track(track);
        sender
            .replace_track(Some(local))
            .await
            .context("Failed to replace video track")?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}

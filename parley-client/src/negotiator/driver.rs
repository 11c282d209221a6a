use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use parley_core::SignalMessage;

use crate::media::{MediaConstraints, MediaStream, TrackKind};
use crate::negotiator::{NegotiationError, SessionNegotiator, SessionState};
use crate::transport::TransportEvent;

/// Operations a UI can request on a running session.
#[derive(Debug)]
pub enum SessionCommand {
    AcquireMedia {
        constraints: MediaConstraints,
        reply: oneshot::Sender<Result<MediaStream, NegotiationError>>,
    },
    ProduceOffer {
        reply: oneshot::Sender<Result<(), NegotiationError>>,
    },
    ToggleAudio {
        reply: oneshot::Sender<Result<bool, NegotiationError>>,
    },
    ToggleVideo {
        reply: oneshot::Sender<Result<bool, NegotiationError>>,
    },
    StartScreenShare {
        reply: oneshot::Sender<Result<(), NegotiationError>>,
    },
    StopScreenShare {
        reply: oneshot::Sender<Result<(), NegotiationError>>,
    },
    End,
}

/// What a running session reports back to its UI.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionState),
    RoomJoined { participants: usize },
    PeerJoined,
    PeerLeft,
    RemoteTrackAdded(TrackKind),
    ScreenShareEnded,
}

/// Cloneable surface handed to the UI. Commands are queued to the driving
/// loop and answered asynchronously; once the session is gone every request
/// resolves to [`NegotiationError::SessionEnded`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub async fn acquire_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaStream, NegotiationError> {
        self.request(|reply| SessionCommand::AcquireMedia { constraints, reply })
            .await
    }

    pub async fn produce_offer(&self) -> Result<(), NegotiationError> {
        self.request(|reply| SessionCommand::ProduceOffer { reply }).await
    }

    pub async fn toggle_audio(&self) -> Result<bool, NegotiationError> {
        self.request(|reply| SessionCommand::ToggleAudio { reply }).await
    }

    pub async fn toggle_video(&self) -> Result<bool, NegotiationError> {
        self.request(|reply| SessionCommand::ToggleVideo { reply }).await
    }

    pub async fn start_screen_share(&self) -> Result<(), NegotiationError> {
        self.request(|reply| SessionCommand::StartScreenShare { reply })
            .await
    }

    pub async fn stop_screen_share(&self) -> Result<(), NegotiationError> {
        self.request(|reply| SessionCommand::StopScreenShare { reply })
            .await
    }

    /// End the call. Safe to call any number of times.
    pub fn end(&self) {
        let _ = self.commands.send(SessionCommand::End);
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, NegotiationError>>) -> SessionCommand,
    ) -> Result<T, NegotiationError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .map_err(|_| NegotiationError::SessionEnded)?;
        rx.await.map_err(|_| NegotiationError::SessionEnded)?
    }
}

/// Owns the negotiator and pumps every input source in arrival order: UI
/// commands, inbound signaling, transport events, and the screen-capture end
/// signal. One loop per session, the way a room loop owns a room.
pub struct SessionDriver {
    negotiator: SessionNegotiator,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    inbound: mpsc::UnboundedReceiver<SignalMessage>,
    transport_events: mpsc::Receiver<TransportEvent>,
    screen_ended: Option<oneshot::Receiver<()>>,
    state_tx: watch::Sender<SessionState>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionDriver {
    pub fn new(
        negotiator: SessionNegotiator,
        inbound: mpsc::UnboundedReceiver<SignalMessage>,
        transport_events: mpsc::Receiver<TransportEvent>,
    ) -> (
        Self,
        SessionHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(negotiator.state());

        let driver = Self {
            negotiator,
            commands: cmd_rx,
            inbound,
            transport_events,
            screen_ended: None,
            state_tx,
            events: event_tx,
        };
        let handle = SessionHandle {
            commands: cmd_tx,
            state: state_rx,
        };

        (driver, handle, event_rx)
    }

    pub async fn run(mut self) {
        debug!("Session loop started");

        loop {
            let screen_ended = async {
                match &mut self.screen_ended {
                    Some(rx) => {
                        // Fires on an explicit end signal or on the capture
                        // being dropped; both mean sharing is over.
                        let _ = rx.await;
                    }
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(SessionCommand::End) | None => {
                            self.negotiator.end_session().await;
                            self.publish_state();
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }

                msg = self.inbound.recv() => {
                    match msg {
                        Some(msg) => self.handle_signal(msg).await,
                        None => {
                            // A dropped signaling channel ends the session.
                            warn!("Signaling channel closed, ending session");
                            self.negotiator.end_session().await;
                            self.publish_state();
                            break;
                        }
                    }
                }

                event = self.transport_events.recv() => {
                    match event {
                        Some(event) => self.handle_transport_event(event),
                        None => {
                            debug!("Transport event channel closed, ending session");
                            self.negotiator.end_session().await;
                            self.publish_state();
                            break;
                        }
                    }
                }

                _ = screen_ended => {
                    self.screen_ended = None;
                    debug!("Display capture ended externally, reverting to camera");
                    if let Err(e) = self.negotiator.stop_screen_share().await {
                        warn!("Failed to revert to camera: {e}");
                    }
                    let _ = self.events.send(SessionEvent::ScreenShareEnded);
                }
            }

            self.publish_state();

            if self.negotiator.state() == SessionState::Closed {
                break;
            }
        }

        debug!("Session loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::AcquireMedia { constraints, reply } => {
                let _ = reply.send(self.negotiator.acquire_local_media(&constraints).await);
            }
            SessionCommand::ProduceOffer { reply } => {
                let _ = reply.send(self.negotiator.produce_offer().await);
            }
            SessionCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.negotiator.toggle_audio());
            }
            SessionCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.negotiator.toggle_video());
            }
            SessionCommand::StartScreenShare { reply } => {
                let result = match self.negotiator.start_screen_share().await {
                    Ok(ended) => {
                        self.screen_ended = Some(ended);
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            SessionCommand::StopScreenShare { reply } => {
                self.screen_ended = None;
                let _ = reply.send(self.negotiator.stop_screen_share().await);
            }
            // Handled in the loop so teardown and shutdown stay in one place.
            SessionCommand::End => {}
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match &msg {
            SignalMessage::RoomJoined { participants, .. } => {
                let _ = self.events.send(SessionEvent::RoomJoined {
                    participants: *participants,
                });
            }
            SignalMessage::ParticipantJoined { .. } => {
                let _ = self.events.send(SessionEvent::PeerJoined);
            }
            SignalMessage::ParticipantLeft { .. } => {
                let _ = self.events.send(SessionEvent::PeerLeft);
            }
            _ => {}
        }

        if let Err(e) = self.negotiator.consume_remote_message(msg).await {
            warn!("Rejected inbound message: {e}");
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::StateChanged(state) => {
                self.negotiator.apply_transport_state(state);
            }
            TransportEvent::CandidateGathered(candidate) => {
                self.negotiator.announce_candidate(candidate);
            }
            TransportEvent::RemoteTrackAdded(kind) => {
                self.negotiator.record_remote_track(kind);
                let _ = self.events.send(SessionEvent::RemoteTrackAdded(kind));
            }
        }
    }

    fn publish_state(&mut self) {
        let state = self.negotiator.state();
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            let _ = self.events.send(SessionEvent::StateChanged(state));
        }
    }
}

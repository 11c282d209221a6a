use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use parley_core::{RoomId, SignalMessage};

/// The duplex signaling link to the relay.
///
/// `send` is best-effort: once the socket is down, frames are silently
/// dropped, mirroring the relay's own delivery policy. Reconnection is out
/// of scope; a dropped channel ends the session.
pub struct SignalingChannel {
    outbound: mpsc::UnboundedSender<SignalMessage>,
}

impl SignalingChannel {
    /// Connect to `server_url` (e.g. `ws://host:8080`) and join `room`.
    /// Returns the channel plus the inbound message stream, delivered in
    /// arrival order.
    pub async fn connect(
        server_url: &str,
        room: &RoomId,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>)> {
        let url = format!("{server_url}/ws?room={room}");
        let (stream, _) = connect_async(&url)
            .await
            .context("Failed to connect to signaling relay")?;
        info!("Signaling channel connected to {url}");

        let (mut write, mut read) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize outbound message: {e}");
                        continue;
                    }
                };
                if write.send(Message::Text(json.into())).await.is_err() {
                    debug!("Signaling socket closed, dropping outbound frames");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<SignalMessage>(&text) {
                            Ok(msg) => {
                                if inbound_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Unknown signaling frame, skipping: {e}"),
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("Signaling channel closed by server");
                        break;
                    }
                    Err(e) => {
                        warn!("Signaling channel error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok((
            Self {
                outbound: outbound_tx,
            },
            inbound_rx,
        ))
    }

    /// Queue a message; silently dropped if the channel is down.
    pub fn send(&self, msg: SignalMessage) {
        let _ = self.outbound.send(msg);
    }

    /// An outbound queue feeding this channel, for wiring a negotiator.
    pub fn sender(&self) -> mpsc::UnboundedSender<SignalMessage> {
        self.outbound.clone()
    }
}

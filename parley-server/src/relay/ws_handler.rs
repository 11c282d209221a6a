use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use parley_core::{PeerId, RoomId, SignalMessage};

use crate::RelayState;

/// Close code sent when the connection violates the room-parameter policy.
const POLICY_VIOLATION: u16 = 1008;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    room: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params.room, state))
}

async fn handle_socket(mut socket: WebSocket, room: Option<String>, state: RelayState) {
    // Rejected here, before the registry ever sees the connection.
    let room_id = match room.filter(|room| !room.is_empty()) {
        Some(room) => RoomId::from(room),
        None => {
            warn!("Connection without a room parameter, closing");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: POLICY_VIOLATION,
                    reason: "Room ID required".into(),
                })))
                .await;
            return;
        }
    };

    let peer_id = PeerId::new();
    info!("Client {peer_id} connected to room: {room_id}");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.registry.join(&room_id, peer_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let registry = state.registry.clone();
        let room_id = room_id.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        // Envelope confirmed; the original frame is forwarded
                        // so payloads pass through untouched.
                        Ok(_) => registry.broadcast(&room_id, &peer_id, &text),
                        Err(e) => warn!("Invalid envelope from {peer_id}: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Runs exactly once, whichever side closed first.
    state.registry.leave(&room_id, &peer_id);
    info!("Client {peer_id} disconnected from room: {room_id}");
}

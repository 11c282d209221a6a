use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::room::RoomId;

/// Connectivity-discovery endpoints handed to the client transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    /// Public STUN endpoints used when no deployment-specific servers are
    /// configured.
    pub fn default_stun() -> Vec<IceServerConfig> {
        ["stun:stun.l.google.com:19302", "stun:stun1.l.google.com:19302", "stun:stun2.l.google.com:19302"]
            .into_iter()
            .map(|url| IceServerConfig {
                urls: vec![url.to_owned()],
                username: None,
                credential: None,
            })
            .collect()
    }
}

/// Everything that travels over a signaling connection, closed by
/// construction. Decoding an unknown tag is a recoverable error for the
/// receiver, never a crash.
///
/// Peer-to-peer payloads stay [`Value`]: the relay decodes only enough to
/// confirm the envelope and forwards the original frame without touching the
/// contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    #[serde(rename_all = "camelCase")]
    RoomJoined { room_id: RoomId, participants: usize },
    #[serde(rename_all = "camelCase")]
    ParticipantJoined { room_id: RoomId },
    #[serde(rename_all = "camelCase")]
    ParticipantLeft { room_id: RoomId },
    Offer { data: Value },
    Answer { data: Value },
    IceCandidate { data: Value },
}

use axum::extract::ws::Message;
use parley_core::{PeerId, SignalMessage};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// The live occupant set of one room. Owned exclusively by the
/// [`RoomRegistry`](crate::registry::RoomRegistry); connection handlers only
/// ever reach it through registry operations.
pub struct Room {
    occupants: HashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

impl Room {
    pub(crate) fn new() -> Self {
        Self {
            occupants: HashMap::new(),
        }
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub(crate) fn insert(&mut self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.occupants.insert(peer_id, tx);
    }

    pub(crate) fn remove(&mut self, peer_id: &PeerId) -> bool {
        self.occupants.remove(peer_id).is_some()
    }

    /// Queue a notification for one occupant. Delivery is best-effort: a
    /// connection mid-teardown simply drops it.
    pub(crate) fn send_to(&self, peer_id: &PeerId, msg: &SignalMessage) {
        let Some(tx) = self.occupants.get(peer_id) else {
            return;
        };
        match serde_json::to_string(msg) {
            Ok(json) => {
                if tx.send(Message::Text(json.into())).is_err() {
                    debug!("Occupant {peer_id} is gone, dropping notification");
                }
            }
            Err(e) => error!("Failed to serialize signal message: {e}"),
        }
    }

    /// Queue a notification for every occupant except `sender`.
    pub(crate) fn notify_others(&self, sender: &PeerId, msg: &SignalMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => self.forward_raw(sender, &json),
            Err(e) => error!("Failed to serialize signal message: {e}"),
        }
    }

    /// Hand a raw frame to every occupant except `sender`, verbatim.
    pub(crate) fn forward_raw(&self, sender: &PeerId, text: &str) {
        for (peer_id, tx) in &self.occupants {
            if peer_id == sender {
                continue;
            }
            if tx.send(Message::Text(text.to_owned().into())).is_err() {
                debug!("Occupant {peer_id} is gone, dropping frame");
            }
        }
    }
}

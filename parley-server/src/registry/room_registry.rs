use axum::extract::ws::Message;
use dashmap::DashMap;
use parley_core::{PeerId, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::registry::Room;

/// Process-wide table of rooms.
///
/// `join`, `leave`, and `broadcast` on the same room all pass through the
/// room's entry write guard, so operations on one room are linearized while
/// distinct rooms proceed fully in parallel. Delivery goes through unbounded
/// per-connection queues, so a slow consumer never stalls the registry.
///
/// Broadcast fans out to every other occupant: with more than two occupants
/// every peer sees every offer and answer. Rooms are expected to hold two
/// participants; the relay does not enforce that.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
        }
    }

    /// Add `peer_id` to `room_id`, creating the room on first join.
    ///
    /// The joiner receives `room-joined` carrying the occupant count (itself
    /// included); everyone already present receives `participant-joined`.
    /// Returns the occupant count after the join.
    pub fn join(
        &self,
        room_id: &RoomId,
        peer_id: PeerId,
        tx: mpsc::UnboundedSender<Message>,
    ) -> usize {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {room_id}");
            Room::new()
        });

        room.insert(peer_id.clone(), tx);
        let participants = room.occupant_count();

        room.send_to(
            &peer_id,
            &SignalMessage::RoomJoined {
                room_id: room_id.clone(),
                participants,
            },
        );
        room.notify_others(
            &peer_id,
            &SignalMessage::ParticipantJoined {
                room_id: room_id.clone(),
            },
        );

        participants
    }

    /// Remove `peer_id` from `room_id`. The last leave destroys the room;
    /// otherwise the remaining occupants are told `participant-left`.
    /// Unknown rooms and peers are a no-op.
    pub fn leave(&self, room_id: &RoomId, peer_id: &PeerId) {
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            return;
        };
        if !room.remove(peer_id) {
            return;
        }

        if room.is_empty() {
            drop(room);
            // Re-checked under the entry lock: a join racing with the last
            // leave keeps the room alive.
            if self.rooms.remove_if(room_id, |_, r| r.is_empty()).is_some() {
                info!("Room {room_id} destroyed");
            }
        } else {
            room.notify_others(
                peer_id,
                &SignalMessage::ParticipantLeft {
                    room_id: room_id.clone(),
                },
            );
        }
    }

    /// Forward a raw frame to every occupant of `room_id` except `sender`.
    ///
    /// A missing room, or one with no other occupants, is a silent drop: the
    /// sender may not yet know it is alone.
    pub fn broadcast(&self, room_id: &RoomId, sender: &PeerId, text: &str) {
        match self.rooms.get_mut(room_id) {
            Some(room) => room.forward_raw(sender, text),
            None => debug!("Dropping frame for unknown room {room_id}"),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.rooms.iter().map(|room| room.occupant_count()).sum()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

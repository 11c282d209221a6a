mod room;
mod room_registry;

pub use room::Room;
pub use room_registry::RoomRegistry;

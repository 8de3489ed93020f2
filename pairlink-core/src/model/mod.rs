mod member;
mod room;
mod signaling;

pub use member::MemberId;
pub use room::{InvalidRoomName, RoomName};
pub use signaling::{PEER_LEFT_REASON, ROOM_FULL_REASON, Role, SignalMessage};

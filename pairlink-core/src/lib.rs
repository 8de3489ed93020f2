pub mod model;

pub use model::{
    InvalidRoomName, MemberId, PEER_LEFT_REASON, ROOM_FULL_REASON, Role, RoomName, SignalMessage,
};

mod registry;

pub use registry::{RoomFull, RoomRegistry};

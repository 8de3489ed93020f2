pub use pairlink_core::model::{Role, RoomName, SignalMessage};

pub mod model {
    pub use pairlink_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use pairlink_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use pairlink_client::*;
}

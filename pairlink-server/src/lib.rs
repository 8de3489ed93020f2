pub mod room;
pub mod signaling;

pub use room::{RoomFull, RoomRegistry};
pub use signaling::{JoinParams, ws_handler};

use axum::Router;
use axum::routing::get;

/// The relay's full HTTP surface: a single WebSocket upgrade endpoint,
/// addressed by room name.
pub fn router(registry: RoomRegistry) -> Router {
    Router::new()
        .route("/ws/signal", get(ws_handler))
        .with_state(registry)
}

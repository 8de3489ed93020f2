mod ws_handler;

pub use ws_handler::{JoinParams, ws_handler};

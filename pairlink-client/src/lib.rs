//! Client side of the pairlink protocol: joins a named room on the relay,
//! drives the offer/answer/candidate exchange until the peer-to-peer data
//! channel opens, then relays freeform chat text over it.

pub mod chat;
pub mod error;
pub mod session;

mod signaling;
mod transport;

pub use chat::{ChatEntry, ChatLog, Origin};
pub use error::SessionError;
pub use pairlink_core::{Role, RoomName};
pub use session::{ChatSession, CloseReason, SessionConfig, SessionEvent, SessionState};

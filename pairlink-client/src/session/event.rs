use crate::chat::Origin;

/// Why a session reached `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Explicit leave, or the session handle was dropped.
    Left,
    RoomFull,
    /// The other member disconnected.
    PeerLeft,
    /// Signaling or peer transport dropped before the channel opened.
    TransportLost,
    /// The negotiation deadline passed before the channel opened.
    Timeout,
    /// Negotiation failed outright (bad description, relay rejection).
    Failed(String),
}

/// What a session reports to its consumer, in order of occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The data channel is ready; `send` is accepted from here on.
    Opened,
    /// An entry was appended to the chat log.
    MessageAppended { origin: Origin, text: String },
    /// Terminal; nothing follows.
    Closed { reason: CloseReason },
}

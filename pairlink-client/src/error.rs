use pairlink_core::InvalidRoomName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    EmptyRoomName(#[from] InvalidRoomName),

    /// The room already had two members when we tried to join.
    #[error("room is full")]
    RoomFull,

    /// The relay refused the join for a reason other than capacity.
    #[error("relay rejected the session: {0}")]
    Rejected(String),

    /// `send` was called before the data channel opened. The message is
    /// dropped, not queued.
    #[error("data channel is not ready")]
    ChannelNotReady,

    #[error("negotiation timed out")]
    NegotiationTimeout,

    /// The signaling connection or peer transport dropped before the data
    /// channel opened.
    #[error("transport lost")]
    TransportLost,

    /// The session engine has already shut down.
    #[error("session is closed")]
    Closed,

    #[error("invalid relay url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("signaling transport: {0}")]
    Signaling(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("peer connection: {0}")]
    Peer(#[from] webrtc::Error),
}

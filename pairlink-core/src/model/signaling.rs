use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason string carried by the error the relay sends to a third joiner.
pub const ROOM_FULL_REASON: &str = "Room is full";

/// Reason string relayed to the surviving member when its peer disconnects.
pub const PEER_LEFT_REASON: &str = "Peer left the room";

/// Negotiation role assigned by the relay in the connect acknowledgement.
/// Exactly one member of a paired room holds each role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Offerer,
    Answerer,
}

impl Role {
    pub fn counterpart(self) -> Role {
        match self {
            Role::Offerer => Role::Answerer,
            Role::Answerer => Role::Offerer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Offerer => f.write_str("offerer"),
            Role::Answerer => f.write_str("answerer"),
        }
    }
}

/// The signaling envelope. `joined` and `error` originate at the relay;
/// `offer`, `answer` and `candidate` are relayed verbatim between the two
/// members of a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalMessage {
    Joined {
        role: Role,
    },
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    Candidate {
        candidate: String,
        #[serde(rename = "sdpMid")]
        sdp_mid: Option<String>,
        #[serde(rename = "sdpMLineIndex")]
        sdp_mline_index: Option<u16>,
    },
    Error {
        message: String,
    },
}

impl SignalMessage {
    pub fn room_full() -> Self {
        Self::Error {
            message: ROOM_FULL_REASON.to_owned(),
        }
    }

    pub fn peer_left() -> Self {
        Self::Error {
            message: PEER_LEFT_REASON.to_owned(),
        }
    }

    pub fn is_room_full(&self) -> bool {
        matches!(self, Self::Error { message } if message == ROOM_FULL_REASON)
    }

    /// The `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "joined",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::Error { .. } => "error",
        }
    }

    /// True for the kinds a member may ask the relay to forward. The relay
    /// never originates these and never accepts its own kinds back.
    pub fn is_relayable(&self) -> bool {
        matches!(
            self,
            Self::Offer { .. } | Self::Answer { .. } | Self::Candidate { .. }
        )
    }
}

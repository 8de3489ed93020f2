use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("room name must not be blank")]
pub struct InvalidRoomName;

/// Opaque operator-supplied room identifier. The relay keys rooms on the
/// exact string it receives, so the name is kept byte-for-byte; only blank
/// (empty or whitespace-only) input is rejected.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct RoomName(String);

impl RoomName {
    pub fn parse(raw: &str) -> Result<Self, InvalidRoomName> {
        if raw.trim().is_empty() {
            return Err(InvalidRoomName);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::sync::{Arc, Mutex, PoisonError};

/// Which side of the pairing produced a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub origin: Origin,
    pub text: String,
}

/// Append-only per-session message log: local entries are echoed at send
/// time, remote entries appended in receipt order. Shared between the
/// session engine (writer) and the session handle (snapshots).
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Arc<Mutex<Vec<ChatEntry>>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, origin: Origin, text: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ChatEntry { origin, text });
    }

    pub fn snapshot(&self) -> Vec<ChatEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

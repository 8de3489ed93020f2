/// Lifecycle of one session, observable through the handle. `Closed` is
/// terminal; a fresh join builds a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Dialing the relay.
    Connecting,
    /// Connected, waiting for the relay's join acknowledgement.
    RoleUndetermined,
    /// Offer sent, waiting for the answer.
    Offering,
    /// Waiting for the peer's offer.
    Answering,
    /// Descriptions exchanged, candidates trickling.
    Negotiating,
    /// Data channel ready, chat flows.
    Open,
    Closed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed)
    }
}

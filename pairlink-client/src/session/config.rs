use std::time::Duration;

pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base url of the signaling relay, e.g. `ws://127.0.0.1:8000`.
    pub server_url: String,
    /// STUN/TURN urls handed to the peer connection; empty works on a LAN.
    pub ice_servers: Vec<String>,
    /// Bound on the time from join to the data channel opening.
    pub negotiation_timeout: Duration,
}

impl SessionConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ice_servers: vec![],
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }
}

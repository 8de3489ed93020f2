mod config;
mod engine;
mod event;
mod state;

pub use config::{DEFAULT_NEGOTIATION_TIMEOUT, SessionConfig};
pub use event::{CloseReason, SessionEvent};
pub use state::SessionState;

use pairlink_core::{Role, RoomName, SignalMessage};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::chat::{ChatEntry, ChatLog};
use crate::error::SessionError;
use crate::signaling::{self, SignalingEvent};
use crate::transport::PeerLink;
use engine::{Command, Engine};

/// Handle to one live session. Created by [`ChatSession::join`]; the
/// negotiation itself runs in a background task and reports through
/// [`SessionEvent`]s. Dropping the handle leaves the room.
pub struct ChatSession {
    role: Role,
    state: watch::Receiver<SessionState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    log: ChatLog,
}

impl ChatSession {
    /// Joins `room` on the relay and starts negotiating. Returns once the
    /// relay has acknowledged the join and assigned a role; a full room
    /// fails here with [`SessionError::RoomFull`].
    pub async fn join(config: SessionConfig, room: &str) -> Result<Self, SessionError> {
        let room = RoomName::parse(room)?;
        let deadline = Instant::now() + config.negotiation_timeout;

        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        state_tx.send_replace(SessionState::Connecting);
        let (signaling, mut signal_rx) = signaling::connect(&config.server_url, &room).await?;

        state_tx.send_replace(SessionState::RoleUndetermined);
        let role = await_role(&mut signal_rx, config.negotiation_timeout).await?;
        info!(%room, %role, "joined room");

        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let peer = PeerLink::new(&config.ice_servers, peer_tx).await?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let log = ChatLog::new();

        let engine = Engine {
            role,
            state: state_tx,
            peer,
            signaling: Some(signaling),
            signal_rx,
            peer_rx,
            cmd_rx,
            events: event_tx,
            log: log.clone(),
            pending_candidates: Vec::new(),
            remote_description_set: false,
            deadline,
        };
        tokio::spawn(engine.run());

        Ok(Self {
            role,
            state: state_rx,
            cmd_tx,
            events,
            log,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Transmits `text` over the data channel and echoes it into the local
    /// log. Rejected with [`SessionError::ChannelNotReady`] until the
    /// session is `Open`; rejected sends append and transmit nothing.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Send {
                text: text.into(),
                done: done_tx,
            })
            .map_err(|_| SessionError::Closed)?;
        done_rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Next session event; `None` after the engine has shut down and the
    /// final `Closed` event was consumed.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Snapshot of the chat log, in append order.
    pub fn log(&self) -> Vec<ChatEntry> {
        self.log.snapshot()
    }

    /// Leaves the room. The engine tears down the signaling connection and
    /// the peer connection; a `Closed` event follows.
    pub fn leave(&self) {
        let _ = self.cmd_tx.send(Command::Leave);
    }
}

/// First leg of the protocol: the relay either acknowledges the join with a
/// role assignment or rejects it before anything else.
async fn await_role(
    signal_rx: &mut mpsc::UnboundedReceiver<SignalingEvent>,
    timeout: Duration,
) -> Result<Role, SessionError> {
    let outcome = tokio::time::timeout(timeout, async {
        loop {
            match signal_rx.recv().await {
                Some(SignalingEvent::Signal(SignalMessage::Joined { role })) => return Ok(role),
                Some(SignalingEvent::Signal(msg)) if msg.is_room_full() => {
                    return Err(SessionError::RoomFull);
                }
                Some(SignalingEvent::Signal(SignalMessage::Error { message })) => {
                    return Err(SessionError::Rejected(message));
                }
                Some(SignalingEvent::Signal(other)) => {
                    warn!(kind = other.kind(), "signal before join ack, ignoring");
                }
                Some(SignalingEvent::Closed) | None => return Err(SessionError::TransportLost),
            }
        }
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(SessionError::NegotiationTimeout),
    }
}

use pairlink_core::{PEER_LEFT_REASON, ROOM_FULL_REASON, Role, SignalMessage};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;

use crate::chat::{ChatLog, Origin};
use crate::error::SessionError;
use crate::session::event::{CloseReason, SessionEvent};
use crate::session::state::SessionState;
use crate::signaling::{SignalingChannel, SignalingEvent};
use crate::transport::{PeerEvent, PeerLink};

pub(crate) enum Command {
    Send {
        text: String,
        done: oneshot::Sender<Result<(), SessionError>>,
    },
    Leave,
}

/// Per-session state machine. One consumer task owns all the session's
/// mutable state; every transition is a reaction to one of the three event
/// sources selected on in `run`.
pub(crate) struct Engine {
    pub(crate) role: Role,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) peer: PeerLink,
    pub(crate) signaling: Option<SignalingChannel>,
    pub(crate) signal_rx: mpsc::UnboundedReceiver<SignalingEvent>,
    pub(crate) peer_rx: mpsc::UnboundedReceiver<PeerEvent>,
    pub(crate) cmd_rx: mpsc::UnboundedReceiver<Command>,
    pub(crate) events: mpsc::UnboundedSender<SessionEvent>,
    pub(crate) log: ChatLog,
    /// Candidates that arrived before the remote description was applied.
    pub(crate) pending_candidates: Vec<RTCIceCandidateInit>,
    pub(crate) remote_description_set: bool,
    pub(crate) deadline: Instant,
}

impl Engine {
    pub(crate) async fn run(mut self) {
        if let Err(e) = self.begin().await {
            warn!("negotiation failed to start: {e}");
            self.close(CloseReason::Failed(e.to_string())).await;
            return;
        }

        let timeout = tokio::time::sleep_until(self.deadline);
        tokio::pin!(timeout);

        loop {
            let open = matches!(*self.state.borrow(), SessionState::Open);

            tokio::select! {
                _ = &mut timeout, if !open => {
                    warn!("negotiation deadline passed");
                    self.close(CloseReason::Timeout).await;
                    break;
                }

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send { text, done }) => {
                        let _ = done.send(self.handle_send(text).await);
                    }
                    Some(Command::Leave) | None => {
                        self.close(CloseReason::Left).await;
                        break;
                    }
                },

                sig = self.signal_rx.recv() => match sig {
                    Some(SignalingEvent::Signal(msg)) => {
                        if let Some(reason) = self.handle_signal(msg).await {
                            self.close(reason).await;
                            break;
                        }
                    }
                    Some(SignalingEvent::Closed) | None => {
                        if open {
                            // Negotiation is done; the data channel is the
                            // transport of record from here.
                            debug!("signaling connection closed after open");
                            self.signaling = None;
                        } else {
                            self.close(CloseReason::TransportLost).await;
                            break;
                        }
                    }
                },

                evt = self.peer_rx.recv() => match evt {
                    Some(event) => {
                        if let Some(reason) = self.handle_peer_event(event) {
                            self.close(reason).await;
                            break;
                        }
                    }
                    None => {
                        self.close(CloseReason::TransportLost).await;
                        break;
                    }
                },
            }
        }
    }

    async fn begin(&mut self) -> Result<(), SessionError> {
        match self.role {
            Role::Offerer => {
                let sdp = self.peer.create_offer().await?;
                self.signal(SignalMessage::Offer { sdp });
                self.set_state(SessionState::Offering);
            }
            Role::Answerer => {
                self.set_state(SessionState::Answering);
            }
        }
        Ok(())
    }

    async fn handle_signal(&mut self, msg: SignalMessage) -> Option<CloseReason> {
        match msg {
            SignalMessage::Offer { sdp } => {
                if *self.state.borrow() != SessionState::Answering {
                    warn!("offer in unexpected state, ignoring");
                    return None;
                }
                match self.peer.accept_offer(sdp).await {
                    Ok(answer) => {
                        self.signal(SignalMessage::Answer { sdp: answer });
                        self.remote_description_set = true;
                        self.set_state(SessionState::Negotiating);
                        self.flush_pending_candidates().await;
                        None
                    }
                    Err(e) => {
                        warn!("failed to accept offer: {e}");
                        Some(CloseReason::Failed(e.to_string()))
                    }
                }
            }

            SignalMessage::Answer { sdp } => {
                if *self.state.borrow() != SessionState::Offering {
                    warn!("answer in unexpected state, ignoring");
                    return None;
                }
                match self.peer.apply_answer(sdp).await {
                    Ok(()) => {
                        self.remote_description_set = true;
                        self.set_state(SessionState::Negotiating);
                        self.flush_pending_candidates().await;
                        None
                    }
                    Err(e) => {
                        warn!("failed to apply answer: {e}");
                        Some(CloseReason::Failed(e.to_string()))
                    }
                }
            }

            SignalMessage::Candidate {
                candidate,
                sdp_mid,
                sdp_mline_index,
            } => {
                let init = RTCIceCandidateInit {
                    candidate,
                    sdp_mid,
                    sdp_mline_index,
                    username_fragment: None,
                };
                if !self.remote_description_set {
                    debug!("queueing candidate ahead of the remote description");
                    self.pending_candidates.push(init);
                } else if let Err(e) = self.peer.add_remote_candidate(init).await {
                    // Non-fatal: connectivity can still succeed via the
                    // remaining candidates.
                    warn!("discarding remote candidate: {e}");
                }
                None
            }

            SignalMessage::Error { message } => Some(if message == PEER_LEFT_REASON {
                CloseReason::PeerLeft
            } else if message == ROOM_FULL_REASON {
                CloseReason::RoomFull
            } else {
                CloseReason::Failed(message)
            }),

            SignalMessage::Joined { .. } => {
                warn!("duplicate join acknowledgement, ignoring");
                None
            }
        }
    }

    fn handle_peer_event(&mut self, event: PeerEvent) -> Option<CloseReason> {
        match event {
            PeerEvent::LocalCandidate(init) => {
                match &self.signaling {
                    Some(signaling) => signaling.send(SignalMessage::Candidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_mline_index: init.sdp_mline_index,
                    }),
                    None => debug!("signaling closed, dropping local candidate"),
                }
                None
            }

            PeerEvent::ChannelOpen => {
                info!(role = %self.role, "data channel open");
                self.set_state(SessionState::Open);
                self.emit(SessionEvent::Opened);
                None
            }

            PeerEvent::ChannelMessage(text) => {
                self.log.append(Origin::Remote, text.clone());
                self.emit(SessionEvent::MessageAppended {
                    origin: Origin::Remote,
                    text,
                });
                None
            }

            PeerEvent::ConnectionLost => Some(CloseReason::TransportLost),
        }
    }

    async fn handle_send(&mut self, text: String) -> Result<(), SessionError> {
        if *self.state.borrow() != SessionState::Open {
            return Err(SessionError::ChannelNotReady);
        }
        self.peer.send_text(&text).await?;

        // Optimistic local echo; the channel offers no delivery confirmation.
        self.log.append(Origin::Local, text.clone());
        self.emit(SessionEvent::MessageAppended {
            origin: Origin::Local,
            text,
        });
        Ok(())
    }

    async fn flush_pending_candidates(&mut self) {
        for init in self.pending_candidates.drain(..) {
            if let Err(e) = self.peer.add_remote_candidate(init).await {
                warn!("discarding queued candidate: {e}");
            }
        }
    }

    async fn close(&mut self, reason: CloseReason) {
        if *self.state.borrow() == SessionState::Closed {
            return;
        }
        info!(?reason, "session closing");
        // Dropping the signaling handle closes the socket and frees our
        // room slot on the relay.
        self.signaling = None;
        self.peer.close().await;
        self.set_state(SessionState::Closed);
        self.emit(SessionEvent::Closed { reason });
    }

    fn signal(&self, msg: SignalMessage) {
        if let Some(signaling) = &self.signaling {
            signaling.send(msg);
        }
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

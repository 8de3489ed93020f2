use dashmap::DashMap;
use pairlink_core::{MemberId, Role, SignalMessage};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Hard cap on frames buffered for a member that has not arrived yet.
const BACKLOG_LIMIT: usize = 64;

const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("room already has two active members")]
pub struct RoomFull;

struct Member {
    id: MemberId,
    role: Role,
    outbound: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct RoomSlots {
    members: Vec<Member>,
    /// Frames sent while the sender was alone in the room, flushed to the
    /// second member at join time.
    backlog: Vec<String>,
}

/// Room-scoped relay state: each room holds at most two members and buffers
/// frames until both are present. Rooms are created on first join and
/// removed when the last member leaves.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, RoomSlots>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a slot in `room`. The first member lacking an offerer
    /// counterpart becomes the offerer, so exactly one offer is produced per
    /// pairing. Any backlog is flushed into `outbound` before the member
    /// becomes visible to `forward`, which keeps buffered frames ahead of
    /// later direct ones.
    pub fn join(
        &self,
        room: &str,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Result<(MemberId, Role), RoomFull> {
        let mut slots = self.rooms.entry(room.to_owned()).or_default();

        if slots.members.len() >= ROOM_CAPACITY {
            return Err(RoomFull);
        }

        // At most one member is present here, so the newcomer simply takes
        // the role its peer does not hold.
        let role = slots
            .members
            .first()
            .map_or(Role::Offerer, |m| m.role.counterpart());

        let id = MemberId::new();
        for frame in slots.backlog.drain(..) {
            let _ = outbound.send(frame);
        }
        slots.members.push(Member {
            id,
            role,
            outbound,
        });

        info!(%room, member = %id, %role, "member joined");
        Ok((id, role))
    }

    /// Relays `frame` to the other member of `room`, or buffers it when the
    /// sender is still alone.
    pub fn forward(&self, room: &str, from: MemberId, frame: String) {
        let Some(mut slots) = self.rooms.get_mut(room) else {
            warn!(%room, "forward for unknown room");
            return;
        };

        match slots.members.iter().find(|m| m.id != from) {
            Some(peer) => {
                if peer.outbound.send(frame).is_err() {
                    warn!(%room, member = %peer.id, "peer outbound channel closed");
                }
            }
            None => {
                if slots.backlog.len() < BACKLOG_LIMIT {
                    slots.backlog.push(frame);
                } else {
                    warn!(%room, "backlog full, dropping frame");
                }
            }
        }
    }

    /// Releases the member's slot immediately, drops any backlog it left
    /// behind and notifies the surviving member, if any.
    pub fn leave(&self, room: &str, member: MemberId) {
        let mut room_is_empty = false;

        if let Some(mut slots) = self.rooms.get_mut(room) {
            let before = slots.members.len();
            slots.members.retain(|m| m.id != member);

            if slots.members.len() < before {
                info!(%room, member = %member, "member left");
                slots.backlog.clear();

                if let Some(survivor) = slots.members.first() {
                    match serde_json::to_string(&SignalMessage::peer_left()) {
                        Ok(frame) => {
                            let _ = survivor.outbound.send(frame);
                        }
                        Err(e) => error!("failed to encode peer-left notice: {e}"),
                    }
                }
            }
            room_is_empty = slots.members.is_empty();
        }

        if room_is_empty {
            self.rooms.remove_if(room, |_, slots| slots.members.is_empty());
        }
    }

    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |slots| slots.members.len())
    }
}

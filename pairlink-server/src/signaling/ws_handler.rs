use crate::room::RoomRegistry;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use pairlink_core::SignalMessage;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Deserialize)]
pub struct JoinParams {
    room: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinParams>,
    State(registry): State<RoomRegistry>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params.room, registry))
}

fn encode(msg: &SignalMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("failed to encode signal message: {e}");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, room: String, registry: RoomRegistry) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let (member_id, role) = match registry.join(&room, tx) {
        Ok(joined) => joined,
        Err(_) => {
            info!(%room, "rejecting join, room is full");
            if let Some(frame) = encode(&SignalMessage::room_full()) {
                let _ = sender.send(Message::Text(frame.into())).await;
            }
            let _ = sender.close().await;
            return;
        }
    };

    info!(%room, member = %member_id, %role, "member connected");

    // The join acknowledgement goes out before the pump task starts, so it
    // always precedes any backlog the registry flushed into `rx`.
    if let Some(frame) = encode(&SignalMessage::Joined { role }) {
        if sender.send(Message::Text(frame.into())).await.is_err() {
            registry.leave(&room, member_id);
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let registry = registry.clone();
        let room = room.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) if signal.is_relayable() => {
                            registry.forward(&room, member_id, text.as_str().to_owned());
                        }
                        Ok(signal) => {
                            warn!(
                                %room,
                                member = %member_id,
                                kind = signal.kind(),
                                "refusing to relay control kind"
                            );
                        }
                        Err(e) => {
                            warn!(%room, member = %member_id, "invalid signal frame: {e}");
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    registry.leave(&room, member_id);
    info!(%room, member = %member_id, "member disconnected");
}

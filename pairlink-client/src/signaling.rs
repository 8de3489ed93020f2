//! WebSocket leg of a session: one writer task serializing outbound signal
//! messages, one reader task parsing inbound frames into engine events.

use futures::{SinkExt, StreamExt};
use pairlink_core::{RoomName, SignalMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;

use crate::error::SessionError;

#[derive(Debug)]
pub(crate) enum SignalingEvent {
    Signal(SignalMessage),
    Closed,
}

/// Handle to the outbound half of the signaling connection. Dropping it
/// ends the writer task, which closes the socket and releases our room slot.
pub(crate) struct SignalingChannel {
    outbound: mpsc::UnboundedSender<SignalMessage>,
}

impl SignalingChannel {
    pub(crate) fn send(&self, msg: SignalMessage) {
        if self.outbound.send(msg).is_err() {
            debug!("signaling writer gone, dropping outbound signal");
        }
    }
}

pub(crate) async fn connect(
    server_url: &str,
    room: &RoomName,
) -> Result<(SignalingChannel, mpsc::UnboundedReceiver<SignalingEvent>), SessionError> {
    let mut url = Url::parse(server_url)?;
    url.set_path("/ws/signal");
    url.query_pairs_mut()
        .clear()
        .append_pair("room", room.as_str());

    let (ws, _) = connect_async(url.as_str()).await?;
    let (mut sink, mut stream) = ws.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<SignalMessage>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<SignalingEvent>();

    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let frame = match serde_json::to_string(&msg) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("failed to encode signal message: {e}");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            let msg = match result {
                Ok(msg) => msg,
                Err(e) => {
                    debug!("signaling read error: {e}");
                    break;
                }
            };
            match msg {
                Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                    Ok(signal) => {
                        if in_tx.send(SignalingEvent::Signal(signal)).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("invalid signal frame from relay: {e}"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        let _ = in_tx.send(SignalingEvent::Closed);
    });

    Ok((SignalingChannel { outbound: out_tx }, in_rx))
}

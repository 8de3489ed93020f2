use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use pairlink_core::{Role, SignalMessage};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use pairlink_server::{RoomRegistry, router};

/// Timeout for signal exchange operations (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// Window in which a frame must NOT arrive (ms).
pub const SILENCE_WINDOW_MS: u64 = 300;

/// Spawn the relay on an ephemeral port and return its ws base url.
pub async fn spawn_relay() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, router(RoomRegistry::new())).await;
    });

    Ok(format!("ws://{addr}"))
}

/// A raw signaling-protocol client, one WebSocket per peer.
pub struct TestPeer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestPeer {
    pub async fn connect(base_url: &str, room: &str) -> Result<Self> {
        let (ws, _) = connect_async(format!("{base_url}/ws/signal?room={room}"))
            .await
            .context("failed to connect to relay")?;
        Ok(Self { ws })
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let frame = serde_json::to_string(msg)?;
        self.ws.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    /// Next signal frame, skipping transport chatter.
    pub async fn recv(&mut self) -> Result<SignalMessage> {
        let deadline = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let msg = tokio::time::timeout(deadline, self.ws.next())
                .await
                .context("timed out waiting for a signal frame")?
                .context("socket closed")??;

            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => bail!("socket closed by relay"),
                _ => {}
            }
        }
    }

    /// Assert that no signal frame arrives within the silence window.
    pub async fn expect_silence(&mut self) -> Result<()> {
        let window = Duration::from_millis(SILENCE_WINDOW_MS);
        match tokio::time::timeout(window, self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => bail!("unexpected frame: {text}"),
            Ok(_) => Ok(()),
        }
    }

    pub async fn expect_joined(&mut self) -> Result<Role> {
        match self.recv().await? {
            SignalMessage::Joined { role } => Ok(role),
            other => bail!("expected joined ack, got {}", other.kind()),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

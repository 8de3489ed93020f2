use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

use crate::error::SessionError;

const CHANNEL_LABEL: &str = "chat";

/// Events the peer connection pushes into the session's event loop.
#[derive(Debug)]
pub(crate) enum PeerEvent {
    LocalCandidate(RTCIceCandidateInit),
    ChannelOpen,
    ChannelMessage(String),
    ConnectionLost,
}

/// Owns the session's peer connection and its single data channel. The
/// channel slot is bound at most once, whether we create the channel
/// (offerer) or receive it (answerer).
pub(crate) struct PeerLink {
    connection: Arc<RTCPeerConnection>,
    channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    events: mpsc::UnboundedSender<PeerEvent>,
}

impl PeerLink {
    pub(crate) async fn new(
        ice_servers: &[String],
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Self, SessionError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: if ice_servers.is_empty() {
                vec![]
            } else {
                vec![RTCIceServer {
                    urls: ice_servers.to_vec(),
                    ..Default::default()
                }]
            },
            ..Default::default()
        };

        let connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));

        let state_events = events.clone();
        connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    debug!(?state, "peer connection state changed");
                    match state {
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            let _ = events.send(PeerEvent::ConnectionLost);
                        }
                        _ => {}
                    }
                })
            },
        ));

        let ice_events = events.clone();
        connection.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                match candidate.to_json() {
                    Ok(init) => {
                        let _ = events.send(PeerEvent::LocalCandidate(init));
                    }
                    Err(e) => warn!("failed to encode local candidate: {e}"),
                }
            })
        }));

        // The answerer side: the remote peer announces the channel.
        let slot = Arc::clone(&channel);
        let channel_events = events.clone();
        connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let slot = Arc::clone(&slot);
            let events = channel_events.clone();
            Box::pin(async move {
                let mut bound = slot.lock().await;
                if bound.is_some() {
                    warn!(label = dc.label(), "second data channel announced, ignoring");
                    return;
                }
                debug!(label = dc.label(), "inbound data channel");
                wire_channel(&dc, events);
                *bound = Some(dc);
            })
        }));

        Ok(Self {
            connection,
            channel,
            events,
        })
    }

    /// Offerer entry point: create the data channel and a local offer.
    /// Returns the offer SDP to send to the peer.
    pub(crate) async fn create_offer(&self) -> Result<String, SessionError> {
        let dc = self
            .connection
            .create_data_channel(CHANNEL_LABEL, None)
            .await?;
        wire_channel(&dc, self.events.clone());
        {
            let mut bound = self.channel.lock().await;
            if bound.is_none() {
                *bound = Some(dc);
            }
        }

        let offer = self.connection.create_offer(None).await?;
        self.connection.set_local_description(offer.clone()).await?;
        Ok(offer.sdp)
    }

    /// Answerer entry point: apply the remote offer and produce an answer.
    /// Returns the answer SDP to send back.
    pub(crate) async fn accept_offer(&self, sdp: String) -> Result<String, SessionError> {
        let offer = RTCSessionDescription::offer(sdp)?;
        self.connection.set_remote_description(offer).await?;

        let answer = self.connection.create_answer(None).await?;
        self.connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    pub(crate) async fn apply_answer(&self, sdp: String) -> Result<(), SessionError> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.connection.set_remote_description(answer).await?;
        Ok(())
    }

    pub(crate) async fn add_remote_candidate(
        &self,
        init: RTCIceCandidateInit,
    ) -> Result<(), SessionError> {
        self.connection.add_ice_candidate(init).await?;
        Ok(())
    }

    pub(crate) async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        let dc = self.channel.lock().await.clone();
        match dc {
            Some(dc) if dc.ready_state() == RTCDataChannelState::Open => {
                dc.send_text(text).await?;
                Ok(())
            }
            _ => Err(SessionError::ChannelNotReady),
        }
    }

    pub(crate) async fn close(&self) {
        if let Err(e) = self.connection.close().await {
            debug!("error closing peer connection: {e}");
        }
    }
}

fn wire_channel(dc: &Arc<RTCDataChannel>, events: mpsc::UnboundedSender<PeerEvent>) {
    let open_events = events.clone();
    dc.on_open(Box::new(move || {
        let events = open_events.clone();
        Box::pin(async move {
            debug!("data channel open");
            let _ = events.send(PeerEvent::ChannelOpen);
        })
    }));

    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let events = events.clone();
        Box::pin(async move {
            let text = String::from_utf8_lossy(&msg.data).into_owned();
            let _ = events.send(PeerEvent::ChannelMessage(text));
        })
    }));
}

use pairlink_core::SignalMessage;

use crate::integration::init_tracing;
use crate::utils::{TestPeer, spawn_relay};

fn offer(sdp: &str) -> SignalMessage {
    SignalMessage::Offer {
        sdp: sdp.to_owned(),
    }
}

#[tokio::test]
async fn frames_are_forwarded_verbatim_both_ways() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut first = TestPeer::connect(&base, "alpha").await.expect("connect 1");
    first.expect_joined().await.unwrap();
    let mut second = TestPeer::connect(&base, "alpha").await.expect("connect 2");
    second.expect_joined().await.unwrap();

    first.send(&offer("v=0 from-first")).await.unwrap();
    assert_eq!(second.recv().await.unwrap(), offer("v=0 from-first"));

    second
        .send(&SignalMessage::Answer {
            sdp: "v=0 from-second".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(
        first.recv().await.unwrap(),
        SignalMessage::Answer {
            sdp: "v=0 from-second".to_owned()
        }
    );

    let candidate = SignalMessage::Candidate {
        candidate: "candidate:1 1 udp 2130706431 127.0.0.1 5000 typ host".to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_mline_index: Some(0),
    };
    first.send(&candidate).await.unwrap();
    assert_eq!(second.recv().await.unwrap(), candidate);
}

#[tokio::test]
async fn early_frames_are_buffered_for_the_late_joiner() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut first = TestPeer::connect(&base, "alpha").await.expect("connect 1");
    first.expect_joined().await.unwrap();

    first.send(&offer("v=0 early")).await.unwrap();
    first
        .send(&SignalMessage::Candidate {
            candidate: "candidate:early".to_owned(),
            sdp_mid: None,
            sdp_mline_index: None,
        })
        .await
        .unwrap();

    // Give the relay time to buffer before the second member arrives.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let mut second = TestPeer::connect(&base, "alpha").await.expect("connect 2");
    second.expect_joined().await.unwrap();

    assert_eq!(second.recv().await.unwrap(), offer("v=0 early"));
    match second.recv().await.unwrap() {
        SignalMessage::Candidate { candidate, .. } => assert_eq!(candidate, "candidate:early"),
        other => panic!("expected buffered candidate, got {other:?}"),
    }
}

#[tokio::test]
async fn sender_never_hears_its_own_frames() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut first = TestPeer::connect(&base, "alpha").await.expect("connect 1");
    first.expect_joined().await.unwrap();
    let mut second = TestPeer::connect(&base, "alpha").await.expect("connect 2");
    second.expect_joined().await.unwrap();

    first.send(&offer("v=0 loop")).await.unwrap();
    first.expect_silence().await.unwrap();
}

#[tokio::test]
async fn control_kinds_are_not_relayed() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut first = TestPeer::connect(&base, "alpha").await.expect("connect 1");
    first.expect_joined().await.unwrap();
    let mut second = TestPeer::connect(&base, "alpha").await.expect("connect 2");
    second.expect_joined().await.unwrap();

    // A member must not be able to forge relay-originated kinds; the next
    // frame the peer sees is the legitimate offer.
    first.send(&SignalMessage::peer_left()).await.unwrap();
    first.send(&offer("v=0 real")).await.unwrap();

    assert_eq!(second.recv().await.unwrap(), offer("v=0 real"));
}

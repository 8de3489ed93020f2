use pairlink_core::{Role, SignalMessage};

use crate::integration::init_tracing;
use crate::utils::{TestPeer, spawn_relay};

#[tokio::test]
async fn roles_are_assigned_first_come() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut first = TestPeer::connect(&base, "alpha").await.expect("connect 1");
    assert_eq!(first.expect_joined().await.unwrap(), Role::Offerer);

    let mut second = TestPeer::connect(&base, "alpha").await.expect("connect 2");
    assert_eq!(second.expect_joined().await.unwrap(), Role::Answerer);
}

#[tokio::test]
async fn third_join_receives_room_full() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut first = TestPeer::connect(&base, "alpha").await.expect("connect 1");
    first.expect_joined().await.unwrap();
    let mut second = TestPeer::connect(&base, "alpha").await.expect("connect 2");
    second.expect_joined().await.unwrap();

    let mut third = TestPeer::connect(&base, "alpha").await.expect("connect 3");
    let rejection = third.recv().await.expect("expected an error frame");
    assert!(rejection.is_room_full(), "got {rejection:?}");
}

#[tokio::test]
async fn rooms_are_isolated_by_name() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut alpha = TestPeer::connect(&base, "alpha").await.expect("connect");
    assert_eq!(alpha.expect_joined().await.unwrap(), Role::Offerer);

    // A different room is empty, so its first member offers too.
    let mut beta = TestPeer::connect(&base, "beta").await.expect("connect");
    assert_eq!(beta.expect_joined().await.unwrap(), Role::Offerer);
}

#[tokio::test]
async fn slot_is_freed_on_disconnect() {
    init_tracing();
    let base = spawn_relay().await.expect("relay failed to start");

    let mut first = TestPeer::connect(&base, "alpha").await.expect("connect 1");
    first.expect_joined().await.unwrap();
    let mut second = TestPeer::connect(&base, "alpha").await.expect("connect 2");
    second.expect_joined().await.unwrap();

    first.close().await.unwrap();

    // The survivor is notified of the departure.
    match second.recv().await.unwrap() {
        SignalMessage::Error { message } => {
            assert_eq!(message, pairlink_core::PEER_LEFT_REASON)
        }
        other => panic!("expected peer-left notice, got {other:?}"),
    }

    // The freed slot goes to a newcomer, with the role the survivor lacks.
    let mut third = TestPeer::connect(&base, "alpha").await.expect("connect 3");
    assert_eq!(third.expect_joined().await.unwrap(), Role::Offerer);
}

use std::sync::Arc;

use streamconnect_core::{SdpKind, SessionDescription, SignalBody};
use streamconnect_session::{CallState, RelayHub};

use crate::integration::{connect_as_offerer, init_tracing, launch_peer, room};
use crate::utils::{MockBackend, ScriptedPeer, wait_for_state};

#[tokio::test]
async fn test_end_while_waiting_for_peer() {
    init_tracing();

    let hub = RelayHub::new();
    let room = room("endw");
    let backend = MockBackend::new();
    let session = launch_peer(&hub, &room, "Ada", Arc::clone(&backend));
    let mut snapshots = session.watch();
    wait_for_state(&mut snapshots, CallState::WaitingForPeer).await;

    session.end().await;

    assert_eq!(snapshots.borrow().state, CallState::Terminated);
    assert_eq!(backend.media().live_track_count(), 0);
    assert!(backend.transport(0).is_closed());
}

#[tokio::test]
async fn test_end_while_negotiating() {
    init_tracing();

    let hub = RelayHub::new();
    let room = room("endn");
    let backend = MockBackend::new();
    // keep the transport from ever reporting connected
    backend.set_auto_connect(false);
    let session = launch_peer(&hub, &room, "Ada", Arc::clone(&backend));
    let mut snapshots = session.watch();
    wait_for_state(&mut snapshots, CallState::WaitingForPeer).await;

    let mut caller = ScriptedPeer::connect(&hub, &room, "Brik");
    caller.join();
    caller.next_signal().await; // ready
    caller.send(SignalBody::Offer(SessionDescription {
        kind: SdpKind::Offer,
        sdp: "v=0 caller-offer".to_owned(),
    }));
    caller.next_signal().await; // answer
    wait_for_state(&mut snapshots, CallState::Negotiating).await;

    session.end().await;

    assert_eq!(snapshots.borrow().state, CallState::Terminated);
    assert_eq!(backend.media().live_track_count(), 0);
    assert!(backend.transport(0).is_closed());
}

#[tokio::test]
async fn test_end_after_peer_disconnected() {
    init_tracing();

    let hub = RelayHub::new();
    let room = room("endd");
    let backend = MockBackend::new();
    let session = launch_peer(&hub, &room, "Ada", Arc::clone(&backend));
    let mut snapshots = session.watch();
    wait_for_state(&mut snapshots, CallState::WaitingForPeer).await;

    let mut caller = ScriptedPeer::connect(&hub, &room, "Brik");
    connect_as_offerer(&mut caller, &mut snapshots).await;

    backend.transport(0).fire_degraded().await;
    wait_for_state(&mut snapshots, CallState::Disconnected).await;

    session.end().await;

    let last = snapshots.borrow().clone();
    assert_eq!(last.state, CallState::Terminated);
    assert_eq!(last.status, "Call ended");
    assert_eq!(backend.media().live_track_count(), 0);
}

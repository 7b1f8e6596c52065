use std::sync::Arc;

use streamconnect_session::{CallState, RelayHub};

use crate::integration::{init_tracing, launch_peer, room};
use crate::utils::{MockBackend, wait_for_state, wait_until};

#[tokio::test]
async fn test_two_peers_converge() {
    init_tracing();

    let hub = RelayHub::new();
    let room = room("pair1");
    let backend_a = MockBackend::new();
    let backend_b = MockBackend::new();

    let alice = launch_peer(&hub, &room, "Alice", Arc::clone(&backend_a));
    let mut alice_watch = alice.watch();
    wait_for_state(&mut alice_watch, CallState::WaitingForPeer).await;

    let bob = launch_peer(&hub, &room, "Bob", Arc::clone(&backend_b));
    let mut bob_watch = bob.watch();

    let alice_view = wait_for_state(&mut alice_watch, CallState::Connected).await;
    let bob_view = wait_for_state(&mut bob_watch, CallState::Connected).await;

    assert_eq!(alice_view.status, "Connected");
    assert_eq!(bob_view.status, "Connected");

    // each side learned who the other is from the signal traffic
    let alice_remote = alice_view.remote_peer.expect("alice sees a peer");
    let bob_remote = bob_view.remote_peer.expect("bob sees a peer");
    assert_eq!(alice_remote.name, "Bob");
    assert_eq!(bob_remote.name, "Alice");
    assert!(bob_remote.avatar.ends_with("seed=Alice"));

    // the peer that heard the join answers; the joiner offers
    let alice_transport = backend_a.transport(0);
    let bob_transport = backend_b.transport(0);
    assert!(bob_transport.local_sdp().expect("bob local sdp").contains("offer"));
    assert!(
        alice_transport
            .local_sdp()
            .expect("alice local sdp")
            .contains("answer")
    );
    assert!(alice_transport.has_remote());
    assert!(bob_transport.has_remote());

    // trickled candidates land on both sides, possibly after Connected
    wait_until("alice applied bob's candidates", || {
        alice_transport.applied_candidates().len() == 2
    })
    .await;
    wait_until("bob applied alice's candidates", || {
        bob_transport.applied_candidates().len() == 2
    })
    .await;

    alice.end().await;
    bob.end().await;
}

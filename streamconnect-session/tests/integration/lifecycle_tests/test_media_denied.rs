use std::sync::Arc;
use std::time::Duration;

use streamconnect_session::{CallState, RelayHub};

use crate::integration::{init_tracing, launch_peer, room};
use crate::utils::{MockBackend, ScriptedPeer};

/// When capture is refused the session parks in media acquisition with
/// the refusal as its status. It never announces itself to the room and
/// never builds a transport, but can still be ended.
#[tokio::test]
async fn test_denied_media_parks_the_session() {
    init_tracing();

    let hub = RelayHub::new();
    let room = room("deny");
    let backend = MockBackend::denying_media();

    // listening before the session starts, so a join could not be missed
    let mut witness = ScriptedPeer::connect(&hub, &room, "Watch");
    let session = launch_peer(&hub, &room, "Ada", Arc::clone(&backend));

    let window = witness.collect_for(Duration::from_millis(400)).await;
    assert!(
        window.is_empty(),
        "a session without media must stay silent, got {window:?}"
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, CallState::AcquiringMedia);
    assert_eq!(snapshot.status, "media access denied: Permission denied");
    assert_eq!(backend.transport_count(), 0);

    session.end().await;
}

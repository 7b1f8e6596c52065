use crate::error::SignalError;
use crate::relay::RelayHub;
use streamconnect_core::model::{LocalIdentity, RoomToken, SignalBody, SignalMessage};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Session-facing face of the relay. Stamps the local identity onto
/// outgoing bodies, pumps inbound traffic into the session's channel
/// and drops the session's own broadcasts on the way.
pub struct SignalingClient {
    identity: LocalIdentity,
    room: RoomToken,
    outbound: broadcast::Sender<SignalMessage>,
    pump: JoinHandle<()>,
    connected: bool,
}

impl SignalingClient {
    /// Attaches to the room and announces presence with a `join`
    /// broadcast. An empty room swallows the announcement, which is
    /// exactly the lone-participant case.
    pub fn connect(
        hub: &RelayHub,
        room: RoomToken,
        identity: LocalIdentity,
        inbound: mpsc::Sender<SignalMessage>,
    ) -> Self {
        let mut handle = hub.connect(&room);
        let outbound = handle.sender();
        let self_id = identity.peer_id.clone();

        let pump = tokio::spawn(async move {
            while let Some(message) = handle.recv().await {
                if message.sender_id == self_id {
                    continue;
                }
                if inbound.send(message).await.is_err() {
                    break;
                }
            }
        });

        let client = Self {
            identity,
            room,
            outbound,
            pump,
            connected: true,
        };
        debug!(room = %client.room, peer = %client.identity.peer_id, "signaling connected");
        if let Err(e) = client.send(SignalBody::Join) {
            warn!(error = %e, "join announcement failed");
        }
        client
    }

    /// Broadcasts a protocol body stamped with the local identity.
    pub fn send(&self, body: SignalBody) -> Result<(), SignalError> {
        if !self.connected {
            return Err(SignalError::Disconnected);
        }
        let message = SignalMessage {
            body,
            sender_id: self.identity.peer_id.clone(),
            sender_name: Some(self.identity.display_name.clone()),
            sender_avatar: self.identity.avatar.clone(),
            target_id: None,
        };
        // no subscriber is not an error, the message just goes nowhere
        let _ = self.outbound.send(message);
        Ok(())
    }

    pub fn peer_id(&self) -> &streamconnect_core::model::PeerId {
        &self.identity.peer_id
    }

    /// Stops the inbound pump and detaches from the relay. Idempotent;
    /// later `send`s report [`SignalError::Disconnected`].
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.pump.abort();
        debug!(room = %self.room, "signaling disconnected");
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

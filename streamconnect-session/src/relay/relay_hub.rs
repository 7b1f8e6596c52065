use dashmap::DashMap;
use std::sync::Arc;
use streamconnect_core::model::{RoomToken, SignalMessage};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Messages buffered per receiver before the oldest are overwritten.
const RELAY_CAPACITY: usize = 256;

/// In-process broadcast fabric connecting every session that shares a
/// room token. No server and no persistence: a message reaches the
/// handles subscribed at send time and nobody else.
#[derive(Clone, Default)]
pub struct RelayHub {
    rooms: Arc<DashMap<RoomToken, broadcast::Sender<SignalMessage>>>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a room, creating its channel on first use.
    pub fn connect(&self, room: &RoomToken) -> RelayHandle {
        let entry = self.rooms.entry(room.clone()).or_insert_with(|| {
            info!(room = %room, "opening relay channel");
            broadcast::channel(RELAY_CAPACITY).0
        });
        let tx = entry.clone();
        // subscribe under the shard lock so a concurrent prune cannot
        // observe zero receivers on a channel that is being joined
        let rx = tx.subscribe();
        drop(entry);
        RelayHandle {
            room: room.clone(),
            hub: self.clone(),
            tx,
            rx: Some(rx),
        }
    }

    /// Handles currently attached to a room.
    pub fn subscriber_count(&self, room: &RoomToken) -> usize {
        self.rooms.get(room).map(|tx| tx.receiver_count()).unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn prune(&self, room: &RoomToken) {
        let removed = self.rooms.remove_if(room, |_, tx| tx.receiver_count() == 0);
        if removed.is_some() {
            debug!(room = %room, "relay channel closed");
        }
    }
}

/// One subscription to a room. Every broadcast is delivered to every
/// live handle on the token, the sender's own included; filtering out
/// self-originated traffic is the consumer's job.
pub struct RelayHandle {
    room: RoomToken,
    hub: RelayHub,
    tx: broadcast::Sender<SignalMessage>,
    rx: Option<broadcast::Receiver<SignalMessage>>,
}

impl RelayHandle {
    pub fn room(&self) -> &RoomToken {
        &self.room
    }

    /// Send half, cloneable independently of the receive loop.
    pub fn sender(&self) -> broadcast::Sender<SignalMessage> {
        self.tx.clone()
    }

    /// Fans the message out to every subscriber. With nobody listening
    /// the message is dropped, which is what an empty room looks like.
    pub fn broadcast(&self, message: SignalMessage) {
        if self.tx.send(message).is_err() {
            debug!(room = %self.room, "broadcast into empty room dropped");
        }
    }

    /// Next message on the channel, in per-sender send order. Returns
    /// `None` once the handle is closed. A receiver that falls behind
    /// the buffer skips ahead to the oldest retained message.
    pub async fn recv(&mut self) -> Option<SignalMessage> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(room = %self.room, skipped, "relay receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Detaches from the room. The channel itself disappears when the
    /// last handle detaches. Idempotent.
    pub fn close(&mut self) {
        if self.rx.take().is_some() {
            self.hub.prune(&self.room);
        }
    }
}

impl Drop for RelayHandle {
    fn drop(&mut self) {
        self.close();
    }
}

use streamconnect_core::{LocalIdentity, RoomToken};

use crate::transport::TransportConfig;

/// Everything a session needs to dial into a room.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room: RoomToken,
    pub identity: LocalIdentity,
    pub transport: TransportConfig,
}

impl SessionConfig {
    pub fn new(room: RoomToken, identity: LocalIdentity) -> Self {
        Self {
            room,
            identity,
            transport: TransportConfig::default(),
        }
    }
}

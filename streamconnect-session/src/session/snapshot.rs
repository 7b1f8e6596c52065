use streamconnect_core::PeerId;

use crate::session::CallState;
use crate::transport::RemoteTrack;

/// Identity of the remote participant, as learned from signaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePeer {
    pub peer_id: PeerId,
    pub name: String,
    pub avatar: String,
}

/// One observable state of a running call.
///
/// The session publishes a fresh snapshot on every change through a watch
/// channel, so consumers always see a consistent view and never have to
/// reassemble state from an event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSnapshot {
    pub state: CallState,
    pub status: String,
    pub remote_peer: Option<RemotePeer>,
    pub remote_tracks: Vec<RemoteTrack>,
    pub mic_enabled: bool,
    pub camera_enabled: bool,
    pub screen_sharing: bool,
}

impl CallSnapshot {
    pub(crate) fn idle() -> Self {
        Self {
            state: CallState::Idle,
            status: String::new(),
            remote_peer: None,
            remote_tracks: Vec::new(),
            mic_enabled: true,
            camera_enabled: true,
            screen_sharing: false,
        }
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use streamconnect_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::media::{MediaSource, MediaTrack};
use crate::transport::{ConnectionGen, TransportConfig, TransportEvent};

/// One peer connection, from negotiation through teardown.
///
/// The session drives this seam with SDP and ICE payloads taken straight
/// from signaling; the implementation reports progress asynchronously
/// through the event channel it was created with.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    fn generation(&self) -> ConnectionGen;

    /// Attaches local capture tracks for sending. Called once, before the
    /// first offer or answer is created.
    async fn attach_media(&self, tracks: Vec<Arc<dyn MediaTrack>>) -> Result<(), TransportError>;

    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    /// Creates an answer and installs it as the local description. Valid
    /// only after a remote offer has been applied.
    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    async fn has_remote_description(&self) -> bool;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// Swaps the outgoing video track in place, without renegotiation.
    async fn replace_video_track(&self, track: Arc<dyn MediaTrack>) -> Result<(), TransportError>;

    async fn local_description(&self) -> Option<SessionDescription>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Factory seam over the RTC stack, covering capture and transport.
#[async_trait]
pub trait RtcBackend: Send + Sync {
    fn media_source(&self) -> Arc<dyn MediaSource>;

    async fn create_transport(
        &self,
        generation: ConnectionGen,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError>;
}

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::media::MediaSource;
use crate::transport::webrtc_media::SyntheticMediaSource;
use crate::transport::webrtc_transport::WebRtcTransport;
use crate::transport::{ConnectionGen, PeerTransport, RtcBackend, TransportConfig, TransportEvent};

/// Production backend: synthetic capture plus real peer connections.
pub struct WebRtcBackend {
    media: Arc<SyntheticMediaSource>,
}

impl WebRtcBackend {
    pub fn new() -> Self {
        Self {
            media: Arc::new(SyntheticMediaSource::new()),
        }
    }
}

impl Default for WebRtcBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RtcBackend for WebRtcBackend {
    fn media_source(&self) -> Arc<dyn MediaSource> {
        Arc::clone(&self.media) as Arc<dyn MediaSource>
    }

    async fn create_transport(
        &self,
        generation: ConnectionGen,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError> {
        let transport = WebRtcTransport::new(generation, config, events).await?;
        Ok(Arc::new(transport) as Arc<dyn PeerTransport>)
    }
}

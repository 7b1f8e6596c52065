mod peer_transport;
mod transport_config;
mod transport_event;
mod webrtc_backend;
mod webrtc_media;
mod webrtc_transport;

pub use peer_transport::{PeerTransport, RtcBackend};
pub use transport_config::TransportConfig;
pub use transport_event::{ConnectionGen, RemoteTrack, TransportEvent};
pub use webrtc_backend::WebRtcBackend;
pub use webrtc_media::{RtcMediaTrack, SyntheticMediaSource};
pub use webrtc_transport::WebRtcTransport;

pub mod error;
pub mod media;
pub mod relay;
pub mod session;
pub mod signaling;
pub mod storage;
pub mod transport;

pub use error::{MediaAccessError, SignalError, StorageError, TransportError};
pub use media::{MediaSource, MediaStream, MediaTrack, TrackKind};
pub use relay::{RelayHandle, RelayHub};
pub use session::{
    CallSession, CallSnapshot, CallState, RemotePeer, SessionCommand, SessionConfig, SessionHandle,
};
pub use signaling::SignalingClient;
pub use storage::ProfileStore;
pub use transport::{
    ConnectionGen, PeerTransport, RemoteTrack, RtcBackend, TransportConfig, TransportEvent,
    WebRtcBackend,
};

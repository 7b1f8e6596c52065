use thiserror::Error;

/// Local capture could not be acquired. The call stays endable but
/// never advances past media acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaAccessError {
    #[error("media access denied: {0}")]
    Denied(String),
    #[error("no capture device available: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("signaling client is disconnected")]
    Disconnected,
}

/// Failures surfaced by a peer transport. Carried as strings so the
/// session layer stays independent of the backing RTC implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport setup failed: {0}")]
    Setup(String),
    #[error("failed to create {kind}: {reason}")]
    CreateDescription { kind: &'static str, reason: String },
    #[error("failed to apply remote description: {0}")]
    ApplyDescription(String),
    #[error("failed to apply ICE candidate: {0}")]
    ApplyCandidate(String),
    #[error("failed to replace outgoing track: {0}")]
    ReplaceTrack(String),
    #[error("no negotiated video sender to replace")]
    NoVideoSender,
    #[error("track does not belong to this backend")]
    IncompatibleTrack,
    #[error("failed to close transport: {0}")]
    Close(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

use streamconnect_core::IceCandidate;

use crate::media::TrackKind;

/// Monotonic tag identifying one transport instance within a session.
///
/// Callback tasks spawned by a transport can outlive it. Every event carries
/// the generation of the transport that produced it so the session loop can
/// discard events from a connection it has already torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionGen(pub u64);

/// Descriptor of a track the remote peer started sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    CandidateGenerated(ConnectionGen, IceCandidate),
    Connected(ConnectionGen),
    Degraded(ConnectionGen),
    TrackReceived(ConnectionGen, RemoteTrack),
}

impl TransportEvent {
    pub fn generation(&self) -> ConnectionGen {
        match self {
            TransportEvent::CandidateGenerated(generation, _)
            | TransportEvent::Connected(generation)
            | TransportEvent::Degraded(generation)
            | TransportEvent::TrackReceived(generation, _) => *generation,
        }
    }
}

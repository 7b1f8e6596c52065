pub mod model;
pub mod utils;

pub use model::{
    IceCandidate, IceServerConfig, LocalIdentity, MeetingRecord, PeerId, RoomToken, SdpKind,
    SessionDescription, SignalBody, SignalMessage, UserProfile,
};

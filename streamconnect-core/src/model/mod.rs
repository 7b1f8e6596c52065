mod history;
mod peer;
mod profile;
mod room;
mod signaling;

pub use history::MeetingRecord;
pub use peer::{LocalIdentity, PeerId};
pub use profile::{UserProfile, avatar_url};
pub use room::{InvalidRoomToken, RoomToken};
pub use signaling::{
    IceCandidate, IceServerConfig, SdpKind, SessionDescription, SignalBody, SignalMessage,
};

mod source;
mod track;

pub use source::MediaSource;
pub use track::{MediaStream, MediaTrack, TrackKind};

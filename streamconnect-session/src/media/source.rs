use async_trait::async_trait;

use crate::error::MediaAccessError;
use crate::media::MediaStream;

/// Provider of local capture streams.
///
/// `user_media` acquires the default microphone and camera pair used for the
/// call itself; `display_media` acquires a screen capture used while sharing.
/// Both may be refused by the platform, which surfaces as
/// [`MediaAccessError`].
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn user_media(&self) -> Result<MediaStream, MediaAccessError>;

    async fn display_media(&self) -> Result<MediaStream, MediaAccessError>;
}

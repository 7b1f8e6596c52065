use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::error::MediaAccessError;
use crate::media::{MediaSource, MediaStream, MediaTrack, TrackKind};

/// 20 ms of Opus silence.
const OPUS_SILENCE: &[u8] = &[0xf8, 0xff, 0xfe];
/// Placeholder VP8 payload; keeps RTP flowing without encoding real frames.
const VP8_FILLER: &[u8] = &[0u8; 64];

const AUDIO_FRAME: Duration = Duration::from_millis(20);
const VIDEO_FRAME: Duration = Duration::from_millis(33);

/// A local track backed by a sample-writing RTP track.
///
/// Each track owns a pump task that feeds synthetic samples for as long as
/// the track lives. Disabling the track pauses the pump, stopping it ends
/// the task for good.
pub struct RtcMediaTrack {
    id: String,
    kind: TrackKind,
    sample_track: Arc<TrackLocalStaticSample>,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl RtcMediaTrack {
    fn new(kind: TrackKind, id: String, stream_id: String) -> Arc<Self> {
        let mime_type = match kind {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };
        let sample_track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            id.clone(),
            stream_id,
        ));
        let track = Arc::new(Self {
            id,
            kind,
            sample_track,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        });
        spawn_sample_writer(Arc::clone(&track));
        track
    }

    pub(crate) fn sample_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.sample_track)
    }
}

impl MediaTrack for RtcMediaTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn spawn_sample_writer(track: Arc<RtcMediaTrack>) {
    let (frame, payload) = match track.kind {
        TrackKind::Audio => (AUDIO_FRAME, Bytes::from_static(OPUS_SILENCE)),
        TrackKind::Video => (VIDEO_FRAME, Bytes::from_static(VP8_FILLER)),
    };
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(frame);
        loop {
            ticker.tick().await;
            if track.is_stopped() {
                debug!(track = %track.id, "sample writer stopped");
                break;
            }
            if !track.is_enabled() {
                continue;
            }
            let sample = Sample {
                data: payload.clone(),
                duration: frame,
                ..Default::default()
            };
            if track.sample_track.write_sample(&sample).await.is_err() {
                break;
            }
        }
    });
}

/// Capture source that synthesizes silent audio and blank video.
///
/// Stands in for real device capture: every acquisition yields fresh tracks
/// with unique ids, so stop/reacquire cycles behave like they would against
/// actual hardware.
pub struct SyntheticMediaSource {
    counter: AtomicU64,
}

impl SyntheticMediaSource {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }
}

impl Default for SyntheticMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn user_media(&self) -> Result<MediaStream, MediaAccessError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let stream_id = format!("capture-{n}");
        let audio = RtcMediaTrack::new(TrackKind::Audio, format!("mic-{n}"), stream_id.clone());
        let video = RtcMediaTrack::new(TrackKind::Video, format!("camera-{n}"), stream_id.clone());
        Ok(MediaStream::new(
            stream_id,
            vec![audio as Arc<dyn MediaTrack>, video],
        ))
    }

    async fn display_media(&self) -> Result<MediaStream, MediaAccessError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let stream_id = format!("display-{n}");
        let screen = RtcMediaTrack::new(TrackKind::Video, format!("screen-{n}"), stream_id.clone());
        Ok(MediaStream::new(
            stream_id,
            vec![screen as Arc<dyn MediaTrack>],
        ))
    }
}

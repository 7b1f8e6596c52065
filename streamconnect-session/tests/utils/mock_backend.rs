use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use streamconnect_core::{IceCandidate, SdpKind, SessionDescription};
use streamconnect_session::{
    ConnectionGen, MediaAccessError, MediaSource, MediaStream, MediaTrack, PeerTransport,
    RtcBackend, TrackKind, TransportConfig, TransportError, TransportEvent,
};
use tokio::sync::mpsc;

/// In-memory track with the same enable/stop semantics as a real one.
pub struct MockTrack {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

impl MockTrack {
    pub fn new(kind: TrackKind, id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
        })
    }
}

impl MediaTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Capture source that remembers every track it ever handed out, so tests
/// can check what happened to them afterwards.
pub struct MockMediaSource {
    deny: AtomicBool,
    counter: AtomicU64,
    tracks: Mutex<Vec<Arc<MockTrack>>>,
}

impl MockMediaSource {
    fn new() -> Self {
        Self {
            deny: AtomicBool::new(false),
            counter: AtomicU64::new(0),
            tracks: Mutex::new(Vec::new()),
        }
    }

    pub fn deny_access(&self) {
        self.deny.store(true, Ordering::SeqCst);
    }

    pub fn created_tracks(&self) -> Vec<Arc<MockTrack>> {
        self.tracks.lock().unwrap().clone()
    }

    pub fn tracks_with_prefix(&self, prefix: &str) -> Vec<Arc<MockTrack>> {
        self.created_tracks()
            .into_iter()
            .filter(|t| t.id().starts_with(prefix))
            .collect()
    }

    pub fn live_track_count(&self) -> usize {
        self.created_tracks()
            .iter()
            .filter(|t| !t.is_stopped())
            .count()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn user_media(&self) -> Result<MediaStream, MediaAccessError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(MediaAccessError::Denied("Permission denied".to_owned()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let audio = MockTrack::new(TrackKind::Audio, format!("mock-mic-{n}"));
        let video = MockTrack::new(TrackKind::Video, format!("mock-camera-{n}"));
        self.tracks
            .lock()
            .unwrap()
            .extend([Arc::clone(&audio), Arc::clone(&video)]);
        Ok(MediaStream::new(
            format!("mock-capture-{n}"),
            vec![audio as Arc<dyn MediaTrack>, video],
        ))
    }

    async fn display_media(&self) -> Result<MediaStream, MediaAccessError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(MediaAccessError::Denied("Permission denied".to_owned()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let screen = MockTrack::new(TrackKind::Video, format!("mock-screen-{n}"));
        self.tracks.lock().unwrap().push(Arc::clone(&screen));
        Ok(MediaStream::new(
            format!("mock-display-{n}"),
            vec![screen as Arc<dyn MediaTrack>],
        ))
    }
}

#[derive(Default)]
struct TransportState {
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    applied_candidates: Vec<IceCandidate>,
    attached_tracks: Vec<Arc<dyn MediaTrack>>,
    outgoing_video: Option<String>,
    replace_calls: usize,
    closed: bool,
}

/// Scripted peer transport.
///
/// Descriptions and candidates whose text contains `poison` are rejected,
/// everything else is recorded. While auto-connect is on, a `Connected`
/// event fires whenever both descriptions are in place.
pub struct MockTransport {
    generation: ConnectionGen,
    events: mpsc::Sender<TransportEvent>,
    auto_connect: Arc<AtomicBool>,
    candidate_count: Arc<AtomicUsize>,
    state: Mutex<TransportState>,
}

impl MockTransport {
    pub async fn fire_connected(&self) {
        let _ = self
            .events
            .send(TransportEvent::Connected(self.generation))
            .await;
    }

    pub async fn fire_degraded(&self) {
        let _ = self
            .events
            .send(TransportEvent::Degraded(self.generation))
            .await;
    }

    /// Injects an arbitrary event, stale generations included.
    pub async fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event).await;
    }

    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.state.lock().unwrap().applied_candidates.clone()
    }

    pub fn attached_track_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .attached_tracks
            .iter()
            .map(|t| t.id().to_owned())
            .collect()
    }

    pub fn outgoing_video(&self) -> Option<String> {
        self.state.lock().unwrap().outgoing_video.clone()
    }

    pub fn replace_calls(&self) -> usize {
        self.state.lock().unwrap().replace_calls
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn local_sdp(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .local_description
            .as_ref()
            .map(|d| d.sdp.clone())
    }

    pub fn has_remote(&self) -> bool {
        self.state.lock().unwrap().remote_description.is_some()
    }

    async fn emit_scripted_candidates(&self) {
        let count = self.candidate_count.load(Ordering::SeqCst);
        for i in 0..count {
            let candidate = IceCandidate {
                candidate: format!("candidate:mock-{}-{i}", self.generation.0),
                sdp_mid: Some("0".to_owned()),
                sdp_mline_index: Some(0),
                username_fragment: None,
            };
            let _ = self
                .events
                .send(TransportEvent::CandidateGenerated(
                    self.generation,
                    candidate,
                ))
                .await;
        }
    }

    async fn maybe_fire_connected(&self) {
        let both = {
            let state = self.state.lock().unwrap();
            state.local_description.is_some() && state.remote_description.is_some()
        };
        if both && self.auto_connect.load(Ordering::SeqCst) {
            self.fire_connected().await;
        }
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    fn generation(&self) -> ConnectionGen {
        self.generation
    }

    async fn attach_media(&self, tracks: Vec<Arc<dyn MediaTrack>>) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(video) = tracks.iter().find(|t| t.kind() == TrackKind::Video) {
            state.outgoing_video = Some(video.id().to_owned());
        }
        state.attached_tracks.extend(tracks);
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let description = SessionDescription {
            kind: SdpKind::Offer,
            sdp: format!("v=0 mock-offer-{}", self.generation.0),
        };
        self.state.lock().unwrap().local_description = Some(description.clone());
        self.emit_scripted_candidates().await;
        self.maybe_fire_connected().await;
        Ok(description)
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        if !self.has_remote() {
            return Err(TransportError::CreateDescription {
                kind: "answer",
                reason: "no remote description".to_owned(),
            });
        }
        let description = SessionDescription {
            kind: SdpKind::Answer,
            sdp: format!("v=0 mock-answer-{}", self.generation.0),
        };
        self.state.lock().unwrap().local_description = Some(description.clone());
        self.emit_scripted_candidates().await;
        self.maybe_fire_connected().await;
        Ok(description)
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        if description.sdp.contains("poison") {
            return Err(TransportError::ApplyDescription(
                "scripted rejection".to_owned(),
            ));
        }
        self.state.lock().unwrap().remote_description = Some(description);
        self.maybe_fire_connected().await;
        Ok(())
    }

    async fn has_remote_description(&self) -> bool {
        self.has_remote()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        if candidate.candidate.contains("poison") {
            return Err(TransportError::ApplyCandidate(
                "scripted rejection".to_owned(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        if state.remote_description.is_none() {
            return Err(TransportError::ApplyCandidate(
                "no remote description".to_owned(),
            ));
        }
        state.applied_candidates.push(candidate);
        Ok(())
    }

    async fn replace_video_track(&self, track: Arc<dyn MediaTrack>) -> Result<(), TransportError> {
        if track.kind() != TrackKind::Video {
            return Err(TransportError::IncompatibleTrack);
        }
        let mut state = self.state.lock().unwrap();
        if state.outgoing_video.is_none() {
            return Err(TransportError::NoVideoSender);
        }
        state.outgoing_video = Some(track.id().to_owned());
        state.replace_calls += 1;
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().unwrap().local_description.clone()
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Backend whose transports are [`MockTransport`]s, kept on a list for
/// inspection after the session used them.
pub struct MockBackend {
    media: Arc<MockMediaSource>,
    auto_connect: Arc<AtomicBool>,
    candidate_count: Arc<AtomicUsize>,
    transports: Mutex<Vec<Arc<MockTransport>>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            media: Arc::new(MockMediaSource::new()),
            auto_connect: Arc::new(AtomicBool::new(true)),
            candidate_count: Arc::new(AtomicUsize::new(2)),
            transports: Mutex::new(Vec::new()),
        })
    }

    pub fn denying_media() -> Arc<Self> {
        let backend = Self::new();
        backend.media.deny_access();
        backend
    }

    pub fn media(&self) -> &MockMediaSource {
        &self.media
    }

    pub fn set_auto_connect(&self, on: bool) {
        self.auto_connect.store(on, Ordering::SeqCst);
    }

    pub fn set_candidate_count(&self, count: usize) {
        self.candidate_count.store(count, Ordering::SeqCst);
    }

    pub fn transport_count(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    pub fn transport(&self, index: usize) -> Arc<MockTransport> {
        Arc::clone(&self.transports.lock().unwrap()[index])
    }
}

#[async_trait]
impl RtcBackend for MockBackend {
    fn media_source(&self) -> Arc<dyn MediaSource> {
        Arc::clone(&self.media) as Arc<dyn MediaSource>
    }

    async fn create_transport(
        &self,
        generation: ConnectionGen,
        _config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError> {
        let transport = Arc::new(MockTransport {
            generation,
            events,
            auto_connect: Arc::clone(&self.auto_connect),
            candidate_count: Arc::clone(&self.candidate_count),
            state: Mutex::new(TransportState::default()),
        });
        self.transports.lock().unwrap().push(Arc::clone(&transport));
        Ok(transport as Arc<dyn PeerTransport>)
    }
}

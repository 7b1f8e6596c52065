use std::collections::VecDeque;
use std::sync::Arc;

use streamconnect_core::model::avatar_url;
use streamconnect_core::{IceCandidate, PeerId, SessionDescription, SignalBody, SignalMessage};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::media::MediaStream;
use crate::relay::RelayHub;
use crate::session::{
    CallSnapshot, CallState, RemotePeer, SessionCommand, SessionConfig, SessionHandle,
};
use crate::signaling::SignalingClient;
use crate::transport::{ConnectionGen, PeerTransport, RtcBackend, TransportEvent};

const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 256;

/// The negotiation engine for one two-party call.
///
/// Runs as a single task that owns every piece of call state and reacts to
/// three inputs: client commands, signal traffic from the room, and events
/// from the peer transport. Handlers run to completion before the next
/// input is taken, so observers never see a half-applied transition.
pub struct CallSession {
    config: SessionConfig,
    backend: Arc<dyn RtcBackend>,
    hub: RelayHub,
    command_rx: mpsc::Receiver<SessionCommand>,
    signal_rx: mpsc::Receiver<SignalMessage>,
    signal_tx: mpsc::Sender<SignalMessage>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    snapshot_tx: watch::Sender<CallSnapshot>,
    snapshot: CallSnapshot,
    signaling: Option<SignalingClient>,
    transport: Option<Arc<dyn PeerTransport>>,
    user_media: Option<MediaStream>,
    screen_media: Option<MediaStream>,
    /// Candidates that arrived before the remote description, applied in
    /// arrival order the moment it lands.
    pending_candidates: VecDeque<IceCandidate>,
    active_generation: ConnectionGen,
    next_generation: u64,
    /// Whether this session has announced `ready` itself; used to break
    /// the tie when two peers greet each other simultaneously.
    ready_sent: bool,
    camera_was_enabled: bool,
}

impl CallSession {
    /// Starts a session task for the given room and hands back its handle.
    pub fn spawn(
        hub: &RelayHub,
        config: SessionConfig,
        backend: Arc<dyn RtcBackend>,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (signal_tx, signal_rx) = mpsc::channel(EVENT_BUFFER);
        let (transport_tx, transport_rx) = mpsc::channel(EVENT_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(CallSnapshot::idle());

        let session = Self {
            config,
            backend,
            hub: hub.clone(),
            command_rx,
            signal_rx,
            signal_tx,
            transport_rx,
            transport_tx,
            snapshot_tx,
            snapshot: CallSnapshot::idle(),
            signaling: None,
            transport: None,
            user_media: None,
            screen_media: None,
            pending_candidates: VecDeque::new(),
            active_generation: ConnectionGen(0),
            next_generation: 0,
            ready_sent: false,
            camera_was_enabled: true,
        };
        let task = tokio::spawn(session.run());
        SessionHandle::new(command_tx, snapshot_rx, task)
    }

    async fn run(mut self) {
        debug!(room = %self.config.room, "call session started");
        self.start_call().await;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(command) => {
                            self.handle_command(command).await;
                            if self.snapshot.state.is_terminal() {
                                break;
                            }
                        }
                        None => {
                            debug!("session handle dropped, hanging up");
                            self.end_call().await;
                            break;
                        }
                    }
                }

                // the session keeps its own sender clones, so these
                // channels never close while the loop runs
                Some(message) = self.signal_rx.recv() => {
                    self.handle_signal(message).await;
                }

                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }
            }
        }

        debug!(room = %self.config.room, "call session finished");
    }

    /// Acquires media, builds the transport and announces presence. Any
    /// failure leaves the session parked before the failed step; the call
    /// can still be ended normally.
    async fn start_call(&mut self) {
        self.set_state(CallState::AcquiringMedia, "Initializing media...");
        self.publish();

        let media = match self.backend.media_source().user_media().await {
            Ok(media) => media,
            Err(e) => {
                warn!(error = %e, "media acquisition failed");
                self.set_status(e.to_string());
                self.publish();
                return;
            }
        };
        self.snapshot.mic_enabled = media.audio().map(|t| t.is_enabled()).unwrap_or(false);
        self.snapshot.camera_enabled = media.video().map(|t| t.is_enabled()).unwrap_or(false);
        self.user_media = Some(media);

        let transport = match self.create_transport().await {
            Ok(transport) => transport,
            Err(e) => {
                warn!(error = %e, "transport setup failed");
                self.set_status(e.to_string());
                self.publish();
                return;
            }
        };

        // attach before announcing so the first offer or answer already
        // covers every local track
        let tracks = self
            .user_media
            .as_ref()
            .map(|m| m.live_tracks())
            .unwrap_or_default();
        if let Err(e) = transport.attach_media(tracks).await {
            warn!(error = %e, "failed to attach local media");
            self.set_status(e.to_string());
            self.publish();
            return;
        }
        self.active_generation = transport.generation();
        self.transport = Some(transport);

        self.signaling = Some(SignalingClient::connect(
            &self.hub,
            self.config.room.clone(),
            self.config.identity.clone(),
            self.signal_tx.clone(),
        ));

        self.set_state(CallState::WaitingForPeer, "Waiting for others...");
        self.publish();
    }

    async fn create_transport(&mut self) -> Result<Arc<dyn PeerTransport>, TransportError> {
        self.next_generation += 1;
        let generation = ConnectionGen(self.next_generation);
        self.backend
            .create_transport(generation, &self.config.transport, self.transport_tx.clone())
            .await
    }

    async fn handle_signal(&mut self, message: SignalMessage) {
        if self.snapshot.state.is_terminal() {
            return;
        }
        // every message names its sender; any of them may be the first
        // word from the other side
        self.refresh_remote_info(&message);
        let SignalMessage {
            body, sender_id, ..
        } = message;
        match body {
            SignalBody::Join => self.on_peer_join(&sender_id).await,
            SignalBody::Ready => self.on_peer_ready(&sender_id).await,
            SignalBody::Offer(description) => self.on_remote_offer(description).await,
            SignalBody::Answer(description) => self.on_remote_answer(description).await,
            SignalBody::IceCandidate(candidate) => self.on_remote_candidate(candidate).await,
        }
    }

    fn refresh_remote_info(&mut self, message: &SignalMessage) {
        let name = message
            .sender_name
            .clone()
            .unwrap_or_else(|| "Guest".to_owned());
        let avatar = message
            .sender_avatar
            .clone()
            .unwrap_or_else(|| avatar_url(&name));
        let remote = RemotePeer {
            peer_id: message.sender_id.clone(),
            name,
            avatar,
        };
        if self.snapshot.remote_peer.as_ref() != Some(&remote) {
            self.snapshot.remote_peer = Some(remote);
            self.publish();
        }
    }

    /// A peer announced itself; greet it with `ready` so it knows the
    /// room is not empty and can start the offer.
    async fn on_peer_join(&mut self, sender_id: &PeerId) {
        if !self.snapshot.state.accepts_peers() {
            debug!(peer = %sender_id, state = ?self.snapshot.state, "ignoring join");
            return;
        }
        let name = self
            .snapshot
            .remote_peer
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Guest".to_owned());
        self.set_status(format!("{name} joined..."));
        self.publish();
        self.ready_sent = true;
        self.signal_send(SignalBody::Ready);
    }

    /// The other side greeted us, so it is our turn to offer. When both
    /// sides greeted (their joins crossed), only the greater peer id
    /// offers and the other waits for it.
    async fn on_peer_ready(&mut self, sender_id: &PeerId) {
        if self.snapshot.state != CallState::WaitingForPeer {
            debug!(state = ?self.snapshot.state, "ignoring ready");
            return;
        }
        if self.ready_sent && self.config.identity.peer_id < *sender_id {
            debug!(peer = %sender_id, "yielding the offer to the peer");
            return;
        }
        let Some(transport) = self.transport.clone() else {
            return;
        };
        match transport.create_offer().await {
            Ok(offer) => {
                self.signal_send(SignalBody::Offer(offer));
                self.set_state(CallState::Negotiating, "Negotiating...");
                self.publish();
            }
            Err(e) => warn!(error = %e, "failed to create offer"),
        }
    }

    async fn on_remote_offer(&mut self, description: SessionDescription) {
        if !matches!(
            self.snapshot.state,
            CallState::WaitingForPeer | CallState::Negotiating | CallState::Disconnected
        ) {
            debug!(state = ?self.snapshot.state, "ignoring offer");
            return;
        }
        let Some(transport) = self.transport.clone() else {
            return;
        };
        if let Err(e) = transport.set_remote_description(description).await {
            warn!(error = %e, "failed to apply remote offer");
            return;
        }
        self.drain_pending_candidates().await;
        match transport.create_answer().await {
            Ok(answer) => {
                self.signal_send(SignalBody::Answer(answer));
                self.set_state(CallState::Negotiating, "Connecting...");
                self.publish();
            }
            Err(e) => warn!(error = %e, "failed to create answer"),
        }
    }

    async fn on_remote_answer(&mut self, description: SessionDescription) {
        if self.snapshot.state != CallState::Negotiating {
            debug!(state = ?self.snapshot.state, "ignoring answer");
            return;
        }
        let Some(transport) = self.transport.clone() else {
            return;
        };
        if let Err(e) = transport.set_remote_description(description).await {
            warn!(error = %e, "failed to apply remote answer");
            return;
        }
        self.drain_pending_candidates().await;
        self.set_status("Connecting...");
        self.publish();
    }

    /// Applies a candidate immediately when the remote description is in
    /// place, otherwise parks it until one lands.
    async fn on_remote_candidate(&mut self, candidate: IceCandidate) {
        let Some(transport) = self.transport.clone() else {
            self.pending_candidates.push_back(candidate);
            return;
        };
        if transport.has_remote_description().await {
            if let Err(e) = transport.add_ice_candidate(candidate).await {
                warn!(error = %e, "failed to apply ICE candidate");
            }
        } else {
            self.pending_candidates.push_back(candidate);
        }
    }

    /// Flushes the parked candidates in arrival order. A candidate the
    /// transport rejects is dropped; the rest still go through.
    async fn drain_pending_candidates(&mut self) {
        let Some(transport) = self.transport.clone() else {
            return;
        };
        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(e) = transport.add_ice_candidate(candidate).await {
                warn!(error = %e, "failed to apply queued ICE candidate");
            }
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.snapshot.state.is_terminal() {
            return;
        }
        if event.generation() != self.active_generation {
            debug!(generation = ?event.generation(), "discarding event from stale transport");
            return;
        }
        match event {
            TransportEvent::CandidateGenerated(_, candidate) => {
                self.signal_send(SignalBody::IceCandidate(candidate));
            }
            TransportEvent::Connected(_) => {
                info!(room = %self.config.room, "peer connection established");
                self.set_state(CallState::Connected, "Connected");
                self.publish();
            }
            TransportEvent::Degraded(_) => {
                info!(room = %self.config.room, "peer connection lost");
                self.snapshot.remote_peer = None;
                self.snapshot.remote_tracks.clear();
                self.set_state(CallState::Disconnected, "Peer disconnected");
                self.publish();
            }
            TransportEvent::TrackReceived(_, track) => {
                if !self.snapshot.remote_tracks.iter().any(|t| t.id == track.id) {
                    self.snapshot.remote_tracks.push(track);
                    self.publish();
                }
            }
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SetMicEnabled(enabled) => {
                if let Some(track) = self.user_media.as_ref().and_then(|m| m.audio()) {
                    track.set_enabled(enabled);
                }
                self.snapshot.mic_enabled = enabled;
                self.publish();
            }
            SessionCommand::SetCameraEnabled(enabled) => {
                // the camera track is lent to the share while sharing;
                // the toggle is a no-op until the share ends
                if self.screen_media.is_none() {
                    if let Some(track) = self.user_media.as_ref().and_then(|m| m.video()) {
                        track.set_enabled(enabled);
                    }
                    self.snapshot.camera_enabled = enabled;
                    self.publish();
                }
            }
            SessionCommand::StartScreenShare => self.start_screen_share().await,
            SessionCommand::StopScreenShare => self.stop_screen_share().await,
            SessionCommand::EndCall => self.end_call().await,
        }
    }

    /// Swaps the outgoing video to a fresh screen capture. The peer sees
    /// the new frames on the already negotiated sender, no renegotiation.
    async fn start_screen_share(&mut self) {
        if self.screen_media.is_some() {
            return;
        }
        let Some(transport) = self.transport.clone() else {
            return;
        };
        let display = match self.backend.media_source().display_media().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "screen capture failed");
                return;
            }
        };
        let Some(screen_track) = display.video().cloned() else {
            display.stop_all();
            return;
        };
        match transport.replace_video_track(screen_track).await {
            Ok(()) => {
                self.camera_was_enabled = self.snapshot.camera_enabled;
                if let Some(camera) = self.user_media.as_ref().and_then(|m| m.video()) {
                    camera.set_enabled(false);
                }
                self.snapshot.camera_enabled = false;
                self.snapshot.screen_sharing = true;
                self.screen_media = Some(display);
                self.publish();
            }
            Err(e) => {
                warn!(error = %e, "failed to start screen share");
                display.stop_all();
            }
        }
    }

    /// Ends the share, restores the camera track and its previous
    /// enabled state.
    async fn stop_screen_share(&mut self) {
        let Some(display) = self.screen_media.take() else {
            return;
        };
        display.stop_all();
        self.snapshot.screen_sharing = false;
        self.snapshot.camera_enabled = self.camera_was_enabled;
        let transport = self.transport.clone();
        if let Some(camera) = self.user_media.as_ref().and_then(|m| m.video()) {
            camera.set_enabled(self.camera_was_enabled);
            if let Some(transport) = transport {
                if let Err(e) = transport.replace_video_track(Arc::clone(camera)).await {
                    warn!(error = %e, "failed to restore camera track");
                }
            }
        }
        self.publish();
    }

    /// Releases everything in order: captures, transport, signaling.
    /// Safe to call twice; the second call finds a terminated session.
    async fn end_call(&mut self) {
        if self.snapshot.state.is_terminal() {
            return;
        }
        info!(room = %self.config.room, "ending call");
        if let Some(display) = self.screen_media.take() {
            display.stop_all();
        }
        if let Some(media) = self.user_media.take() {
            media.stop_all();
        }
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!(error = %e, "transport close failed");
            }
        }
        self.active_generation = ConnectionGen(0);
        if let Some(mut signaling) = self.signaling.take() {
            signaling.disconnect();
        }
        self.pending_candidates.clear();
        self.snapshot.remote_peer = None;
        self.snapshot.remote_tracks.clear();
        self.snapshot.screen_sharing = false;
        self.set_state(CallState::Terminated, "Call ended");
        self.publish();
    }

    fn signal_send(&mut self, body: SignalBody) {
        let Some(signaling) = self.signaling.as_ref() else {
            return;
        };
        if let Err(e) = signaling.send(body) {
            warn!(error = %e, "dropped outbound signal");
        }
    }

    fn set_state(&mut self, state: CallState, status: impl Into<String>) {
        if self.snapshot.state != state {
            debug!(from = ?self.snapshot.state, to = ?state, "call state changed");
        }
        self.snapshot.state = state;
        self.snapshot.status = status.into();
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.snapshot.status = status.into();
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send(self.snapshot.clone());
    }
}

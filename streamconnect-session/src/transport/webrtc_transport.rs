use std::sync::Arc;

use async_trait::async_trait;
use streamconnect_core::{IceCandidate, SdpKind, SessionDescription};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::error::TransportError;
use crate::media::{MediaTrack, TrackKind};
use crate::transport::webrtc_media::RtcMediaTrack;
use crate::transport::{
    ConnectionGen, PeerTransport, RemoteTrack, TransportConfig, TransportEvent,
};

/// [`PeerTransport`] over a real RTCPeerConnection.
pub struct WebRtcTransport {
    generation: ConnectionGen,
    peer_connection: Arc<RTCPeerConnection>,
    video_sender: Mutex<Option<Arc<RTCRtpSender>>>,
}

impl WebRtcTransport {
    pub(crate) async fn new(
        generation: ConnectionGen,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, TransportError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| TransportError::Setup(e.to_string()))?,
        );

        // Trickle ICE: every locally gathered candidate goes up to the
        // session, which relays it to the peer.
        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(
                        generation,
                        IceCandidate {
                            candidate: init.candidate,
                            sdp_mid: init.sdp_mid,
                            sdp_mline_index: init.sdp_mline_index,
                            username_fragment: init.username_fragment,
                        },
                    ))
                    .await;
            })
        }));

        let state_tx = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |state: RTCIceConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    debug!(?state, "ICE connection state changed");
                    match state {
                        RTCIceConnectionState::Connected | RTCIceConnectionState::Completed => {
                            let _ = tx.send(TransportEvent::Connected(generation)).await;
                        }
                        RTCIceConnectionState::Disconnected | RTCIceConnectionState::Failed => {
                            let _ = tx.send(TransportEvent::Degraded(generation)).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let descriptor = RemoteTrack {
                    id: track.id(),
                    kind: match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    },
                };
                Box::pin(async move {
                    let _ = tx
                        .send(TransportEvent::TrackReceived(generation, descriptor))
                        .await;
                })
            },
        ));

        Ok(Self {
            generation,
            peer_connection,
            video_sender: Mutex::new(None),
        })
    }

    fn sample_track(
        track: &Arc<dyn MediaTrack>,
    ) -> Result<Arc<dyn TrackLocal + Send + Sync>, TransportError> {
        let concrete = track
            .as_any()
            .downcast_ref::<RtcMediaTrack>()
            .ok_or(TransportError::IncompatibleTrack)?;
        Ok(concrete.sample_track() as Arc<dyn TrackLocal + Send + Sync>)
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    fn generation(&self) -> ConnectionGen {
        self.generation
    }

    async fn attach_media(&self, tracks: Vec<Arc<dyn MediaTrack>>) -> Result<(), TransportError> {
        for track in tracks {
            let local = Self::sample_track(&track)?;
            let sender = self
                .peer_connection
                .add_track(local)
                .await
                .map_err(|e| TransportError::Setup(e.to_string()))?;
            if track.kind() == TrackKind::Video {
                *self.video_sender.lock().await = Some(sender);
            }
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| TransportError::CreateDescription {
                kind: "offer",
                reason: e.to_string(),
            })?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(|e| TransportError::CreateDescription {
                kind: "offer",
                reason: e.to_string(),
            })?;
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: offer.sdp,
        })
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| TransportError::CreateDescription {
                kind: "answer",
                reason: e.to_string(),
            })?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(|e| TransportError::CreateDescription {
                kind: "answer",
                reason: e.to_string(),
            })?;
        Ok(SessionDescription {
            kind: SdpKind::Answer,
            sdp: answer.sdp,
        })
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp),
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp),
        }
        .map_err(|e| TransportError::ApplyDescription(e.to_string()))?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| TransportError::ApplyDescription(e.to_string()))
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| TransportError::ApplyCandidate(e.to_string()))
    }

    async fn replace_video_track(&self, track: Arc<dyn MediaTrack>) -> Result<(), TransportError> {
        if track.kind() != TrackKind::Video {
            return Err(TransportError::IncompatibleTrack);
        }
        let local = Self::sample_track(&track)?;
        let guard = self.video_sender.lock().await;
        let sender = guard.as_ref().ok_or(TransportError::NoVideoSender)?;
        sender
            .replace_track(Some(local))
            .await
            .map_err(|e| TransportError::ReplaceTrack(e.to_string()))
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let desc = self.peer_connection.local_description().await?;
        let kind = match desc.sdp_type {
            webrtc::peer_connection::sdp::sdp_type::RTCSdpType::Offer => SdpKind::Offer,
            _ => SdpKind::Answer,
        };
        Some(SessionDescription {
            kind,
            sdp: desc.sdp,
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        if let Err(e) = self.peer_connection.close().await {
            warn!(error = %e, "peer connection close reported an error");
            return Err(TransportError::Close(e.to_string()));
        }
        Ok(())
    }
}

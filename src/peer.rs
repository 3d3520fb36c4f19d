use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_remote::TrackRemote;

use crate::error::Result;
use crate::media::LocalTrack;
use crate::signaling::{ParticipantId, ParticipantRole, SignalingMessage, SignalingSender};

/// Per-connection negotiation progress, tracked alongside the underlying
/// peer connection's own state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    HaveLocalOffer,
    HaveRemoteOffer,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationState::New => write!(f, "new"),
            NegotiationState::HaveLocalOffer => write!(f, "have-local-offer"),
            NegotiationState::HaveRemoteOffer => write!(f, "have-remote-offer"),
            NegotiationState::Connected => write!(f, "connected"),
            NegotiationState::Disconnected => write!(f, "disconnected"),
            NegotiationState::Failed => write!(f, "failed"),
            NegotiationState::Closed => write!(f, "closed"),
        }
    }
}

/// Raised by peer-connection callbacks and drained by the session dispatcher.
/// Callbacks never touch session state directly; going through a channel
/// keeps them deadlock-free while the session holds its own lock.
pub(crate) enum PcEvent {
    StateChanged {
        participant_id: ParticipantId,
        state: RTCPeerConnectionState,
    },
    Track {
        participant_id: ParticipantId,
        track: Arc<TrackRemote>,
    },
}

/// Everything a new connection needs to talk back to the session and the
/// signaling channel.
#[derive(Clone)]
pub(crate) struct PeerWiring {
    pub(crate) room_id: String,
    pub(crate) local_id: ParticipantId,
    pub(crate) outbound: SignalingSender,
    pub(crate) pc_events: mpsc::UnboundedSender<PcEvent>,
}

pub(crate) async fn open_peer_connection(
    ice_servers: &[RTCIceServer],
) -> Result<Arc<RTCPeerConnection>> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;

    let mut registry = Registry::new();
    registry = register_default_interceptors(registry, &mut media_engine)?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let config = RTCConfiguration {
        ice_servers: ice_servers.to_vec(),
        ..Default::default()
    };

    Ok(Arc::new(api.new_peer_connection(config).await?))
}

pub struct ParticipantConnection {
    pub(crate) participant_id: ParticipantId,
    pub(crate) display_name: String,
    pub(crate) role: ParticipantRole,
    pub(crate) negotiation: NegotiationState,
    pub(crate) is_muted: bool,
    pub(crate) is_video_off: bool,
    pub(crate) remote_audio: Option<Arc<TrackRemote>>,
    pub(crate) remote_video: Option<Arc<TrackRemote>>,
    pc: Arc<RTCPeerConnection>,
    video_sender: Arc<RTCRtpSender>,
}

impl ParticipantConnection {
    /// Allocates the negotiation object for one remote participant: attaches
    /// the shared local tracks and registers candidate/track/state callbacks.
    /// Offer creation is a separate step so responders can wait.
    pub(crate) async fn create(
        participant_id: ParticipantId,
        display_name: String,
        role: ParticipantRole,
        ice_servers: &[RTCIceServer],
        audio_track: &LocalTrack,
        video_track: &LocalTrack,
        wiring: PeerWiring,
    ) -> Result<Self> {
        let pc = open_peer_connection(ice_servers).await?;

        pc.add_track(audio_track.rtc_track()).await?;
        let video_sender = pc.add_track(video_track.rtc_track()).await?;

        // Discovered candidates go straight out, one message per candidate,
        // addressed to this peer only.
        {
            let wiring = wiring.clone();
            pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                let wiring = wiring.clone();
                Box::pin(async move {
                    let Some(candidate) = candidate else {
                        return;
                    };
                    let init = match candidate.to_json() {
                        Ok(init) => init,
                        Err(e) => {
                            tracing::warn!("failed to serialize ICE candidate: {}", e);
                            return;
                        }
                    };
                    let json = match serde_json::to_string(&init) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!("failed to encode ICE candidate: {}", e);
                            return;
                        }
                    };
                    if let Err(e) = wiring
                        .outbound
                        .send(SignalingMessage::IceCandidate {
                            room_id: wiring.room_id.clone(),
                            from_participant_id: wiring.local_id,
                            target_participant_id: participant_id,
                            candidate: json,
                        })
                        .await
                    {
                        tracing::debug!("dropping local ICE candidate: {}", e);
                    }
                })
            }));
        }

        {
            let tx = wiring.pc_events.clone();
            pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                let _ = tx.send(PcEvent::StateChanged {
                    participant_id,
                    state,
                });
                Box::pin(async {})
            }));
        }

        {
            let tx = wiring.pc_events.clone();
            pc.on_track(Box::new(move |track, _receiver, _transceiver| {
                let _ = tx.send(PcEvent::Track {
                    participant_id,
                    track,
                });
                Box::pin(async {})
            }));
        }

        Ok(Self {
            participant_id,
            display_name,
            role,
            negotiation: NegotiationState::New,
            is_muted: false,
            is_video_off: false,
            remote_audio: None,
            remote_video: None,
            pc,
            video_sender,
        })
    }

    /// Initiator path: create an offer and install it locally. Returns the
    /// serialized description to send to the peer.
    pub(crate) async fn initiate(&mut self) -> Result<String> {
        let offer = self.pc.create_offer(None).await?;
        self.pc.set_local_description(offer.clone()).await?;
        self.negotiation = NegotiationState::HaveLocalOffer;
        Ok(serde_json::to_string(&offer)?)
    }

    /// Responder path: apply the remote offer and produce the answer to send
    /// back. On failure the connection stays in its previous state.
    pub(crate) async fn accept_offer(&mut self, sdp: &str) -> Result<String> {
        let offer: RTCSessionDescription = serde_json::from_str(sdp)?;
        self.pc.set_remote_description(offer).await?;
        self.negotiation = NegotiationState::HaveRemoteOffer;

        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer.clone()).await?;
        Ok(serde_json::to_string(&answer)?)
    }

    pub(crate) async fn accept_answer(&mut self, sdp: &str) -> Result<()> {
        let answer: RTCSessionDescription = serde_json::from_str(sdp)?;
        self.pc.set_remote_description(answer).await?;
        Ok(())
    }

    pub(crate) async fn add_remote_candidate(&self, candidate: &str) -> Result<()> {
        let init: RTCIceCandidateInit = serde_json::from_str(candidate)?;
        self.pc.add_ice_candidate(init).await?;
        Ok(())
    }

    /// Swaps the outgoing video source without renegotiating the transport.
    pub(crate) async fn replace_video_track(&self, track: &LocalTrack) -> Result<()> {
        self.video_sender.replace_track(Some(track.rtc_track())).await?;
        Ok(())
    }

    pub(crate) async fn outgoing_video_track_id(&self) -> Option<String> {
        self.video_sender
            .track()
            .await
            .map(|track| track.id().to_owned())
    }

    pub(crate) fn peer_connection(&self) -> Arc<RTCPeerConnection> {
        Arc::clone(&self.pc)
    }

    pub(crate) fn signaling_state(&self) -> RTCSignalingState {
        self.pc.signaling_state()
    }

    pub(crate) fn apply_pc_state(&mut self, state: RTCPeerConnectionState) {
        if self.negotiation == NegotiationState::Closed {
            return;
        }
        match state {
            RTCPeerConnectionState::Connected => {
                self.negotiation = NegotiationState::Connected;
            }
            RTCPeerConnectionState::Disconnected => {
                self.negotiation = NegotiationState::Disconnected;
            }
            RTCPeerConnectionState::Failed => {
                self.negotiation = NegotiationState::Failed;
            }
            RTCPeerConnectionState::Closed => {
                self.negotiation = NegotiationState::Closed;
            }
            _ => {}
        }
    }

    pub(crate) async fn close(&mut self) {
        self.negotiation = NegotiationState::Closed;
        if let Err(e) = self.pc.close().await {
            tracing::debug!(
                "closing connection to participant {}: {}",
                self.participant_id,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signaling::SignalingClient;

    async fn test_connection(
        participant_id: ParticipantId,
    ) -> (
        ParticipantConnection,
        mpsc::Receiver<SignalingMessage>,
        mpsc::UnboundedReceiver<PcEvent>,
    ) {
        let (out_tx, out_rx) = mpsc::channel(32);
        let (in_tx, in_rx) = mpsc::channel(1);
        drop(in_tx);
        let (sender, _receiver) = SignalingClient::from_parts(out_tx, in_rx).split();
        let (pc_tx, pc_rx) = mpsc::unbounded_channel();

        let wiring = PeerWiring {
            room_id: "room-test".to_string(),
            local_id: 1,
            outbound: sender,
            pc_events: pc_tx,
        };
        let audio = LocalTrack::audio();
        let video = LocalTrack::camera();
        let conn = ParticipantConnection::create(
            participant_id,
            format!("participant-{}", participant_id),
            ParticipantRole::Member,
            &[],
            &audio,
            &video,
            wiring,
        )
        .await
        .expect("create connection");
        (conn, out_rx, pc_rx)
    }

    #[tokio::test]
    async fn offer_answer_handshake_reaches_stable() {
        let (mut initiator, _out_a, _pc_a) = test_connection(2).await;
        let (mut responder, _out_b, _pc_b) = test_connection(3).await;

        let offer = initiator.initiate().await.expect("offer");
        assert_eq!(initiator.negotiation, NegotiationState::HaveLocalOffer);

        let answer = responder.accept_offer(&offer).await.expect("answer");
        assert_eq!(responder.negotiation, NegotiationState::HaveRemoteOffer);
        assert_eq!(responder.signaling_state(), RTCSignalingState::Stable);

        initiator.accept_answer(&answer).await.expect("apply answer");
        assert_eq!(initiator.signaling_state(), RTCSignalingState::Stable);

        initiator.close().await;
        responder.close().await;
    }

    #[tokio::test]
    async fn malformed_candidate_is_rejected_not_fatal() {
        let (conn, _out, _pc) = test_connection(4).await;
        assert!(conn.add_remote_candidate("not json").await.is_err());
        assert!(conn
            .add_remote_candidate("{\"candidate\":\"bogus\"}")
            .await
            .is_err());
        assert_eq!(conn.negotiation, NegotiationState::New);
    }

    #[tokio::test]
    async fn failed_offer_application_keeps_prior_state() {
        let (mut conn, _out, _pc) = test_connection(5).await;
        assert!(conn.accept_offer("{\"broken\":true}").await.is_err());
        assert_eq!(conn.negotiation, NegotiationState::New);
    }
}

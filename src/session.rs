use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, watch, Mutex, Notify};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

use crate::connection::{ConnectionMonitor, ConnectionState};
use crate::error::{Error, Result};
use crate::events::{EndReason, SessionEvent};
use crate::media::{LocalMedia, LocalTrack, MediaConstraints, MediaDevices};
use crate::metrics::spawn_quality_monitor;
use crate::peer::{NegotiationState, ParticipantConnection, PcEvent, PeerWiring};
use crate::room::{ParticipantSummary, PeerRegistry};
use crate::signaling::{
    ParticipantId, ParticipantInfo, SignalingClient, SignalingMessage, SignalingSender,
};

pub fn default_ice_servers() -> Vec<RTCIceServer> {
    vec![RTCIceServer {
        urls: vec![
            "stun:stun.l.google.com:19302".to_owned(),
            "stun:stun1.l.google.com:19302".to_owned(),
            "stun:stun2.l.google.com:19302".to_owned(),
        ],
        ..Default::default()
    }]
}

#[derive(Clone)]
pub struct MeetingConfig {
    pub room_id: String,
    pub local: ParticipantInfo,
    pub ice_servers: Vec<RTCIceServer>,
    pub constraints: MediaConstraints,
}

impl MeetingConfig {
    pub fn new(room_id: impl Into<String>, local: ParticipantInfo) -> Self {
        Self {
            room_id: room_id.into(),
            local,
            ice_servers: default_ice_servers(),
            constraints: MediaConstraints::default(),
        }
    }
}

struct Inner {
    registry: PeerRegistry,
    media: LocalMedia,
    is_audio_muted: bool,
    is_video_off: bool,
    is_screen_sharing: bool,
}

/// One meeting call: owns local capture, every peer connection, and the
/// signaling dispatch for one room.
///
/// All mutable state sits behind a single async lock, so a signaling handler
/// or a control call runs as one uninterrupted turn. Peer-connection
/// callbacks never take that lock; they post to an internal channel drained
/// by the dispatcher, which is what makes closing a connection while a
/// handler runs safe.
pub struct MeetingSession {
    config: MeetingConfig,
    signaling: SignalingSender,
    devices: Arc<dyn MediaDevices>,
    inner: Mutex<Inner>,
    monitor: ConnectionMonitor,
    events: broadcast::Sender<SessionEvent>,
    pc_events: mpsc::UnboundedSender<PcEvent>,
    closed: AtomicBool,
    shutdown: Notify,
    weak_self: Weak<MeetingSession>,
}

impl MeetingSession {
    /// Joins the room over an already-connected signaling channel: acquire
    /// local capture, announce the join, start dispatching. A capture failure
    /// aborts the whole bootstrap and drops the channel, so no subscription
    /// outlives a half-built session.
    pub async fn join(
        config: MeetingConfig,
        channel: SignalingClient,
        devices: Arc<dyn MediaDevices>,
    ) -> Result<Arc<Self>> {
        let (sender, receiver) = channel.split();
        let monitor = ConnectionMonitor::new();
        monitor.update(ConnectionState::Connecting);

        let user_media = devices.open_user_media(&config.constraints).await?;

        sender
            .send(SignalingMessage::JoinRoom {
                room_id: config.room_id.clone(),
            })
            .await?;
        monitor.update(ConnectionState::Connected);

        let (events, _) = broadcast::channel(100);
        let (pc_tx, pc_rx) = mpsc::unbounded_channel();

        let session = Arc::new_cyclic(|weak| Self {
            config,
            signaling: sender,
            devices,
            inner: Mutex::new(Inner {
                registry: PeerRegistry::new(),
                media: LocalMedia::new(user_media),
                is_audio_muted: false,
                is_video_off: false,
                is_screen_sharing: false,
            }),
            monitor,
            events,
            pc_events: pc_tx,
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
            weak_self: weak.clone(),
        });
        session.emit(SessionEvent::ConnectionStateChanged(
            ConnectionState::Connected,
        ));
        Self::spawn_dispatcher(Arc::clone(&session), receiver, pc_rx);
        Ok(session)
    }

    fn spawn_dispatcher(
        session: Arc<Self>,
        mut signaling_rx: mpsc::Receiver<SignalingMessage>,
        mut pc_rx: mpsc::UnboundedReceiver<PcEvent>,
    ) {
        tokio::spawn(async move {
            let mut signaling_open = true;
            loop {
                tokio::select! {
                    _ = session.shutdown.notified() => break,
                    msg = signaling_rx.recv(), if signaling_open => match msg {
                        Some(msg) => {
                            if let Err(e) = session.handle_signaling(msg).await {
                                tracing::warn!("signaling handler failed: {}", e);
                            }
                        }
                        None => {
                            // The channel is gone; established media paths
                            // keep running, new negotiations cannot start.
                            signaling_open = false;
                            if !session.is_closed() {
                                tracing::warn!("signaling channel disconnected");
                                session.monitor.update(ConnectionState::Disconnected);
                                session.emit(SessionEvent::ConnectionStateChanged(
                                    ConnectionState::Disconnected,
                                ));
                            }
                        }
                    },
                    ev = pc_rx.recv() => match ev {
                        Some(ev) => session.handle_pc_event(ev).await,
                        None => break,
                    },
                }
            }
        });
    }

    async fn handle_signaling(&self, msg: SignalingMessage) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        let local_id = self.config.local.participant_id;

        match msg {
            SignalingMessage::RoomJoined { participants, .. } => {
                // Existing members will initiate toward us; seed responder
                // connections for each of them.
                for info in participants {
                    if info.participant_id == local_id {
                        continue;
                    }
                    if let Err(e) = self.create_connection(info, false).await {
                        tracing::warn!("failed to add roster participant: {}", e);
                    }
                }
            }
            SignalingMessage::ParticipantJoined {
                participant_id,
                display_name,
                role,
                ..
            } => {
                if participant_id == local_id {
                    return Ok(());
                }
                let info = ParticipantInfo {
                    participant_id,
                    display_name: display_name.clone(),
                    role,
                };
                self.create_connection(info, true).await?;
                self.emit(SessionEvent::Notification(format!(
                    "{} joined the meeting",
                    display_name
                )));
            }
            SignalingMessage::ParticipantLeft {
                participant_id,
                display_name,
                ..
            } => {
                let removed = {
                    let mut inner = self.inner.lock().await;
                    inner.registry.remove(participant_id).await
                };
                if removed {
                    self.emit(SessionEvent::ParticipantLeft { participant_id });
                    self.emit(SessionEvent::Notification(format!(
                        "{} left the meeting",
                        display_name
                    )));
                }
            }
            SignalingMessage::Offer {
                from_participant_id,
                sdp,
                ..
            } => self.handle_offer(from_participant_id, &sdp).await?,
            SignalingMessage::Answer {
                from_participant_id,
                sdp,
                ..
            } => self.handle_answer(from_participant_id, &sdp).await,
            SignalingMessage::IceCandidate {
                from_participant_id,
                candidate,
                ..
            } => self.handle_candidate(from_participant_id, &candidate).await,
            SignalingMessage::AudioStateChanged {
                participant_id,
                is_muted,
                ..
            } => {
                if participant_id == local_id {
                    return Ok(());
                }
                let mut inner = self.inner.lock().await;
                match inner.registry.get_mut(participant_id) {
                    Some(conn) => {
                        conn.is_muted = is_muted;
                        drop(inner);
                        self.emit(SessionEvent::RemoteAudioChanged {
                            participant_id,
                            is_muted,
                        });
                    }
                    None => tracing::warn!(
                        "audio state for unknown participant {}",
                        participant_id
                    ),
                }
            }
            SignalingMessage::VideoStateChanged {
                participant_id,
                is_video_off,
                ..
            } => {
                if participant_id == local_id {
                    return Ok(());
                }
                let mut inner = self.inner.lock().await;
                match inner.registry.get_mut(participant_id) {
                    Some(conn) => {
                        conn.is_video_off = is_video_off;
                        drop(inner);
                        self.emit(SessionEvent::RemoteVideoChanged {
                            participant_id,
                            is_video_off,
                        });
                    }
                    None => tracing::warn!(
                        "video state for unknown participant {}",
                        participant_id
                    ),
                }
            }
            SignalingMessage::ScreenShareStarted { participant_id, .. } => {
                if participant_id != local_id {
                    self.emit(SessionEvent::RemoteScreenShare {
                        participant_id,
                        active: true,
                    });
                }
            }
            SignalingMessage::ScreenShareStopped { participant_id, .. } => {
                if participant_id != local_id {
                    self.emit(SessionEvent::RemoteScreenShare {
                        participant_id,
                        active: false,
                    });
                }
            }
            SignalingMessage::ChatMessage {
                participant_id,
                display_name,
                text,
                ..
            } => {
                self.emit(SessionEvent::Chat {
                    participant_id,
                    display_name,
                    text,
                });
            }
            SignalingMessage::ForceMute {
                target_participant_id,
                ..
            } => {
                if target_participant_id == local_id {
                    self.force_mute_local().await;
                }
            }
            SignalingMessage::ForceRemove {
                target_participant_id,
                ..
            } => {
                if target_participant_id == local_id {
                    self.emit(SessionEvent::Notification(
                        "You have been removed from the meeting by the host".to_string(),
                    ));
                    self.end_session(EndReason::Removed).await;
                }
            }
            SignalingMessage::Error { message } => {
                self.emit(SessionEvent::ErrorNotice(message));
            }
            // Client-bound kinds only; everything else originates here.
            _ => {}
        }
        Ok(())
    }

    /// Creates (or replaces) the connection for one remote participant. When
    /// `initiator` is set an offer goes out immediately; responders wait for
    /// the existing member's offer instead.
    async fn create_connection(&self, info: ParticipantInfo, initiator: bool) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if inner.registry.contains(info.participant_id) {
            tracing::warn!(
                "replacing stale connection for participant {}",
                info.participant_id
            );
            inner.registry.remove(info.participant_id).await;
            self.emit(SessionEvent::ParticipantLeft {
                participant_id: info.participant_id,
            });
        }

        let wiring = PeerWiring {
            room_id: self.config.room_id.clone(),
            local_id: self.config.local.participant_id,
            outbound: self.signaling.clone(),
            pc_events: self.pc_events.clone(),
        };
        let mut conn = ParticipantConnection::create(
            info.participant_id,
            info.display_name.clone(),
            info.role,
            &self.config.ice_servers,
            &inner.media.audio,
            inner.media.sending_video_track(),
            wiring,
        )
        .await?;

        if initiator {
            match conn.initiate().await {
                Ok(sdp) => {
                    if let Err(e) = self
                        .signaling
                        .send(SignalingMessage::Offer {
                            room_id: self.config.room_id.clone(),
                            from_participant_id: self.config.local.participant_id,
                            target_participant_id: info.participant_id,
                            sdp,
                        })
                        .await
                    {
                        tracing::warn!("failed to send offer to {}: {}", info.participant_id, e);
                    }
                }
                Err(e) => {
                    // Non-fatal: the connection stays registered in its prior
                    // state and media for this peer may simply never arrive.
                    tracing::warn!(
                        "failed to create offer for {}: {}",
                        info.participant_id,
                        e
                    );
                }
            }
        }

        spawn_quality_monitor(info.participant_id, conn.peer_connection(), self.events.clone());
        inner.registry.insert(conn)?;
        drop(inner);

        self.emit(SessionEvent::ParticipantJoined {
            participant_id: info.participant_id,
            display_name: info.display_name,
            role: info.role,
        });
        Ok(())
    }

    async fn handle_offer(&self, from: ParticipantId, sdp: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let Some(conn) = inner.registry.get_mut(from) else {
            tracing::warn!("offer from unknown participant {}, dropped", from);
            return Ok(());
        };
        match conn.accept_offer(sdp).await {
            Ok(answer) => {
                drop(inner);
                self.signaling
                    .send(SignalingMessage::Answer {
                        room_id: self.config.room_id.clone(),
                        from_participant_id: self.config.local.participant_id,
                        target_participant_id: from,
                        sdp: answer,
                    })
                    .await?;
            }
            Err(e) => tracing::warn!("failed to apply offer from {}: {}", from, e),
        }
        Ok(())
    }

    async fn handle_answer(&self, from: ParticipantId, sdp: &str) {
        let mut inner = self.inner.lock().await;
        let Some(conn) = inner.registry.get_mut(from) else {
            tracing::warn!("answer from unknown participant {}, dropped", from);
            return;
        };
        if let Err(e) = conn.accept_answer(sdp).await {
            tracing::warn!("failed to apply answer from {}: {}", from, e);
        }
    }

    async fn handle_candidate(&self, from: ParticipantId, candidate: &str) {
        let inner = self.inner.lock().await;
        let Some(conn) = inner.registry.get(from) else {
            // Stale or out-of-order; candidates are not queued.
            tracing::warn!("ICE candidate for unknown participant {}, dropped", from);
            return;
        };
        if let Err(e) = conn.add_remote_candidate(candidate).await {
            tracing::warn!("dropping ICE candidate from {}: {}", from, e);
        }
    }

    async fn handle_pc_event(&self, event: PcEvent) {
        match event {
            PcEvent::StateChanged {
                participant_id,
                state,
            } => {
                let mut inner = self.inner.lock().await;
                // The connection may have been removed while this event was
                // queued.
                let Some(conn) = inner.registry.get_mut(participant_id) else {
                    return;
                };
                let before = conn.negotiation;
                conn.apply_pc_state(state);
                let after = conn.negotiation;
                let display_name = conn.display_name.clone();
                drop(inner);

                if before == after {
                    return;
                }
                self.emit(SessionEvent::PeerStateChanged {
                    participant_id,
                    state: after,
                });
                match after {
                    NegotiationState::Connected => {
                        self.emit(SessionEvent::Notification(format!(
                            "Connected to {}",
                            display_name
                        )));
                    }
                    NegotiationState::Disconnected => {
                        self.emit(SessionEvent::Notification(format!(
                            "Disconnected from {}",
                            display_name
                        )));
                    }
                    NegotiationState::Failed => {
                        // Rendered like a departure; the registry entry stays
                        // until an explicit ParticipantLeft arrives.
                        self.emit(SessionEvent::Notification(format!(
                            "Connection to {} failed",
                            display_name
                        )));
                    }
                    _ => {}
                }
            }
            PcEvent::Track {
                participant_id,
                track,
            } => {
                let mut inner = self.inner.lock().await;
                let Some(conn) = inner.registry.get_mut(participant_id) else {
                    return;
                };
                match track.kind() {
                    RTPCodecType::Audio => conn.remote_audio = Some(Arc::clone(&track)),
                    RTPCodecType::Video => conn.remote_video = Some(Arc::clone(&track)),
                    _ => {}
                }
                drop(inner);
                self.emit(SessionEvent::RemoteTrack {
                    participant_id,
                    track,
                });
            }
        }
    }

    /// Flips local audio. Capture keeps running; the disabled track just
    /// stops producing. Exactly one state broadcast per call.
    pub async fn toggle_audio(&self) -> Result<bool> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let mut inner = self.inner.lock().await;
        let is_muted = !inner.is_audio_muted;
        inner.media.audio.set_enabled(!is_muted);
        inner.is_audio_muted = is_muted;
        drop(inner);

        self.broadcast_audio_state(is_muted).await;
        self.emit(SessionEvent::LocalAudioChanged { is_muted });
        Ok(is_muted)
    }

    pub async fn toggle_video(&self) -> Result<bool> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let mut inner = self.inner.lock().await;
        let is_video_off = !inner.is_video_off;
        inner.media.video.set_enabled(!is_video_off);
        inner.is_video_off = is_video_off;
        drop(inner);

        if let Err(e) = self
            .signaling
            .send(SignalingMessage::VideoStateChanged {
                room_id: self.config.room_id.clone(),
                participant_id: self.config.local.participant_id,
                is_video_off,
            })
            .await
        {
            tracing::warn!("failed to broadcast video state: {}", e);
        }
        self.emit(SessionEvent::LocalVideoChanged { is_video_off });
        Ok(is_video_off)
    }

    /// Acquires display capture and swaps it into every outgoing video
    /// sender. A denied capture leaves all state untouched. When the capture
    /// ends outside the app the share reverts automatically.
    pub async fn start_screen_share(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let mut inner = self.inner.lock().await;
        if inner.is_screen_sharing {
            return Ok(());
        }

        let display = match self.devices.open_display_media().await {
            Ok(display) => display,
            Err(e) => {
                self.emit(SessionEvent::Notification(
                    "Could not start screen sharing".to_string(),
                ));
                return Err(Error::ScreenShare(e.to_string()));
            }
        };

        let (screen_track, display_ended) = (display.track, display.ended);
        let failed = Self::replace_video_everywhere(&inner.registry, &screen_track).await;
        inner.media.screen = Some(screen_track);
        inner.is_screen_sharing = true;
        drop(inner);

        if !failed.is_empty() {
            self.emit(SessionEvent::Notification(format!(
                "Screen share could not reach {} participant(s)",
                failed.len()
            )));
        }
        if let Err(e) = self
            .signaling
            .send(SignalingMessage::ScreenShareStarted {
                room_id: self.config.room_id.clone(),
                participant_id: self.config.local.participant_id,
            })
            .await
        {
            tracing::warn!("failed to broadcast screen share start: {}", e);
        }
        self.emit(SessionEvent::ScreenShareChanged { active: true });

        // Revert when the user stops sharing via the native control.
        if let Some(session) = self.weak_self.upgrade() {
            let ended = display_ended;
            tokio::spawn(async move {
                if ended.await.is_ok() && !session.is_closed() && session.is_screen_sharing().await
                {
                    if let Err(e) = session.stop_screen_share().await {
                        tracing::warn!("auto-stopping screen share: {}", e);
                    }
                }
            });
        }
        Ok(())
    }

    /// Re-acquires the camera and restores it on every outgoing sender.
    pub async fn stop_screen_share(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let mut inner = self.inner.lock().await;
        if !inner.is_screen_sharing {
            return Ok(());
        }

        let camera = self.devices.open_video_track(&self.config.constraints).await?;
        camera.set_enabled(!inner.is_video_off);

        let failed = Self::replace_video_everywhere(&inner.registry, &camera).await;
        if let Some(screen) = inner.media.screen.take() {
            screen.stop();
        }
        inner.media.video = camera;
        inner.is_screen_sharing = false;
        drop(inner);

        if !failed.is_empty() {
            self.emit(SessionEvent::Notification(format!(
                "Camera could not be restored for {} participant(s)",
                failed.len()
            )));
        }
        if let Err(e) = self
            .signaling
            .send(SignalingMessage::ScreenShareStopped {
                room_id: self.config.room_id.clone(),
                participant_id: self.config.local.participant_id,
            })
            .await
        {
            tracing::warn!("failed to broadcast screen share stop: {}", e);
        }
        self.emit(SessionEvent::ScreenShareChanged { active: false });
        Ok(())
    }

    /// Replaces the outgoing video track on every connection, continuing past
    /// individual failures and reporting which peers failed.
    async fn replace_video_everywhere(
        registry: &PeerRegistry,
        track: &LocalTrack,
    ) -> Vec<ParticipantId> {
        let mut failed = Vec::new();
        for conn in registry.iter() {
            if let Err(e) = conn.replace_video_track(track).await {
                tracing::warn!(
                    "failed to replace video track for {}: {}",
                    conn.participant_id,
                    e
                );
                failed.push(conn.participant_id);
            }
        }
        failed
    }

    pub async fn send_chat(&self, text: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.signaling
            .send(SignalingMessage::ChatMessage {
                room_id: self.config.room_id.clone(),
                participant_id: self.config.local.participant_id,
                display_name: self.config.local.display_name.clone(),
                text: text.to_string(),
            })
            .await
    }

    /// Asks the server to mute another participant. Authorization happens
    /// server-side.
    pub async fn request_mute(&self, target: ParticipantId) -> Result<()> {
        self.signaling
            .send(SignalingMessage::MuteRequest {
                room_id: self.config.room_id.clone(),
                target_participant_id: target,
            })
            .await
    }

    pub async fn request_remove(&self, target: ParticipantId) -> Result<()> {
        self.signaling
            .send(SignalingMessage::RemoveRequest {
                room_id: self.config.room_id.clone(),
                target_participant_id: target,
            })
            .await
    }

    /// Applies a host-issued mute: same local effect and the same state
    /// broadcast as a user-initiated toggle, no separate wire message.
    async fn force_mute_local(&self) {
        let mut inner = self.inner.lock().await;
        if inner.is_audio_muted {
            return;
        }
        inner.media.audio.set_enabled(false);
        inner.is_audio_muted = true;
        drop(inner);

        self.broadcast_audio_state(true).await;
        self.emit(SessionEvent::LocalAudioChanged { is_muted: true });
        self.emit(SessionEvent::ForcedMute);
        self.emit(SessionEvent::Notification(
            "You have been muted by the host".to_string(),
        ));
    }

    async fn broadcast_audio_state(&self, is_muted: bool) {
        if let Err(e) = self
            .signaling
            .send(SignalingMessage::AudioStateChanged {
                room_id: self.config.room_id.clone(),
                participant_id: self.config.local.participant_id,
                is_muted,
            })
            .await
        {
            tracing::warn!("failed to broadcast audio state: {}", e);
        }
    }

    pub async fn leave(&self) {
        self.end_session(EndReason::Left).await;
    }

    async fn end_session(&self, reason: EndReason) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut inner = self.inner.lock().await;
        inner.registry.close_all().await;
        inner.media.stop_all();
        inner.is_screen_sharing = false;
        drop(inner);

        if let Err(e) = self
            .signaling
            .send(SignalingMessage::LeaveRoom {
                room_id: self.config.room_id.clone(),
            })
            .await
        {
            tracing::debug!("leave-room not delivered: {}", e);
        }

        self.monitor.update(ConnectionState::Disconnected);
        self.emit(SessionEvent::ConnectionStateChanged(
            ConnectionState::Disconnected,
        ));
        self.emit(SessionEvent::Ended { reason });
        self.shutdown.notify_one();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.monitor.current()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.monitor.subscribe()
    }

    pub fn room_id(&self) -> &str {
        &self.config.room_id
    }

    pub fn local_participant(&self) -> &ParticipantInfo {
        &self.config.local
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn participants(&self) -> Vec<ParticipantSummary> {
        self.inner.lock().await.registry.summaries()
    }

    pub async fn participant_count(&self) -> usize {
        self.inner.lock().await.registry.len()
    }

    pub async fn is_audio_muted(&self) -> bool {
        self.inner.lock().await.is_audio_muted
    }

    pub async fn is_video_off(&self) -> bool {
        self.inner.lock().await.is_video_off
    }

    pub async fn is_screen_sharing(&self) -> bool {
        self.inner.lock().await.is_screen_sharing
    }

    pub async fn local_audio_track(&self) -> LocalTrack {
        self.inner.lock().await.media.audio.clone()
    }

    pub async fn local_video_track(&self) -> LocalTrack {
        self.inner.lock().await.media.video.clone()
    }

    /// Id of the video track currently flowing to the given participant
    /// ("camera" or "screen").
    pub async fn outgoing_video_track(&self, participant_id: ParticipantId) -> Option<String> {
        let inner = self.inner.lock().await;
        let conn = inner.registry.get(participant_id)?;
        conn.outgoing_video_track_id().await
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine; the UI may not have subscribed yet.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_cover_stun_and_constraints() {
        let config = MeetingConfig::new(
            "room-1",
            ParticipantInfo {
                participant_id: 1,
                display_name: "Ada".to_string(),
                role: crate::signaling::ParticipantRole::Member,
            },
        );
        assert_eq!(config.ice_servers.len(), 1);
        assert_eq!(config.ice_servers[0].urls.len(), 3);
        assert_eq!(config.constraints.width, 1280);
    }
}

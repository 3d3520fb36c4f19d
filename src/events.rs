use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

use crate::connection::ConnectionState;
use crate::metrics::ConnectionQuality;
use crate::peer::NegotiationState;
use crate::signaling::{ParticipantId, ParticipantRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The local user left, or the session owner tore the session down.
    Left,
    /// A privileged participant removed the local user.
    Removed,
}

/// Everything the rendering layer needs to observe. Remote media arrives as
/// raw tracks; rendering and playback stay outside the session.
#[derive(Clone)]
pub enum SessionEvent {
    ConnectionStateChanged(ConnectionState),
    ParticipantJoined {
        participant_id: ParticipantId,
        display_name: String,
        role: ParticipantRole,
    },
    ParticipantLeft {
        participant_id: ParticipantId,
    },
    RemoteTrack {
        participant_id: ParticipantId,
        track: Arc<TrackRemote>,
    },
    RemoteAudioChanged {
        participant_id: ParticipantId,
        is_muted: bool,
    },
    RemoteVideoChanged {
        participant_id: ParticipantId,
        is_video_off: bool,
    },
    RemoteScreenShare {
        participant_id: ParticipantId,
        active: bool,
    },
    /// A peer's media path changed state; `Failed` is rendered like a
    /// departure even though the registry entry survives.
    PeerStateChanged {
        participant_id: ParticipantId,
        state: NegotiationState,
    },
    LocalAudioChanged {
        is_muted: bool,
    },
    LocalVideoChanged {
        is_video_off: bool,
    },
    ScreenShareChanged {
        active: bool,
    },
    Chat {
        participant_id: ParticipantId,
        display_name: String,
        text: String,
    },
    Quality {
        participant_id: ParticipantId,
        quality: ConnectionQuality,
    },
    /// Transient, user-visible text (joins, leaves, recoverable trouble).
    Notification(String),
    ErrorNotice(String),
    ForcedMute,
    Ended {
        reason: EndReason,
    },
}

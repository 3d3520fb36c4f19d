//! Client-side meeting session manager: one mesh of peer-to-peer audio/video
//! connections per room, coordinated over a WebSocket signaling channel.
//!
//! The session owns local capture and every per-participant connection;
//! rendering, playback and chat display stay with the embedding application,
//! which observes the session through [`SessionEvent`]s.

mod audio;
mod connection;
mod error;
mod events;
mod media;
mod metrics;
mod peer;
mod room;
mod session;
mod signaling;

pub use audio::{AudioCapture, AudioPlayback};
pub use connection::{ConnectionMonitor, ConnectionState};
pub use error::{Error, Result};
pub use events::{EndReason, SessionEvent};
pub use media::{
    DefaultDevices, DisplayMedia, LocalTrack, MediaConstraints, MediaDevices, UserMedia,
};
pub use metrics::ConnectionQuality;
pub use peer::NegotiationState;
pub use room::ParticipantSummary;
pub use session::{default_ice_servers, MeetingConfig, MeetingSession};
pub use signaling::{
    ParticipantId, ParticipantInfo, ParticipantRole, SignalingClient, SignalingMessage,
    SignalingSender,
};

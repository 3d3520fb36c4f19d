use std::env;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

use meeting_client::{
    AudioPlayback, DefaultDevices, MeetingConfig, MeetingSession, ParticipantInfo,
    ParticipantRole, SessionEvent, SignalingClient,
};

const DEFAULT_SIGNALING_URL: &str = "ws://127.0.0.1:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let room_id = env::args().nth(1).unwrap_or_else(|| "test-room".to_string());
    let display_name = env::args()
        .nth(2)
        .unwrap_or_else(|| format!("user-{}", rand::random::<u16>()));
    let url = env::var("SIGNALING_URL").unwrap_or_else(|_| DEFAULT_SIGNALING_URL.to_string());

    let local = ParticipantInfo {
        participant_id: rand::random::<u32>() as u64,
        display_name,
        role: ParticipantRole::Member,
    };
    tracing::info!(
        "joining room {} as {} ({})",
        room_id,
        local.display_name,
        local.participant_id
    );

    let channel = SignalingClient::connect(&url).await?;
    let session = MeetingSession::join(
        MeetingConfig::new(room_id, local),
        channel,
        Arc::new(DefaultDevices::new()),
    )
    .await?;

    let mut events = session.subscribe();
    let mut playbacks = Vec::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                session.leave().await;
                break;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::ParticipantJoined { display_name, .. }) => {
                    tracing::info!("{} joined", display_name);
                }
                Ok(SessionEvent::ParticipantLeft { participant_id }) => {
                    tracing::info!("participant {} left", participant_id);
                }
                Ok(SessionEvent::RemoteTrack { participant_id, track }) => {
                    if track.kind() == RTPCodecType::Audio {
                        match AudioPlayback::spawn(track) {
                            Ok(playback) => playbacks.push(playback),
                            Err(e) => tracing::warn!("audio playback unavailable: {}", e),
                        }
                    } else {
                        tracing::info!("video track from participant {}", participant_id);
                    }
                }
                Ok(SessionEvent::ConnectionStateChanged(state)) => {
                    tracing::info!("signaling: {}", state);
                }
                Ok(SessionEvent::Notification(text)) => tracing::info!("{}", text),
                Ok(SessionEvent::ErrorNotice(text)) => tracing::warn!("{}", text),
                Ok(SessionEvent::Chat { display_name, text, .. }) => {
                    tracing::info!("[chat] {}: {}", display_name, text);
                }
                Ok(SessionEvent::Quality { participant_id, quality }) => {
                    tracing::debug!(
                        "participant {}: rtt {:.1} ms, {:.1} kbps",
                        participant_id,
                        quality.round_trip_time,
                        quality.bitrate
                    );
                }
                Ok(SessionEvent::Ended { reason }) => {
                    tracing::info!("meeting ended: {:?}", reason);
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("dropped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

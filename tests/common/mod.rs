#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use meeting_client::{
    DisplayMedia, Error, LocalTrack, MediaConstraints, MediaDevices, MeetingConfig,
    ParticipantId, ParticipantInfo, ParticipantRole, Result, SignalingClient, SignalingMessage,
    UserMedia,
};

pub const WAIT: Duration = Duration::from_secs(10);
pub const SETTLE: Duration = Duration::from_millis(300);

/// Capture stub: real outbound tracks, no hardware.
pub struct StubDevices {
    fail_user_media: bool,
    fail_display: bool,
    display_stop: StdMutex<Option<oneshot::Sender<()>>>,
}

impl StubDevices {
    pub fn new() -> Self {
        Self {
            fail_user_media: false,
            fail_display: false,
            display_stop: StdMutex::new(None),
        }
    }

    pub fn failing_capture() -> Self {
        Self {
            fail_user_media: true,
            ..Self::new()
        }
    }

    pub fn failing_display() -> Self {
        Self {
            fail_display: true,
            ..Self::new()
        }
    }

    /// Simulates the native "stop sharing" control.
    pub fn end_display(&self) {
        if let Some(sender) = self.display_stop.lock().expect("display lock").take() {
            let _ = sender.send(());
        }
    }
}

#[async_trait]
impl MediaDevices for StubDevices {
    async fn open_user_media(&self, _constraints: &MediaConstraints) -> Result<UserMedia> {
        if self.fail_user_media {
            return Err(Error::Capture("permission denied".to_string()));
        }
        Ok(UserMedia {
            audio: LocalTrack::audio(),
            video: LocalTrack::camera(),
            capture: None,
        })
    }

    async fn open_video_track(&self, _constraints: &MediaConstraints) -> Result<LocalTrack> {
        Ok(LocalTrack::camera())
    }

    async fn open_display_media(&self) -> Result<DisplayMedia> {
        if self.fail_display {
            return Err(Error::ScreenShare("permission denied".to_string()));
        }
        let (stop_tx, ended) = oneshot::channel();
        *self.display_stop.lock().expect("display lock") = Some(stop_tx);
        Ok(DisplayMedia {
            track: LocalTrack::screen(),
            ended,
        })
    }
}

/// The far side of an in-process signaling channel.
pub struct TestChannel {
    pub inject: mpsc::Sender<SignalingMessage>,
    pub outbound: mpsc::Receiver<SignalingMessage>,
}

pub fn channel_pair() -> (SignalingClient, TestChannel) {
    let (out_tx, out_rx) = mpsc::channel(256);
    let (in_tx, in_rx) = mpsc::channel(256);
    (
        SignalingClient::from_parts(out_tx, in_rx),
        TestChannel {
            inject: in_tx,
            outbound: out_rx,
        },
    )
}

pub fn info(participant_id: ParticipantId, display_name: &str, role: ParticipantRole) -> ParticipantInfo {
    ParticipantInfo {
        participant_id,
        display_name: display_name.to_string(),
        role,
    }
}

/// Config with ICE servers cleared so tests never reach external STUN.
pub fn config(room_id: &str, participant_id: ParticipantId, display_name: &str) -> MeetingConfig {
    let mut config = MeetingConfig::new(
        room_id,
        info(participant_id, display_name, ParticipantRole::Member),
    );
    config.ice_servers = Vec::new();
    config
}

/// Drains outbound messages until one matches, skipping unrelated traffic
/// (ICE candidates in particular).
pub async fn recv_until<F>(channel: &mut TestChannel, mut matches: F) -> SignalingMessage
where
    F: FnMut(&SignalingMessage) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            match channel.outbound.recv().await {
                Some(msg) if matches(&msg) => return msg,
                Some(_) => continue,
                None => panic!("outbound channel closed while waiting"),
            }
        }
    })
    .await
    .expect("timed out waiting for outbound message")
}

/// Asserts that nothing matching the predicate shows up within the settle
/// window.
pub async fn assert_no_outbound<F>(channel: &mut TestChannel, mut matches: F)
where
    F: FnMut(&SignalingMessage) -> bool,
{
    let deadline = tokio::time::Instant::now() + SETTLE;
    loop {
        match tokio::time::timeout_at(deadline, channel.outbound.recv()).await {
            Ok(Some(msg)) => {
                assert!(!matches(&msg), "unexpected outbound message: {:?}", msg);
            }
            Ok(None) | Err(_) => return,
        }
    }
}

/// Polls until the condition holds or the wait budget runs out.
macro_rules! wait_for {
    ($cond:expr) => {
        tokio::time::timeout(std::time::Duration::from_secs(10), async {
            loop {
                if $cond {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("timed out waiting for condition")
    };
}
pub(crate) use wait_for;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::oneshot;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

use crate::audio::{AudioCapture, SAMPLE_RATE};
use crate::error::{Error, Result};

const STREAM_ID: &str = "meeting-client";
const VIDEO_CLOCK_RATE: u32 = 90_000;

/// Capture constraints requested from the device layer. Backends treat these
/// as targets, not guarantees.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConstraints {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// An outbound media track owned by the session. Peer connections hold a
/// reference to the underlying RTP track but never own it. The enabled flag
/// gates sample writes, so muting never stops capture.
#[derive(Clone)]
pub struct LocalTrack {
    rtc: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl LocalTrack {
    fn new(capability: RTCRtpCodecCapability, id: &str) -> Self {
        Self {
            rtc: Arc::new(TrackLocalStaticSample::new(
                capability,
                id.to_owned(),
                STREAM_ID.to_owned(),
            )),
            enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn audio() -> Self {
        Self::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: SAMPLE_RATE,
                channels: 1,
                ..Default::default()
            },
            "audio",
        )
    }

    pub fn camera() -> Self {
        Self::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: VIDEO_CLOCK_RATE,
                ..Default::default()
            },
            "camera",
        )
    }

    pub fn screen() -> Self {
        Self::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: VIDEO_CLOCK_RATE,
                ..Default::default()
            },
            "screen",
        )
    }

    pub fn id(&self) -> &str {
        self.rtc.id()
    }

    pub fn rtc_track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        Arc::clone(&self.rtc) as Arc<dyn TrackLocal + Send + Sync>
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Pushes one encoded or raw sample into the track. Writes on a disabled
    /// track are silently skipped; writes on a stopped track are a no-op so
    /// capture threads racing a teardown never error out.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<()> {
        if self.is_stopped() || !self.is_enabled() {
            return Ok(());
        }
        self.rtc
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await
            .map_err(Error::from)
    }
}

/// Local capture handles produced by [`MediaDevices::open_user_media`].
pub struct UserMedia {
    pub audio: LocalTrack,
    pub video: LocalTrack,
    pub capture: Option<AudioCapture>,
}

/// A display-capture track plus the signal that fires when the user ends the
/// share outside the application (the native browser/OS control).
pub struct DisplayMedia {
    pub track: LocalTrack,
    pub ended: oneshot::Receiver<()>,
}

/// Factory for local capture. The session owns one of these so tests and
/// embedders can swap the hardware layer out.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open_user_media(&self, constraints: &MediaConstraints) -> Result<UserMedia>;

    /// Re-acquires a camera track, used when a screen share ends.
    async fn open_video_track(&self, constraints: &MediaConstraints) -> Result<LocalTrack>;

    async fn open_display_media(&self) -> Result<DisplayMedia>;
}

/// Hardware-backed devices: microphone capture runs on a dedicated cpal
/// thread; camera and screen frames are fed by the embedding application
/// through the returned [`LocalTrack`] handles.
pub struct DefaultDevices {
    display_stop: StdMutex<Option<oneshot::Sender<()>>>,
}

impl DefaultDevices {
    pub fn new() -> Self {
        Self {
            display_stop: StdMutex::new(None),
        }
    }

    /// Ends the current display capture, as the native "stop sharing" control
    /// would.
    pub fn end_display_capture(&self) {
        let sender = match self.display_stop.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }
}

impl Default for DefaultDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for DefaultDevices {
    async fn open_user_media(&self, constraints: &MediaConstraints) -> Result<UserMedia> {
        let audio = LocalTrack::audio();
        let video = LocalTrack::camera();
        let capture = AudioCapture::spawn(audio.clone(), constraints)?;
        Ok(UserMedia {
            audio,
            video,
            capture: Some(capture),
        })
    }

    async fn open_video_track(&self, _constraints: &MediaConstraints) -> Result<LocalTrack> {
        Ok(LocalTrack::camera())
    }

    async fn open_display_media(&self) -> Result<DisplayMedia> {
        let (stop_tx, ended) = oneshot::channel();
        match self.display_stop.lock() {
            Ok(mut guard) => *guard = Some(stop_tx),
            Err(_) => return Err(Error::ScreenShare("display handle poisoned".to_string())),
        }
        Ok(DisplayMedia {
            track: LocalTrack::screen(),
            ended,
        })
    }
}

/// The session's owned capture state. Only the media control surface mutates
/// it; peer connections reference the tracks read-only.
pub(crate) struct LocalMedia {
    pub(crate) audio: LocalTrack,
    pub(crate) video: LocalTrack,
    pub(crate) screen: Option<LocalTrack>,
    capture: Option<AudioCapture>,
}

impl LocalMedia {
    pub(crate) fn new(user: UserMedia) -> Self {
        Self {
            audio: user.audio,
            video: user.video,
            screen: None,
            capture: user.capture,
        }
    }

    /// The video track currently attached to outgoing senders.
    pub(crate) fn sending_video_track(&self) -> &LocalTrack {
        self.screen.as_ref().unwrap_or(&self.video)
    }

    pub(crate) fn stop_all(&mut self) {
        self.audio.stop();
        self.video.stop();
        if let Some(screen) = self.screen.take() {
            screen.stop();
        }
        // Dropping the handle stops the capture thread.
        self.capture = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_enabled_flag_gates_without_stopping() {
        let track = LocalTrack::audio();
        assert!(track.is_enabled());
        track.set_enabled(false);
        assert!(!track.is_enabled());
        assert!(!track.is_stopped());
        track.set_enabled(true);
        assert!(track.is_enabled());
    }

    #[tokio::test]
    async fn writes_after_stop_are_noops() {
        let track = LocalTrack::camera();
        track.stop();
        track
            .write_sample(Bytes::from_static(&[0u8; 4]), Duration::from_millis(33))
            .await
            .expect("stopped write is a no-op");
    }

    #[test]
    fn screen_track_takes_over_outgoing_video() {
        let mut media = LocalMedia::new(UserMedia {
            audio: LocalTrack::audio(),
            video: LocalTrack::camera(),
            capture: None,
        });
        assert_eq!(media.sending_video_track().id(), "camera");
        media.screen = Some(LocalTrack::screen());
        assert_eq!(media.sending_video_track().id(), "screen");
        media.screen = None;
        assert_eq!(media.sending_video_track().id(), "camera");
    }

    #[test]
    fn default_constraints_match_capture_policy() {
        let c = MediaConstraints::default();
        assert_eq!((c.width, c.height, c.frame_rate), (1280, 720, 30));
        assert!(c.echo_cancellation && c.noise_suppression && c.auto_gain_control);
    }
}

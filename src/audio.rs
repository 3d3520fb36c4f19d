use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use webrtc::track::track_remote::TrackRemote;

use crate::error::{Error, Result};
use crate::media::{LocalTrack, MediaConstraints};

pub(crate) const SAMPLE_RATE: u32 = 48_000;

const THREAD_POLL: Duration = Duration::from_millis(50);
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Microphone capture feeding a [`LocalTrack`]. The cpal stream lives on its
/// own thread because streams are not `Send`; dropping the handle stops it.
/// Capture keeps running while the track is disabled, the disabled track just
/// discards the samples.
pub struct AudioCapture {
    stop: Arc<AtomicBool>,
}

impl AudioCapture {
    pub fn spawn(track: LocalTrack, constraints: &MediaConstraints) -> Result<Self> {
        tracing::debug!(
            echo_cancellation = constraints.echo_cancellation,
            noise_suppression = constraints.noise_suppression,
            auto_gain_control = constraints.auto_gain_control,
            "opening microphone capture"
        );

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<std::result::Result<(), String>>();

        std::thread::spawn(move || {
            if let Err(e) = Self::run(track, thread_stop, &ready_tx) {
                let _ = ready_tx.send(Err(e.to_string()));
            }
        });

        match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(())) => Ok(Self { stop }),
            Ok(Err(e)) => Err(Error::Capture(e)),
            Err(_) => Err(Error::Capture("audio device did not start".to_string())),
        }
    }

    fn run(
        track: LocalTrack,
        stop: Arc<AtomicBool>,
        ready: &std::sync::mpsc::Sender<std::result::Result<(), String>>,
    ) -> anyhow::Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no input device available"))?;
        let supported = device
            .default_input_config()
            .context("querying input config")?;
        tracing::debug!(config = ?supported, "input config");

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_input_stream::<f32>(&device, &config, track)?,
            SampleFormat::I16 => Self::build_input_stream::<i16>(&device, &config, track)?,
            SampleFormat::U16 => Self::build_input_stream::<u16>(&device, &config, track)?,
            other => return Err(anyhow!("unsupported sample format: {:?}", other)),
        };
        stream.play().context("starting input stream")?;
        let _ = ready.send(Ok(()));

        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(THREAD_POLL);
        }
        drop(stream);
        Ok(())
    }

    fn build_input_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        track: LocalTrack,
    ) -> anyhow::Result<cpal::Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = config.channels as usize;
        let sample_rate = config.sample_rate.0;
        let err_fn = |err| tracing::warn!("input audio stream error: {}", err);

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !track.is_enabled() || track.is_stopped() {
                    return;
                }
                let mono = mix_to_mono(
                    data.iter().map(|s| f32::from_sample(*s)),
                    channels,
                );
                let duration = Duration::from_secs_f64(mono.len() as f64 / sample_rate as f64);
                let payload = pcm_to_payload(&mono);
                if let Err(e) =
                    futures::executor::block_on(track.write_sample(payload.into(), duration))
                {
                    tracing::warn!("failed to write audio sample: {}", e);
                }
            },
            err_fn,
            None,
        )?;

        Ok(stream)
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Speaker playback for one remote audio track.
pub struct AudioPlayback {
    stop: Arc<AtomicBool>,
}

impl AudioPlayback {
    pub fn spawn(track: Arc<TrackRemote>) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let (sample_tx, sample_rx) = mpsc::channel::<Vec<f32>>(1024);

        // Pull RTP off the track; the stream task ends when the track does.
        let reader_stop = Arc::clone(&stop);
        tokio::spawn(async move {
            while let Ok((rtp, _)) = track.read_rtp().await {
                if reader_stop.load(Ordering::SeqCst) {
                    break;
                }
                if rtp.payload.is_empty() {
                    continue;
                }
                let samples = pcm_from_payload(&rtp.payload);
                if sample_tx.send(samples).await.is_err() {
                    break;
                }
            }
        });

        let thread_stop = Arc::clone(&stop);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<std::result::Result<(), String>>();
        std::thread::spawn(move || {
            if let Err(e) = Self::run(sample_rx, thread_stop, &ready_tx) {
                let _ = ready_tx.send(Err(e.to_string()));
            }
        });

        match ready_rx.recv_timeout(STARTUP_TIMEOUT) {
            Ok(Ok(())) => Ok(Self { stop }),
            Ok(Err(e)) => Err(Error::Capture(e)),
            Err(_) => Err(Error::Capture("audio output did not start".to_string())),
        }
    }

    fn run(
        sample_rx: mpsc::Receiver<Vec<f32>>,
        stop: Arc<AtomicBool>,
        ready: &std::sync::mpsc::Sender<std::result::Result<(), String>>,
    ) -> anyhow::Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no output device available"))?;
        let supported = device
            .default_output_config()
            .context("querying output config")?;
        tracing::debug!(config = ?supported, "output config");

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_output_stream::<f32>(&device, &config, sample_rx)?,
            SampleFormat::I16 => Self::build_output_stream::<i16>(&device, &config, sample_rx)?,
            SampleFormat::U16 => Self::build_output_stream::<u16>(&device, &config, sample_rx)?,
            other => return Err(anyhow!("unsupported sample format: {:?}", other)),
        };
        stream.play().context("starting output stream")?;
        let _ = ready.send(Ok(()));

        while !stop.load(Ordering::SeqCst) {
            std::thread::sleep(THREAD_POLL);
        }
        drop(stream);
        Ok(())
    }

    fn build_output_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut sample_rx: mpsc::Receiver<Vec<f32>>,
    ) -> anyhow::Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        let err_fn = |err| tracing::warn!("output audio stream error: {}", err);
        let mut pending: VecDeque<f32> = VecDeque::new();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    if pending.is_empty() {
                        while let Ok(samples) = sample_rx.try_recv() {
                            pending.extend(samples);
                            if pending.len() >= frame.len() {
                                break;
                            }
                        }
                    }
                    // Mono source: duplicate across output channels, silence
                    // on underrun.
                    let value = pending.pop_front().unwrap_or(0.0);
                    for slot in frame.iter_mut() {
                        *slot = T::from_sample(value);
                    }
                }
            },
            err_fn,
            None,
        )?;

        Ok(stream)
    }
}

impl Drop for AudioPlayback {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn mix_to_mono(samples: impl Iterator<Item = f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.collect();
    }
    let mut mono = Vec::new();
    let mut acc = 0.0f32;
    let mut n = 0usize;
    for s in samples {
        acc += s;
        n += 1;
        if n == channels {
            mono.push(acc / channels as f32);
            acc = 0.0;
            n = 0;
        }
    }
    mono
}

fn pcm_to_payload(samples: &[f32]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        payload.extend_from_slice(&s.to_le_bytes());
    }
    payload
}

fn pcm_from_payload(payload: &[u8]) -> Vec<f32> {
    payload
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0];
        let payload = pcm_to_payload(&samples);
        assert_eq!(payload.len(), 16);
        assert_eq!(pcm_from_payload(&payload), samples);
    }

    #[test]
    fn stereo_mixes_down_to_mono() {
        let interleaved = vec![1.0f32, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = mix_to_mono(interleaved.into_iter(), 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mono_passes_through() {
        let samples = vec![0.1f32, 0.2, 0.3];
        assert_eq!(mix_to_mono(samples.clone().into_iter(), 1), samples);
    }
}

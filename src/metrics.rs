use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::interval;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::RTCPeerConnection;

use crate::events::SessionEvent;
use crate::signaling::ParticipantId;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionQuality {
    /// Current round-trip time in milliseconds, 0.0 when not yet measured.
    pub round_trip_time: f64,
    /// Outbound bitrate in kbps over the last sample window.
    pub bitrate: f64,
    pub quality_score: u8,
}

impl Default for ConnectionQuality {
    fn default() -> Self {
        Self {
            round_trip_time: 0.0,
            bitrate: 0.0,
            quality_score: 100,
        }
    }
}

impl ConnectionQuality {
    fn score_from_rtt(round_trip_time: f64) -> u8 {
        if round_trip_time <= 0.0 {
            100
        } else if round_trip_time < 150.0 {
            100
        } else if round_trip_time < 300.0 {
            75
        } else if round_trip_time < 500.0 {
            50
        } else {
            25
        }
    }
}

/// Samples WebRTC stats for one connection until it closes, publishing a
/// quality event per sample. Stats are read through their JSON form so the
/// sampler degrades to defaults when a field is absent.
pub(crate) fn spawn_quality_monitor(
    participant_id: ParticipantId,
    pc: Arc<RTCPeerConnection>,
    events: broadcast::Sender<SessionEvent>,
) {
    tokio::spawn(async move {
        let mut ticker = interval(SAMPLE_INTERVAL);
        let mut last_bytes: Option<(u64, Instant)> = None;

        loop {
            ticker.tick().await;
            if pc.connection_state() == RTCPeerConnectionState::Closed {
                break;
            }

            let report = pc.get_stats().await;
            let value = match serde_json::to_value(&report) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!("stats not serializable: {}", e);
                    continue;
                }
            };

            let round_trip_time = max_f64_for_key(&value, "currentRoundTripTime")
                .map(|seconds| seconds * 1000.0)
                .unwrap_or(0.0);
            let bytes_sent = sum_u64_for_key(&value, "bytesSent");

            let now = Instant::now();
            let bitrate = match last_bytes {
                Some((prev, at)) if bytes_sent >= prev => {
                    let elapsed = now.duration_since(at).as_secs_f64();
                    if elapsed > 0.0 {
                        ((bytes_sent - prev) as f64 * 8.0 / elapsed) / 1000.0
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            };
            last_bytes = Some((bytes_sent, now));

            let quality = ConnectionQuality {
                round_trip_time,
                bitrate,
                quality_score: ConnectionQuality::score_from_rtt(round_trip_time),
            };
            let _ = events.send(SessionEvent::Quality {
                participant_id,
                quality,
            });
        }
    });
}

fn max_f64_for_key(value: &serde_json::Value, key: &str) -> Option<f64> {
    let mut best: Option<f64> = None;
    visit_key(value, key, &mut |v| {
        if let Some(n) = v.as_f64() {
            best = Some(best.map_or(n, |b| b.max(n)));
        }
    });
    best
}

fn sum_u64_for_key(value: &serde_json::Value, key: &str) -> u64 {
    let mut total = 0u64;
    visit_key(value, key, &mut |v| {
        if let Some(n) = v.as_u64() {
            total = total.saturating_add(n);
        }
    });
    total
}

fn visit_key(value: &serde_json::Value, key: &str, f: &mut impl FnMut(&serde_json::Value)) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    f(v);
                }
                visit_key(v, key, f);
            }
        }
        serde_json::Value::Array(items) => {
            for v in items {
                visit_key(v, key, f);
            }
        }
        _ => {}
    }
}

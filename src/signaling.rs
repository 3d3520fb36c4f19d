use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{Error, Result};

pub type ParticipantId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Member,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub role: ParticipantRole,
}

/// Wire vocabulary shared with the signaling server. Offers, answers and ICE
/// candidates are always addressed to one participant; candidates are never
/// broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum SignalingMessage {
    JoinRoom {
        room_id: String,
    },
    LeaveRoom {
        room_id: String,
    },
    RoomJoined {
        room_id: String,
        participants: Vec<ParticipantInfo>,
    },
    ParticipantJoined {
        room_id: String,
        participant_id: ParticipantId,
        display_name: String,
        role: ParticipantRole,
    },
    ParticipantLeft {
        room_id: String,
        participant_id: ParticipantId,
        display_name: String,
    },
    Offer {
        room_id: String,
        from_participant_id: ParticipantId,
        target_participant_id: ParticipantId,
        sdp: String,
    },
    Answer {
        room_id: String,
        from_participant_id: ParticipantId,
        target_participant_id: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        room_id: String,
        from_participant_id: ParticipantId,
        target_participant_id: ParticipantId,
        candidate: String,
    },
    AudioStateChanged {
        room_id: String,
        participant_id: ParticipantId,
        is_muted: bool,
    },
    VideoStateChanged {
        room_id: String,
        participant_id: ParticipantId,
        is_video_off: bool,
    },
    ScreenShareStarted {
        room_id: String,
        participant_id: ParticipantId,
    },
    ScreenShareStopped {
        room_id: String,
        participant_id: ParticipantId,
    },
    ChatMessage {
        room_id: String,
        participant_id: ParticipantId,
        display_name: String,
        text: String,
    },
    MuteRequest {
        room_id: String,
        target_participant_id: ParticipantId,
    },
    RemoveRequest {
        room_id: String,
        target_participant_id: ParticipantId,
    },
    ForceMute {
        room_id: String,
        target_participant_id: ParticipantId,
    },
    ForceRemove {
        room_id: String,
        target_participant_id: ParticipantId,
    },
    Error {
        message: String,
    },
}

/// Outbound half of a signaling channel. Cheap to clone; sends fail once the
/// channel is gone.
#[derive(Clone)]
pub struct SignalingSender {
    tx: mpsc::Sender<SignalingMessage>,
}

impl SignalingSender {
    pub async fn send(&self, msg: SignalingMessage) -> Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| Error::Signaling("signaling channel closed".to_string()))
    }
}

pub struct SignalingClient {
    tx: mpsc::Sender<SignalingMessage>,
    rx: mpsc::Receiver<SignalingMessage>,
}

impl SignalingClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (in_tx, in_rx) = mpsc::channel(100);
        let (out_tx, mut out_rx) = mpsc::channel::<SignalingMessage>(100);

        // Handle outgoing messages
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if write.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("failed to encode signaling message: {}", e),
                }
            }
            let _ = write.close().await;
        });

        // Handle incoming messages; a malformed frame is logged and skipped,
        // a transport error ends the stream.
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!("signaling socket error: {}", e);
                        break;
                    }
                };
                if let Message::Text(text) = frame {
                    match serde_json::from_str::<SignalingMessage>(&text) {
                        Ok(msg) => {
                            if in_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("malformed signaling message: {}", e),
                    }
                }
            }
        });

        Ok(Self {
            tx: out_tx,
            rx: in_rx,
        })
    }

    /// Builds a client over an in-process message pair instead of a WebSocket.
    pub fn from_parts(
        tx: mpsc::Sender<SignalingMessage>,
        rx: mpsc::Receiver<SignalingMessage>,
    ) -> Self {
        Self { tx, rx }
    }

    pub fn split(self) -> (SignalingSender, mpsc::Receiver<SignalingMessage>) {
        (SignalingSender { tx: self.tx }, self.rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_round_trip_as_tagged_json() {
        let msg = SignalingMessage::IceCandidate {
            room_id: "room-1".to_string(),
            from_participant_id: 4,
            target_participant_id: 9,
            candidate: "{\"candidate\":\"candidate:1 1 UDP ...\"}".to_string(),
        };
        let json = serde_json::to_string(&msg).expect("encode");
        assert!(json.contains("\"message_type\":\"IceCandidate\""));

        match serde_json::from_str(&json).expect("decode") {
            SignalingMessage::IceCandidate {
                from_participant_id,
                target_participant_id,
                ..
            } => {
                assert_eq!(from_participant_id, 4);
                assert_eq!(target_participant_id, 9);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn roles_use_snake_case() {
        let info = ParticipantInfo {
            participant_id: 1,
            display_name: "Ada".to_string(),
            role: ParticipantRole::Admin,
        };
        let json = serde_json::to_string(&info).expect("encode");
        assert!(json.contains("\"role\":\"admin\""));
    }

    #[tokio::test]
    async fn from_parts_wires_both_directions() {
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let (in_tx, in_rx) = mpsc::channel(8);
        let client = SignalingClient::from_parts(out_tx, in_rx);
        let (sender, mut receiver) = client.split();

        sender
            .send(SignalingMessage::JoinRoom {
                room_id: "room-7".to_string(),
            })
            .await
            .expect("send");
        match out_rx.recv().await {
            Some(SignalingMessage::JoinRoom { room_id }) => assert_eq!(room_id, "room-7"),
            other => panic!("unexpected message: {:?}", other),
        }

        in_tx
            .send(SignalingMessage::Error {
                message: "boom".to_string(),
            })
            .await
            .expect("inject");
        assert!(matches!(
            receiver.recv().await,
            Some(SignalingMessage::Error { .. })
        ));
    }
}

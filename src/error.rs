use std::fmt;
use tokio_tungstenite::tungstenite::Error as WsError;
use webrtc::Error as WebRTCError;

use crate::signaling::ParticipantId;

#[derive(Debug)]
pub enum Error {
    /// Camera/microphone acquisition failed; fatal to session bootstrap.
    Capture(String),
    /// Signaling channel unusable (closed, or a send was refused).
    Signaling(String),
    WebRTC(WebRTCError),
    Ws(WsError),
    Json(serde_json::Error),
    /// A live connection for this participant already exists.
    DuplicateConnection(ParticipantId),
    /// Display-capture acquisition failed or was cancelled; non-fatal.
    ScreenShare(String),
    /// Operation attempted after the session ended.
    SessionClosed,
    Other(anyhow::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Capture(e) => write!(f, "media capture error: {}", e),
            Error::Signaling(e) => write!(f, "signaling error: {}", e),
            Error::WebRTC(e) => write!(f, "WebRTC error: {}", e),
            Error::Ws(e) => write!(f, "WebSocket error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::DuplicateConnection(id) => {
                write!(f, "connection for participant {} already exists", id)
            }
            Error::ScreenShare(e) => write!(f, "screen share error: {}", e),
            Error::SessionClosed => write!(f, "meeting session is closed"),
            Error::Other(e) => write!(f, "error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<WebRTCError> for Error {
    fn from(err: WebRTCError) -> Self {
        Error::WebRTC(err)
    }
}

impl From<WsError> for Error {
    fn from(err: WsError) -> Self {
        Error::Ws(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

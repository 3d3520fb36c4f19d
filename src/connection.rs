use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Signaling-channel connectivity. Peer media paths are tracked per
/// participant, not here; once established they survive a channel loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

#[derive(Clone)]
pub struct ConnectionMonitor {
    state: Arc<watch::Sender<ConnectionState>>,
    receiver: watch::Receiver<ConnectionState>,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        let (state, receiver) = watch::channel(ConnectionState::Disconnected);
        Self {
            state: Arc::new(state),
            receiver,
        }
    }

    pub fn update(&self, state: ConnectionState) {
        self.state.send_modify(|current| {
            *current = state;
        });
    }

    pub fn current(&self) -> ConnectionState {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.receiver.clone()
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

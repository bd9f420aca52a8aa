use std::fmt;

/// Connection state for a realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket and no pending reconnect
    #[default]
    Disconnected,
    /// Initial handshake in progress
    Connecting,
    /// Socket open and initialization payload sent
    Connected,
    /// Connection lost, waiting for the next retry
    Reconnecting,
    /// Connection failed or reconnect attempts were exhausted
    Error(String),
}

impl ConnectionState {
    /// Whether the channel is connected, connecting, or recovering.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Reconnecting
        )
    }

    /// Whether outbound messages are accepted (sent or buffered for replay).
    #[inline]
    pub fn accepts_messages(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Reconnecting
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
            ConnectionState::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

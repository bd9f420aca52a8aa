//! Error types for realtime channel operations

use std::time::Duration;

use super::reconnect::{CloseDisposition, classify_handshake_status};

/// Error types for realtime channel operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Connection rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Connection timeout after {0:?}")]
    Timeout(Duration),
    #[error("Not connected: {0}")]
    NotConnected(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Connection closed by remote ({code}): {reason}")]
    Closed { code: u16, reason: String },
    #[error("Reconnect attempts exhausted after {0} tries")]
    ReconnectExhausted(u32),
}

impl ChannelError {
    /// Whether retrying the connection cannot help.
    pub fn is_terminal(&self) -> bool {
        match self {
            ChannelError::Rejected { status, .. } => {
                classify_handshake_status(*status) == CloseDisposition::Terminal
            }
            ChannelError::ConfigurationError(_) | ChannelError::Serialization(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        ChannelError::Serialization(err.to_string())
    }
}

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_auth_is_terminal() {
        let err = ChannelError::Rejected {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert!(err.is_terminal());
    }

    #[test]
    fn test_rejected_server_error_is_transient() {
        let err = ChannelError::Rejected {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(!err.is_terminal());
    }

    #[test]
    fn test_network_error_is_transient() {
        assert!(!ChannelError::NetworkError("reset".to_string()).is_terminal());
        assert!(!ChannelError::ConnectionFailed("refused".to_string()).is_terminal());
    }
}

//! Vendor protocol seam for the realtime channel.
//!
//! A [`ChannelProtocol`] is the vendor configuration expressed as data plus
//! the two pure translation steps the channel needs: application intent to
//! wire envelope, and wire frame to application events. The connection
//! manager, reconnect loop, outbox and dispatcher are shared by every vendor.

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use super::errors::{ChannelError, ChannelResult};
use super::messages::{InboundEvent, OutboundMessage};

/// Translation layer between application messages and a vendor wire format.
pub trait ChannelProtocol: Send + Sync + 'static {
    /// Vendor name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Build the WebSocket handshake request (URL and authentication headers).
    fn build_request(&self) -> ChannelResult<Request>;

    /// JSON frames sent right after every successful open, before any replay.
    fn init_messages(&self) -> ChannelResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Serialize an outgoing intent.
    ///
    /// Returns `Ok(None)` when this vendor has no envelope for the intent;
    /// the channel logs and skips it.
    fn encode(&self, message: &OutboundMessage) -> ChannelResult<Option<String>>;

    /// Parse one incoming text frame.
    ///
    /// Unknown message types yield an empty vector. Malformed JSON yields an
    /// error, which the channel logs before dropping the frame.
    fn decode(&self, frame: &str) -> ChannelResult<Vec<InboundEvent>>;

    /// Reset per-connection decoder state. Called before each (re)open.
    fn reset(&self) {}
}

/// Build a handshake request for `url` with optional extra headers.
pub fn websocket_request(url: &str, headers: &[(&'static str, &str)]) -> ChannelResult<Request> {
    let mut request = url
        .into_client_request()
        .map_err(|e| ChannelError::ConfigurationError(format!("Invalid WebSocket URL: {e}")))?;

    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|e| {
            ChannelError::ConfigurationError(format!("Invalid value for header {name}: {e}"))
        })?;
        request.headers_mut().insert(*name, value);
    }

    Ok(request)
}

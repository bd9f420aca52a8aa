//! Vendor-agnostic realtime WebSocket channel.
//!
//! One [`RealtimeChannel`] implementation drives every vendor. Vendor
//! differences live entirely in a [`ChannelProtocol`]: the handshake request,
//! the initialization payload, and the encode/decode of wire frames.

mod callbacks;
mod client;
mod errors;
mod messages;
mod outbox;
mod protocol;
mod reconnect;
mod state;


pub use callbacks::{ChannelCallback, ChannelHandlers, into_callback};
pub use client::{ChannelConfig, RealtimeChannel};
pub use errors::{ChannelError, ChannelResult};
pub use messages::{
    AgentCorrection, AudioEvent, ControlAction, InboundEvent, OutboundMessage, PingEvent,
};
pub use protocol::{ChannelProtocol, websocket_request};
pub use reconnect::{
    BackoffStrategy, CloseDisposition, ReconnectPolicy, classify_close_code,
    classify_handshake_status,
};
pub use state::ConnectionState;

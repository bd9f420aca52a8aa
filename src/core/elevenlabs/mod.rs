//! ElevenLabs Conversational AI.
//!
//! The agent socket carries user audio and text upstream and the agent's
//! transcripts, replies and synthesized audio downstream.
//!
//! # Example
//!
//! ```rust,ignore
//! use parley::core::channel::{ChannelConfig, RealtimeChannel};
//! use parley::core::elevenlabs::{ConversationConfig, ElevenLabsProtocol};
//!
//! let config = ConversationConfig::new("agent_id").with_api_key("key");
//! let channel = RealtimeChannel::new(ElevenLabsProtocol::new(config), ChannelConfig::default());
//! channel.on_agent_response(|text| async move { println!("{text}") });
//! channel.connect().await?;
//! channel.send_text("Hello").await?;
//! ```

mod config;
mod messages;
mod protocol;
mod signed_url;


pub use config::{ConversationConfig, ConversationOverrides, DEFAULT_API_BASE_URL};
pub use messages::ConversationMessage;
pub use protocol::ElevenLabsProtocol;
pub use signed_url::{SignedUrlError, fetch_signed_url};

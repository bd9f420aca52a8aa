//! Gemini Live as a realtime emotion channel.
//!
//! Candidate audio and video frames are streamed to a Gemini Live session
//! configured for text output. The model answers each turn with a JSON list
//! of detected emotions, which is decoded into [`InboundEvent::Emotion`].
//!
//! [`InboundEvent::Emotion`]: crate::core::channel::InboundEvent::Emotion

mod config;
mod emotion_parse;
mod messages;
mod protocol;

#[cfg(test)]
mod tests;

pub use config::{
    AUDIO_MIME_TYPE, DEFAULT_EMOTION_INSTRUCTION, DEFAULT_GEMINI_MODEL, GEMINI_LIVE_URL,
    GeminiEmotionConfig, VIDEO_FRAME_MIME_TYPE,
};
pub use emotion_parse::parse_emotion_text;
pub use protocol::GeminiEmotionProtocol;

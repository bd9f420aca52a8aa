//! Application-level messages exchanged over a realtime channel.
//!
//! - **Outgoing intents** ([`OutboundMessage`]): what the application wants to
//!   send. Each vendor protocol turns these into its own JSON envelope.
//! - **Incoming events** ([`InboundEvent`]): what a vendor protocol extracted
//!   from a received frame, routed to the registered callbacks.

use bytes::Bytes;

use crate::core::emotion::EmotionSample;

// =============================================================================
// Outgoing Messages
// =============================================================================

/// Control actions that carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Tell the agent the user is active (prevents it from taking the turn)
    UserActivity,
    /// Microphone closed, flush any buffered input
    EndOfAudio,
    /// The user finished their turn
    TurnComplete,
}

impl ControlAction {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserActivity => "user_activity",
            Self::EndOfAudio => "end_of_audio",
            Self::TurnComplete => "turn_complete",
        }
    }
}

/// An outgoing application intent.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Raw PCM audio captured from the user
    AudioChunk(Bytes),
    /// A typed user message
    UserText(String),
    /// Background context for the agent that does not trigger a response
    ContextualUpdate(String),
    Control(ControlAction),
    /// Non-audio media such as a video frame
    Media { mime_type: String, data: Bytes },
    /// Keep-alive reply to a vendor ping event
    Pong { event_id: u64 },
}

impl OutboundMessage {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AudioChunk(_) => "audio_chunk",
            Self::UserText(_) => "user_text",
            Self::ContextualUpdate(_) => "contextual_update",
            Self::Control(action) => action.as_str(),
            Self::Media { .. } => "media",
            Self::Pong { .. } => "pong",
        }
    }

    /// Whether the message may be buffered and replayed after a reconnect.
    ///
    /// Pongs answer a specific ping on a specific connection and are never replayed.
    #[inline]
    pub fn is_replayable(&self) -> bool {
        !matches!(self, Self::Pong { .. })
    }
}

// =============================================================================
// Incoming Events
// =============================================================================

/// Received agent audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEvent {
    /// Decoded audio bytes
    pub data: Bytes,
    /// Vendor event id, used to match interruptions
    pub event_id: Option<u64>,
}

/// Keep-alive ping from the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingEvent {
    pub event_id: u64,
    /// Round-trip latency reported by the server
    pub ping_ms: Option<u64>,
}

/// Agent correction of an earlier response after an interruption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCorrection {
    pub original: String,
    pub corrected: String,
}

/// An incoming event decoded from a vendor frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Vendor acknowledged the session
    SessionStarted {
        session_id: Option<String>,
        audio_format: Option<String>,
    },
    /// Final transcript of the user's speech
    UserTranscript(String),
    /// Text of the agent's reply
    AgentResponse(String),
    AgentResponseCorrection(AgentCorrection),
    Audio(AudioEvent),
    Ping(PingEvent),
    /// Voice activity probability for the latest user audio
    VadScore(f32),
    /// User interrupted the agent; queued agent audio is stale
    Interruption { event_id: Option<u64> },
    TurnComplete,
    /// Emotion inference results
    Emotion(Vec<EmotionSample>),
    /// Error reported in-band by the vendor
    ServerError { message: String },
}

impl InboundEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::UserTranscript(_) => "user_transcript",
            Self::AgentResponse(_) => "agent_response",
            Self::AgentResponseCorrection(_) => "agent_response_correction",
            Self::Audio(_) => "audio",
            Self::Ping(_) => "ping",
            Self::VadScore(_) => "vad_score",
            Self::Interruption { .. } => "interruption",
            Self::TurnComplete => "turn_complete",
            Self::Emotion(_) => "emotion",
            Self::ServerError { .. } => "server_error",
        }
    }
}

//! WebSocket message types for the ElevenLabs Conversational AI API.
//!
//! - **Outgoing messages**: initiation data, user audio, user text,
//!   contextual updates, activity pings and pongs.
//! - **Incoming messages**: tagged by a `type` field, each carrying its
//!   payload in a `<type>_event` object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Outgoing Messages (Client to Server)
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PromptOverride<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Default, Serialize)]
pub struct AgentOverride<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptOverride<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct TtsOverride<'a> {
    pub voice_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ConversationSettingsOverride {
    pub text_only: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct ConfigOverride<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentOverride<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsOverride<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationSettingsOverride>,
}

/// First frame sent after the socket opens.
#[derive(Debug, Serialize)]
pub struct ConversationInitiation<'a> {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_config_override: Option<ConfigOverride<'a>>,
    #[serde(skip_serializing_if = "no_variables")]
    pub dynamic_variables: &'a BTreeMap<String, String>,
}

fn no_variables(variables: &&BTreeMap<String, String>) -> bool {
    variables.is_empty()
}

/// User microphone audio. This is the only envelope without a `type` field.
#[derive(Debug, Serialize)]
pub struct UserAudioChunk {
    /// Base64-encoded PCM16
    pub user_audio_chunk: String,
}

/// Envelope carrying a `type` and a `text` field.
#[derive(Debug, Serialize)]
pub struct TypedText<'a> {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub text: &'a str,
}

/// Envelope carrying only a `type` field.
#[derive(Debug, Serialize)]
pub struct TypedOnly {
    #[serde(rename = "type")]
    pub message_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Pong {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub event_id: u64,
}

impl Pong {
    #[inline]
    pub fn new(event_id: u64) -> Self {
        Self {
            message_type: "pong",
            event_id,
        }
    }
}

// =============================================================================
// Incoming Messages (Server to Client)
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct InitiationMetadataEvent {
    pub conversation_id: String,
    #[serde(default)]
    pub agent_output_audio_format: Option<String>,
    #[serde(default)]
    pub user_input_audio_format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InitiationMetadata {
    pub conversation_initiation_metadata_event: InitiationMetadataEvent,
}

#[derive(Debug, Deserialize)]
pub struct UserTranscriptionEvent {
    pub user_transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct UserTranscript {
    pub user_transcription_event: UserTranscriptionEvent,
}

#[derive(Debug, Deserialize)]
pub struct AgentResponseEvent {
    pub agent_response: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentResponse {
    pub agent_response_event: AgentResponseEvent,
}

#[derive(Debug, Deserialize)]
pub struct AgentResponseCorrectionEvent {
    pub original_agent_response: String,
    pub corrected_agent_response: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentResponseCorrection {
    pub agent_response_correction_event: AgentResponseCorrectionEvent,
}

#[derive(Debug, Deserialize)]
pub struct AudioPayload {
    pub audio_base_64: String,
    #[serde(default)]
    pub event_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Audio {
    pub audio_event: AudioPayload,
}

#[derive(Debug, Deserialize)]
pub struct PingPayload {
    pub event_id: u64,
    #[serde(default)]
    pub ping_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Ping {
    pub ping_event: PingPayload,
}

#[derive(Debug, Deserialize)]
pub struct VadScorePayload {
    pub vad_score: f32,
}

#[derive(Debug, Deserialize)]
pub struct VadScore {
    pub vad_score_event: VadScorePayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct InterruptionPayload {
    #[serde(default)]
    pub event_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Interruption {
    #[serde(default)]
    pub interruption_event: InterruptionPayload,
}

#[derive(Debug, Deserialize)]
pub struct TentativeResponsePayload {
    pub tentative_agent_response: String,
}

#[derive(Debug, Deserialize)]
pub struct TentativeResponse {
    pub tentative_agent_response_internal_event: TentativeResponsePayload,
}

#[derive(Debug, Deserialize)]
pub struct ClientToolCallPayload {
    pub tool_name: String,
    pub tool_call_id: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ClientToolCall {
    pub client_tool_call: ClientToolCallPayload,
}

/// In-band error. ElevenLabs has used both a flat `message` and a nested event.
#[derive(Debug, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_event: Option<ServerErrorEvent>,
}

#[derive(Debug, Deserialize)]
pub struct ServerErrorEvent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

impl ServerError {
    pub fn text(&self) -> String {
        let nested = self.error_event.as_ref();
        self.message
            .clone()
            .or_else(|| nested.and_then(|e| e.message.clone()))
            .or_else(|| nested.and_then(|e| e.error_type.clone()))
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// All incoming message types.
///
/// Use [`ConversationMessage::parse`] to deserialize a text frame.
#[derive(Debug)]
pub enum ConversationMessage {
    InitiationMetadata(InitiationMetadata),
    UserTranscript(UserTranscript),
    AgentResponse(AgentResponse),
    AgentResponseCorrection(AgentResponseCorrection),
    Audio(Audio),
    Ping(Ping),
    VadScore(VadScore),
    Interruption(Interruption),
    TentativeResponse(TentativeResponse),
    ClientToolCall(ClientToolCall),
    Error(ServerError),
    /// Unknown message type (for forward compatibility)
    Unknown(String),
}

impl ConversationMessage {
    /// Parse a WebSocket text frame into the matching message type.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct TypePeek {
            #[serde(rename = "type")]
            message_type: String,
        }

        let peek: TypePeek = serde_json::from_str(text)?;

        let message = match peek.message_type.as_str() {
            "conversation_initiation_metadata" => Self::InitiationMetadata(serde_json::from_str(text)?),
            "user_transcript" => Self::UserTranscript(serde_json::from_str(text)?),
            "agent_response" => Self::AgentResponse(serde_json::from_str(text)?),
            "agent_response_correction" => {
                Self::AgentResponseCorrection(serde_json::from_str(text)?)
            }
            "audio" => Self::Audio(serde_json::from_str(text)?),
            "ping" => Self::Ping(serde_json::from_str(text)?),
            "vad_score" => Self::VadScore(serde_json::from_str(text)?),
            "interruption" => Self::Interruption(serde_json::from_str(text)?),
            "internal_tentative_agent_response" => {
                Self::TentativeResponse(serde_json::from_str(text)?)
            }
            "client_tool_call" => Self::ClientToolCall(serde_json::from_str(text)?),
            "error" => Self::Error(serde_json::from_str(text)?),
            other => Self::Unknown(other.to_string()),
        };

        Ok(message)
    }
}

//! ElevenLabs Conversational AI implementation of [`ChannelProtocol`].

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use bytes::Bytes;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tracing::{debug, warn};

use super::config::ConversationConfig;
use super::messages::{
    AgentOverride, ConfigOverride, ConversationInitiation, ConversationMessage,
    ConversationSettingsOverride, Pong, PromptOverride, TtsOverride, TypedOnly, TypedText,
    UserAudioChunk,
};
use crate::core::channel::{
    AgentCorrection, AudioEvent, ChannelProtocol, ChannelResult, ControlAction, InboundEvent,
    OutboundMessage, PingEvent, websocket_request,
};

/// Envelope builder and dispatcher for the ElevenLabs agent socket.
#[derive(Debug, Clone)]
pub struct ElevenLabsProtocol {
    config: ConversationConfig,
}

impl ElevenLabsProtocol {
    pub fn new(config: ConversationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Build the `conversation_initiation_client_data` payload.
    pub fn initiation_payload(&self) -> ChannelResult<String> {
        let overrides = &self.config.overrides;

        let agent = (overrides.prompt.is_some()
            || overrides.first_message.is_some()
            || overrides.language.is_some())
        .then(|| AgentOverride {
            prompt: overrides
                .prompt
                .as_deref()
                .map(|prompt| PromptOverride { prompt }),
            first_message: overrides.first_message.as_deref(),
            language: overrides.language.as_deref(),
        });

        let tts = overrides
            .voice_id
            .as_deref()
            .map(|voice_id| TtsOverride { voice_id });

        let conversation = self
            .config
            .text_only
            .then_some(ConversationSettingsOverride { text_only: true });

        let config_override = ConfigOverride {
            agent,
            tts,
            conversation,
        };
        let has_override = config_override.agent.is_some()
            || config_override.tts.is_some()
            || config_override.conversation.is_some();

        let payload = ConversationInitiation {
            message_type: "conversation_initiation_client_data",
            conversation_config_override: has_override.then_some(config_override),
            dynamic_variables: &self.config.dynamic_variables,
        };

        Ok(serde_json::to_string(&payload)?)
    }
}

impl ChannelProtocol for ElevenLabsProtocol {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    fn build_request(&self) -> ChannelResult<Request> {
        let url = self.config.websocket_url();
        match (&self.config.signed_url, &self.config.api_key) {
            (None, Some(key)) => websocket_request(&url, &[("xi-api-key", key.as_str())]),
            _ => websocket_request(&url, &[]),
        }
    }

    fn init_messages(&self) -> ChannelResult<Vec<String>> {
        Ok(vec![self.initiation_payload()?])
    }

    fn encode(&self, message: &OutboundMessage) -> ChannelResult<Option<String>> {
        let json = match message {
            OutboundMessage::AudioChunk(audio) => serde_json::to_string(&UserAudioChunk {
                user_audio_chunk: BASE64_STANDARD.encode(audio),
            })?,
            OutboundMessage::UserText(text) => serde_json::to_string(&TypedText {
                message_type: "user_message",
                text,
            })?,
            OutboundMessage::ContextualUpdate(text) => serde_json::to_string(&TypedText {
                message_type: "contextual_update",
                text,
            })?,
            OutboundMessage::Control(ControlAction::UserActivity) => {
                serde_json::to_string(&TypedOnly {
                    message_type: "user_activity",
                })?
            }
            OutboundMessage::Pong { event_id } => serde_json::to_string(&Pong::new(*event_id))?,
            OutboundMessage::Control(ControlAction::EndOfAudio | ControlAction::TurnComplete)
            | OutboundMessage::Media { .. } => return Ok(None),
        };
        Ok(Some(json))
    }

    fn decode(&self, frame: &str) -> ChannelResult<Vec<InboundEvent>> {
        let event = match ConversationMessage::parse(frame)? {
            ConversationMessage::InitiationMetadata(meta) => {
                let event = meta.conversation_initiation_metadata_event;
                InboundEvent::SessionStarted {
                    session_id: Some(event.conversation_id),
                    audio_format: event.agent_output_audio_format,
                }
            }
            ConversationMessage::UserTranscript(msg) => {
                InboundEvent::UserTranscript(msg.user_transcription_event.user_transcript)
            }
            ConversationMessage::AgentResponse(msg) => {
                InboundEvent::AgentResponse(msg.agent_response_event.agent_response)
            }
            ConversationMessage::AgentResponseCorrection(msg) => {
                let event = msg.agent_response_correction_event;
                InboundEvent::AgentResponseCorrection(AgentCorrection {
                    original: event.original_agent_response,
                    corrected: event.corrected_agent_response,
                })
            }
            ConversationMessage::Audio(msg) => {
                let audio = msg.audio_event;
                match BASE64_STANDARD.decode(audio.audio_base_64.as_bytes()) {
                    Ok(data) => InboundEvent::Audio(AudioEvent {
                        data: Bytes::from(data),
                        event_id: audio.event_id,
                    }),
                    Err(e) => {
                        warn!("Dropping ElevenLabs audio with invalid base64: {}", e);
                        return Ok(Vec::new());
                    }
                }
            }
            ConversationMessage::Ping(msg) => InboundEvent::Ping(PingEvent {
                event_id: msg.ping_event.event_id,
                ping_ms: msg.ping_event.ping_ms,
            }),
            ConversationMessage::VadScore(msg) => InboundEvent::VadScore(msg.vad_score_event.vad_score),
            ConversationMessage::Interruption(msg) => InboundEvent::Interruption {
                event_id: msg.interruption_event.event_id,
            },
            ConversationMessage::TentativeResponse(msg) => {
                debug!(
                    "Tentative agent response: {}",
                    msg.tentative_agent_response_internal_event.tentative_agent_response
                );
                return Ok(Vec::new());
            }
            ConversationMessage::ClientToolCall(msg) => {
                let call = msg.client_tool_call;
                warn!(
                    "Agent requested client tool '{}' ({}), no client tools are registered",
                    call.tool_name, call.tool_call_id
                );
                return Ok(Vec::new());
            }
            ConversationMessage::Error(err) => InboundEvent::ServerError { message: err.text() },
            ConversationMessage::Unknown(kind) => {
                debug!("Ignoring ElevenLabs message type: {}", kind);
                return Ok(Vec::new());
            }
        };

        Ok(vec![event])
    }
}

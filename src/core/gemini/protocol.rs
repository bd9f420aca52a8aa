//! Gemini Live implementation of [`ChannelProtocol`] for emotion inference.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use parking_lot::Mutex;
use serde_json::Value;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tracing::{debug, warn};

use super::config::GeminiEmotionConfig;
use super::emotion_parse::parse_emotion_text;
use super::messages::{
    AudioStreamEnd, AudioStreamEndMessage, ClientContentMessage, Content, GenerationConfig,
    MediaChunk, RealtimeInput, RealtimeInputMessage, SetupMessage, SetupPayload, TextPart,
};
use crate::core::channel::{
    ChannelError, ChannelProtocol, ChannelResult, ControlAction, InboundEvent, OutboundMessage,
    websocket_request,
};
use crate::core::emotion::now_ms;

/// Gemini Live session that streams candidate audio/video and receives
/// emotion assessments as text.
///
/// Model text arrives in fragments across several frames; it is buffered
/// until the turn completes and then parsed as a whole.
#[derive(Debug)]
pub struct GeminiEmotionProtocol {
    config: GeminiEmotionConfig,
    pending_text: Mutex<String>,
}

impl GeminiEmotionProtocol {
    pub fn new(config: GeminiEmotionConfig) -> Self {
        Self {
            config,
            pending_text: Mutex::new(String::new()),
        }
    }

    pub fn config(&self) -> &GeminiEmotionConfig {
        &self.config
    }

    pub fn setup_payload(&self) -> ChannelResult<String> {
        let instruction = self.config.system_instruction.trim();
        let message = SetupMessage {
            setup: SetupPayload {
                model: self.config.model_resource(),
                generation_config: GenerationConfig {
                    response_modalities: vec!["TEXT"],
                },
                system_instruction: (!instruction.is_empty()).then(|| Content {
                    role: None,
                    parts: vec![TextPart { text: instruction }],
                }),
            },
        };
        Ok(serde_json::to_string(&message)?)
    }

    fn media_chunk(mime_type: &str, data: &[u8]) -> ChannelResult<String> {
        let message = RealtimeInputMessage {
            realtime_input: RealtimeInput {
                media_chunks: vec![MediaChunk {
                    mime_type: mime_type.to_string(),
                    data: BASE64_STANDARD.encode(data),
                }],
            },
        };
        Ok(serde_json::to_string(&message)?)
    }

    /// Turn the buffered model text into events once the turn completes.
    fn finish_turn(&self, events: &mut Vec<InboundEvent>) {
        let text = std::mem::take(&mut *self.pending_text.lock());
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        match parse_emotion_text(text, now_ms()) {
            Some(samples) => {
                debug!("Gemini reported {} emotion samples", samples.len());
                events.push(InboundEvent::Emotion(samples));
            }
            None => {
                debug!("Gemini turn was not emotion JSON, forwarding as text");
                events.push(InboundEvent::AgentResponse(text.to_string()));
            }
        }
    }
}

impl ChannelProtocol for GeminiEmotionProtocol {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn build_request(&self) -> ChannelResult<Request> {
        if self.config.api_key.is_empty() {
            return Err(ChannelError::ConfigurationError(
                "Gemini API key is required".to_string(),
            ));
        }
        websocket_request(&self.config.websocket_url(), &[])
    }

    fn init_messages(&self) -> ChannelResult<Vec<String>> {
        Ok(vec![self.setup_payload()?])
    }

    fn encode(&self, message: &OutboundMessage) -> ChannelResult<Option<String>> {
        let json = match message {
            OutboundMessage::AudioChunk(audio) => {
                Self::media_chunk(&self.config.audio_mime_type, audio)?
            }
            OutboundMessage::Media { mime_type, data } => Self::media_chunk(mime_type, data)?,
            OutboundMessage::UserText(text) | OutboundMessage::ContextualUpdate(text) => {
                serde_json::to_string(&ClientContentMessage::user_text(text))?
            }
            OutboundMessage::Control(ControlAction::EndOfAudio) => {
                serde_json::to_string(&AudioStreamEndMessage {
                    realtime_input: AudioStreamEnd {
                        audio_stream_end: true,
                    },
                })?
            }
            OutboundMessage::Control(ControlAction::TurnComplete) => {
                serde_json::to_string(&ClientContentMessage::turn_complete())?
            }
            OutboundMessage::Control(ControlAction::UserActivity)
            | OutboundMessage::Pong { .. } => return Ok(None),
        };
        Ok(Some(json))
    }

    fn decode(&self, frame: &str) -> ChannelResult<Vec<InboundEvent>> {
        let value: Value = serde_json::from_str(frame)?;
        let mut events = Vec::new();

        if value.get("setupComplete").is_some() {
            events.push(InboundEvent::SessionStarted {
                session_id: None,
                audio_format: None,
            });
        }

        if let Some(content) = value.get("serverContent") {
            if let Some(parts) = content.pointer("/modelTurn/parts").and_then(Value::as_array) {
                let mut pending = self.pending_text.lock();
                for text in parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)) {
                    pending.push_str(text);
                }
            }

            if content.get("interrupted").and_then(Value::as_bool) == Some(true) {
                self.pending_text.lock().clear();
                events.push(InboundEvent::Interruption { event_id: None });
            }

            if content.get("turnComplete").and_then(Value::as_bool) == Some(true) {
                self.finish_turn(&mut events);
                events.push(InboundEvent::TurnComplete);
            }
        }

        if let Some(go_away) = value.get("goAway") {
            warn!("Gemini session ending soon: {}", go_away);
        }

        if let Some(err) = value.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown server error")
                .to_string();
            events.push(InboundEvent::ServerError { message });
        }

        Ok(events)
    }

    fn reset(&self) {
        self.pending_text.lock().clear();
    }
}

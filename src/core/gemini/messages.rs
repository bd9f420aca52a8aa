//! Outgoing Gemini Live messages.
//!
//! Wire format reference:
//! - Setup: `{"setup": {"model", "generationConfig", "systemInstruction"}}`
//! - Media: `{"realtimeInput": {"mediaChunks": [{"mimeType", "data"}]}}`
//! - Text: `{"clientContent": {"turns": [...], "turnComplete": true}}`

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SetupMessage<'a> {
    pub setup: SetupPayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPayload<'a> {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TextPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RealtimeInputMessage {
    #[serde(rename = "realtimeInput")]
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Serialize)]
pub struct RealtimeInput {
    #[serde(rename = "mediaChunks")]
    pub media_chunks: Vec<MediaChunk>,
}

#[derive(Debug, Serialize)]
pub struct MediaChunk {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64-encoded payload
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct AudioStreamEndMessage {
    #[serde(rename = "realtimeInput")]
    pub realtime_input: AudioStreamEnd,
}

#[derive(Debug, Serialize)]
pub struct AudioStreamEnd {
    #[serde(rename = "audioStreamEnd")]
    pub audio_stream_end: bool,
}

#[derive(Debug, Serialize)]
pub struct ClientContentMessage<'a> {
    #[serde(rename = "clientContent")]
    pub client_content: ClientContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub turns: Vec<Content<'a>>,
    pub turn_complete: bool,
}

impl<'a> ClientContentMessage<'a> {
    /// A complete user turn with one text part.
    pub fn user_text(text: &'a str) -> Self {
        Self {
            client_content: ClientContent {
                turns: vec![Content {
                    role: Some("user"),
                    parts: vec![TextPart { text }],
                }],
                turn_complete: true,
            },
        }
    }

    /// Mark the current turn complete without adding content.
    pub fn turn_complete() -> Self {
        Self {
            client_content: ClientContent {
                turns: Vec::new(),
                turn_complete: true,
            },
        }
    }
}

//! Configuration for ElevenLabs Conversational AI sessions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default public API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.elevenlabs.io";

/// Per-session overrides of the agent's stored configuration.
///
/// Only the fields that are set are sent; the agent must allow overrides
/// for each of them in its security settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationOverrides {
    /// System prompt for the agent
    #[serde(default)]
    pub prompt: Option<String>,
    /// First message the agent speaks
    #[serde(default)]
    pub first_message: Option<String>,
    /// ISO language code
    #[serde(default)]
    pub language: Option<String>,
    /// TTS voice to use instead of the agent's default
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl ConversationOverrides {
    pub fn is_empty(&self) -> bool {
        self.prompt.is_none()
            && self.first_message.is_none()
            && self.language.is_none()
            && self.voice_id.is_none()
    }
}

/// Configuration for one ElevenLabs conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationConfig {
    pub agent_id: String,
    /// Pre-authorized URL obtained from the signed URL endpoint.
    ///
    /// When set, no API key is sent over the socket.
    pub signed_url: Option<String>,
    /// API key for private agents when no signed URL is used
    pub api_key: Option<String>,
    /// HTTP base URL; the WebSocket URL is derived from it
    pub api_base_url: String,
    pub overrides: ConversationOverrides,
    /// Run the conversation without audio in either direction
    pub text_only: bool,
    /// Values substituted into `{{variable}}` placeholders in the agent prompt
    pub dynamic_variables: BTreeMap<String, String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            agent_id: String::new(),
            signed_url: None,
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            overrides: ConversationOverrides::default(),
            text_only: false,
            dynamic_variables: BTreeMap::new(),
        }
    }
}

impl ConversationConfig {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Default::default()
        }
    }

    pub fn with_signed_url(mut self, url: impl Into<String>) -> Self {
        self.signed_url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_text_only(mut self, text_only: bool) -> Self {
        self.text_only = text_only;
        self
    }

    pub fn with_dynamic_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dynamic_variables.insert(key.into(), value.into());
        self
    }

    /// WebSocket endpoint derived from `api_base_url`.
    pub fn websocket_url(&self) -> String {
        if let Some(url) = &self.signed_url {
            return url.clone();
        }

        let base = self.api_base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };

        format!(
            "{}/v1/convai/conversation?agent_id={}",
            ws_base,
            url_encode(&self.agent_id)
        )
    }
}

/// Percent-encode a query parameter value.
pub(crate) fn url_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_websocket_url() {
        let config = ConversationConfig::new("agent_123");
        assert_eq!(
            config.websocket_url(),
            "wss://api.elevenlabs.io/v1/convai/conversation?agent_id=agent_123"
        );
    }

    #[test]
    fn test_signed_url_wins() {
        let config = ConversationConfig::new("agent_123")
            .with_api_key("key")
            .with_signed_url("wss://api.elevenlabs.io/v1/convai/conversation?conversation_signature=abc");
        assert!(config.websocket_url().contains("conversation_signature=abc"));
    }

    #[test]
    fn test_custom_base_url() {
        let mut config = ConversationConfig::new("a b");
        config.api_base_url = "http://127.0.0.1:9000/".to_string();
        assert_eq!(
            config.websocket_url(),
            "ws://127.0.0.1:9000/v1/convai/conversation?agent_id=a+b"
        );
    }

    #[test]
    fn test_overrides_is_empty() {
        assert!(ConversationOverrides::default().is_empty());
        let overrides = ConversationOverrides {
            language: Some("en".to_string()),
            ..Default::default()
        };
        assert!(!overrides.is_empty());
    }
}

//! Configuration for the Gemini Live emotion channel.

/// Gemini Live WebSocket endpoint
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Default model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// MIME type for 16kHz PCM16 audio
pub const AUDIO_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// MIME type for video frames
pub const VIDEO_FRAME_MIME_TYPE: &str = "image/jpeg";

/// Default system instruction asking for machine-readable emotion output.
pub const DEFAULT_EMOTION_INSTRUCTION: &str = "You observe a candidate during a job interview \
through their voice and camera. After each turn, respond ONLY with a JSON array of the \
emotions you detect, e.g. [{\"emotion\":\"nervous\",\"intensity\":0.6,\"confidence\":0.8}]. \
Use these labels: neutral, happy, confident, engaged, surprised, sad, angry, fearful, \
disgusted, nervous, confused. Intensity and confidence are numbers between 0 and 1. \
Do not add any other text.";

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiEmotionConfig {
    pub api_key: String,
    /// Model name without the `models/` prefix
    pub model: String,
    pub system_instruction: String,
    /// Endpoint override, mainly for tests
    pub url: String,
    pub audio_mime_type: String,
}

impl GeminiEmotionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            system_instruction: DEFAULT_EMOTION_INSTRUCTION.to_string(),
            url: GEMINI_LIVE_URL.to_string(),
            audio_mime_type: AUDIO_MIME_TYPE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Fully-qualified model resource name.
    pub fn model_resource(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    /// WebSocket URL with the API key as a query parameter.
    pub fn websocket_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let key: String = url::form_urlencoded::byte_serialize(self.api_key.as_bytes()).collect();
        format!("{}{}key={}", self.url, separator, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_resource() {
        let config = GeminiEmotionConfig::new("k");
        assert_eq!(config.model_resource(), "models/gemini-2.0-flash-exp");
        let config = config.with_model("models/custom");
        assert_eq!(config.model_resource(), "models/custom");
    }

    #[test]
    fn test_websocket_url_carries_key() {
        let config = GeminiEmotionConfig::new("abc");
        assert!(config.websocket_url().starts_with(GEMINI_LIVE_URL));
        assert!(config.websocket_url().ends_with("?key=abc"));
    }
}

use std::time::Duration;

use crate::core::channel::ChannelConfig;
use crate::core::elevenlabs::ConversationConfig;
use crate::core::gemini::GeminiEmotionConfig;
use crate::core::interview::InterviewConfig;

/// Configuration for an [`InterviewCoach`](super::InterviewCoach).
#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub interview: InterviewConfig,
    pub conversation: ConversationConfig,
    /// Gemini emotion channel; face-expression input works without it
    pub emotion: Option<GeminiEmotionConfig>,
    /// Transport settings shared by both channels
    pub channel: ChannelConfig,
    /// Microphone sample rate (mono PCM16)
    pub sample_rate: u32,
    /// Duration of each audio chunk sent upstream
    pub chunk_ms: u32,
    pub emotion_window: Duration,
    pub emotion_max_samples: usize,
}

impl CoachConfig {
    pub fn new(interview: InterviewConfig, conversation: ConversationConfig) -> Self {
        Self {
            interview,
            conversation,
            emotion: None,
            channel: ChannelConfig::default(),
            sample_rate: 16000,
            chunk_ms: 100,
            emotion_window: Duration::from_secs(30),
            emotion_max_samples: 120,
        }
    }

    pub fn with_emotion(mut self, emotion: GeminiEmotionConfig) -> Self {
        self.emotion = Some(emotion);
        self
    }

    pub fn with_channel_config(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }
}
